//! Worksheet codec: `<sheetData>` to header-keyed rows and back.
//!
//! Decoding follows the usual "sheet to objects" convention: the first
//! non-blank row is the header row, every later non-blank row becomes a
//! [`Row`] keyed by header text, and missing cells read as empty strings.
//! Blank header cells are keyed `__EMPTY`, repeated headers get `_1`, `_2`
//! suffixes.
//!
//! Encoding only replaces the `<sheetData>` element and the `<dimension>`
//! reference of the original worksheet XML, so sheet views, column widths,
//! page setup and the like survive. Text is written as inline strings and
//! never touches the shared-string table. Both elements are located by local
//! name and rewritten with the prefix the worksheet already uses.

use super::error::WorkbookError;
use super::xml::{attr, attrs, decode_text, encode_text, esc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::ops::Range;

const BLANK_HEADER: &str = "__EMPTY";

/// Columns per worksheet (`A` to `XFD`).
pub const MAX_COLUMNS: u32 = 16_384;
/// Rows per worksheet.
pub const MAX_ROWS: u32 = 1_048_576;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    /// Numeric cell kept in its serialized form so it round-trips exactly.
    Number(String),
    Bool(bool),
}

/// A formula as it appeared in the source, re-emitted verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    attrs: Vec<(String, String)>,
    text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    /// Style index (`s` attribute); keeps date and number formats attached.
    pub style: Option<String>,
    pub formula: Option<Formula>,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: CellValue::Text(value.into()),
            style: None,
            formula: None,
        }
    }

    pub fn empty() -> Self {
        Self::text("")
    }

    pub fn is_blank(&self) -> bool {
        self.formula.is_none() && matches!(&self.value, CellValue::Text(t) if t.is_empty())
    }

    /// The cell rendered as plain text.
    pub fn display(&self) -> String {
        match &self.value {
            CellValue::Text(t) | CellValue::Number(t) => t.clone(),
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
        }
    }
}

/// One data row, keyed by header in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    entries: Vec<(String, Cell)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, cell: Cell) -> Self {
        self.set(key, cell);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, cell: Cell) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = cell,
            None => self.entries.push((key, cell)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Cell> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }

    /// Text of the cell under `key`, or `""` when the row has no such cell.
    pub fn text(&self, key: &str) -> String {
        self.get(key).map(Cell::display).unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Header {
    key: String,
    /// Source header cell; `None` for blank header cells.
    cell: Option<Cell>,
}

/// The tabular content of one worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<Header>,
    rows: Vec<Row>,
    /// 1-based row index of the header row.
    origin_row: u32,
    /// 0-based column index of the first column.
    origin_col: u32,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            rows: Vec::new(),
            origin_row: 1,
            origin_col: 0,
        }
    }
}

impl Table {
    pub fn headers(&self) -> Vec<&str> {
        self.headers.iter().map(|h| h.key.as_str()).collect()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Appends rows after the existing ones. Keys not yet present become new
    /// header columns in the order they are first seen.
    pub fn append_rows(&mut self, rows: impl IntoIterator<Item = Row>) {
        for row in rows {
            for key in row.keys() {
                if !self.headers.iter().any(|h| h.key == key) {
                    self.headers.push(Header {
                        key: key.to_string(),
                        cell: Some(Cell::text(key)),
                    });
                }
            }
            self.rows.push(row);
        }
    }

    /// `A1`-style range covering the header row and every data row.
    pub fn dimension(&self) -> String {
        let first = cell_ref(self.origin_col, self.origin_row);
        if self.headers.is_empty() {
            return first;
        }
        let last_col = self.origin_col.saturating_add(self.headers.len() as u32 - 1);
        let last_row = self.origin_row.saturating_add(self.rows.len() as u32);
        format!("{}:{}", first, cell_ref(last_col, last_row))
    }
}

/// Column index (0-based) to letters: `0 -> A`, `26 -> AA`.
pub fn column_name(mut col: u32) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

pub fn cell_ref(col: u32, row: u32) -> String {
    format!("{}{}", column_name(col), row)
}

/// Parses `B12` into `(col, row)` = `(1, 12)`.
pub fn parse_cell_ref(reference: &str) -> Result<(u32, u32), WorkbookError> {
    let invalid = || WorkbookError::CellRef(reference.to_string());
    let reference = reference.replace('$', "");
    let split = reference
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        col = col.checked_mul(26).and_then(|v| v.checked_add(digit)).ok_or_else(invalid)?;
    }
    let row: u32 = digits.parse().map_err(|_| invalid())?;
    if row == 0 || row > MAX_ROWS || col > MAX_COLUMNS {
        return Err(invalid());
    }
    Ok((col - 1, row))
}

#[derive(Default)]
struct PendingCell {
    col: u32,
    row: u32,
    kind: Option<String>,
    style: Option<String>,
    value: String,
    inline: String,
    formula: Option<Formula>,
}

fn start_cell(
    part: &str,
    e: &BytesStart<'_>,
    row: u32,
    last_col: Option<u32>,
) -> Result<PendingCell, WorkbookError> {
    let (col, row) = match attr(part, e, b"r")? {
        Some(r) => parse_cell_ref(&r)?,
        None => (last_col.map_or(0, |c| c + 1), row),
    };
    Ok(PendingCell {
        col,
        row,
        kind: attr(part, e, b"t")?,
        style: attr(part, e, b"s")?,
        ..PendingCell::default()
    })
}

fn finish_cell(pending: PendingCell, shared: &[String]) -> Result<Cell, WorkbookError> {
    let value = match pending.kind.as_deref() {
        Some("s") => {
            let index: usize = pending
                .value
                .trim()
                .parse()
                .map_err(|_| WorkbookError::CellRef(cell_ref(pending.col, pending.row)))?;
            let text = shared
                .get(index)
                .cloned()
                .ok_or_else(|| WorkbookError::SharedString {
                    index,
                    cell: cell_ref(pending.col, pending.row),
                })?;
            CellValue::Text(text)
        }
        Some("inlineStr") => CellValue::Text(decode_text(&pending.inline).into_owned()),
        Some("b") => CellValue::Bool(pending.value.trim() == "1"),
        Some("str") => CellValue::Text(decode_text(&pending.value).into_owned()),
        Some("e") | Some("d") => CellValue::Text(pending.value),
        _ if pending.value.trim().is_empty() => CellValue::Text(String::new()),
        _ => CellValue::Number(pending.value.trim().to_string()),
    };
    Ok(Cell {
        value,
        style: pending.style,
        formula: pending.formula,
    })
}

type Grid = BTreeMap<u32, BTreeMap<u32, Cell>>;

fn row_number(part: &str, e: &BytesStart<'_>, previous: u32) -> Result<u32, WorkbookError> {
    let (row, source) = match attr(part, e, b"r")? {
        Some(r) => (r.trim().parse::<u32>().ok(), r),
        None => (previous.checked_add(1), format!("row after {}", previous)),
    };
    match row {
        Some(row) if (1..=MAX_ROWS).contains(&row) => Ok(row),
        _ => Err(WorkbookError::CellRef(source)),
    }
}

fn store_cell(grid: &mut Grid, cell: PendingCell, shared: &[String]) -> Result<(), WorkbookError> {
    let (row, col) = (cell.row, cell.col);
    let cell = finish_cell(cell, shared)?;
    if !cell.is_blank() {
        grid.entry(row).or_default().insert(col, cell);
    }
    Ok(())
}

fn read_grid(part: &str, xml: &str, shared: &[String]) -> Result<Grid, WorkbookError> {
    let mut reader = Reader::from_str(xml);
    let mut grid = Grid::new();

    let mut row = 0u32;
    let mut last_col: Option<u32> = None;
    let mut pending: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_inline = false;
    let mut in_formula = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event().map_err(|e| WorkbookError::xml(part, e))? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = row_number(part, &e, row)?;
                    last_col = None;
                }
                b"c" => {
                    let cell = start_cell(part, &e, row, last_col)?;
                    last_col = Some(cell.col);
                    pending = Some(cell);
                }
                b"v" => in_value = true,
                b"f" => {
                    in_formula = true;
                    if let Some(cell) = pending.as_mut() {
                        cell.formula = Some(Formula {
                            attrs: attrs(part, &e)?,
                            text: String::new(),
                        });
                    }
                }
                b"rPh" => phonetic_depth += 1,
                b"t" if phonetic_depth == 0 && pending.is_some() => in_inline = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => row = row_number(part, &e, row)?,
                b"c" => {
                    let cell = start_cell(part, &e, row, last_col)?;
                    last_col = Some(cell.col);
                    store_cell(&mut grid, cell, shared)?;
                }
                b"f" => {
                    if let Some(cell) = pending.as_mut() {
                        cell.formula = Some(Formula {
                            attrs: attrs(part, &e)?,
                            text: String::new(),
                        });
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_value || in_inline || in_formula => {
                let text = t.unescape().map_err(|e| WorkbookError::xml(part, e))?;
                if let Some(cell) = pending.as_mut() {
                    if in_value {
                        cell.value.push_str(&text);
                    } else if in_inline {
                        cell.inline.push_str(&text);
                    } else if let Some(formula) = cell.formula.as_mut() {
                        formula.text.push_str(&text);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"c" => {
                    if let Some(cell) = pending.take() {
                        store_cell(&mut grid, cell, shared)?;
                    }
                }
                b"v" => in_value = false,
                b"f" => in_formula = false,
                b"t" => in_inline = false,
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(grid)
}

/// Decodes a worksheet into a header-keyed [`Table`].
pub fn decode(part: &str, xml: &str, shared: &[String]) -> Result<Table, WorkbookError> {
    let mut grid = read_grid(part, xml, shared)?;

    let Some(header_row) = grid.keys().next().copied() else {
        return Ok(Table::default());
    };
    let min_col = grid
        .values()
        .filter_map(|cells| cells.keys().next())
        .min()
        .copied()
        .unwrap_or(0);
    let max_col = grid
        .values()
        .filter_map(|cells| cells.keys().next_back())
        .max()
        .copied()
        .unwrap_or(0);

    let mut header_cells = grid.remove(&header_row).unwrap_or_default();
    let mut used: BTreeSet<String> = BTreeSet::new();
    let mut suffixes: BTreeMap<String, usize> = BTreeMap::new();
    let mut headers = Vec::new();
    for col in min_col..=max_col {
        let cell = header_cells.remove(&col);
        let base = match &cell {
            Some(c) => c.display(),
            None => BLANK_HEADER.to_string(),
        };
        let key = if used.contains(&base) {
            let next = suffixes.entry(base.clone()).or_insert(1);
            loop {
                let candidate = format!("{}_{}", base, next);
                *next += 1;
                if !used.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            base
        };
        used.insert(key.clone());
        headers.push((col, Header { key, cell }));
    }

    let rows = grid
        .into_values()
        .map(|mut cells| {
            let mut row = Row::new();
            for (col, header) in &headers {
                let cell = cells.remove(col).unwrap_or_else(Cell::empty);
                row.set(header.key.clone(), cell);
            }
            row
        })
        .collect();

    Ok(Table {
        headers: headers.into_iter().map(|(_, h)| h).collect(),
        rows,
        origin_row: header_row,
        origin_col: min_col,
    })
}

fn render_cell(out: &mut String, p: &str, reference: &str, cell: &Cell) {
    if cell.is_blank() {
        return;
    }

    let kind = match (&cell.value, &cell.formula) {
        (CellValue::Text(_), Some(_)) => Some("str"),
        (CellValue::Text(_), None) => Some("inlineStr"),
        (CellValue::Bool(_), _) => Some("b"),
        (CellValue::Number(_), _) => None,
    };

    let _ = write!(out, r#"<{}c r="{}""#, p, reference);
    if let Some(style) = &cell.style {
        let _ = write!(out, r#" s="{}""#, esc(style));
    }
    if let Some(kind) = kind {
        let _ = write!(out, r#" t="{}""#, kind);
    }
    out.push('>');

    if let Some(formula) = &cell.formula {
        let _ = write!(out, "<{}f", p);
        for (key, value) in &formula.attrs {
            let _ = write!(out, r#" {}="{}""#, key, esc(value));
        }
        if formula.text.is_empty() {
            out.push_str("/>");
        } else {
            let _ = write!(out, ">{}</{}f>", esc(&formula.text), p);
        }
    }

    match (&cell.value, &cell.formula) {
        (CellValue::Text(t), None) => {
            let space = if t.trim() != t { r#" xml:space="preserve""# } else { "" };
            let _ = write!(out, "<{p}is><{p}t{}>{}</{p}t></{p}is>", space, encode_text(t));
        }
        (CellValue::Text(t), Some(_)) => {
            let _ = write!(out, "<{p}v>{}</{p}v>", encode_text(t));
        }
        (CellValue::Number(t), _) => {
            let _ = write!(out, "<{p}v>{}</{p}v>", esc(t));
        }
        (CellValue::Bool(b), _) => {
            let _ = write!(out, "<{p}v>{}</{p}v>", if *b { 1 } else { 0 });
        }
    }
    let _ = write!(out, "</{}c>", p);
}

fn render_sheet_data(table: &Table, p: &str) -> String {
    if table.headers.is_empty() {
        return format!("<{}sheetData/>", p);
    }

    let mut out = format!("<{}sheetData>", p);
    let _ = write!(out, r#"<{}row r="{}">"#, p, table.origin_row);
    for (i, header) in table.headers.iter().enumerate() {
        if let Some(cell) = &header.cell {
            let reference = cell_ref(table.origin_col + i as u32, table.origin_row);
            render_cell(&mut out, p, &reference, cell);
        }
    }
    let _ = write!(out, "</{}row>", p);

    for (r, row) in table.rows.iter().enumerate() {
        let row_number = table.origin_row + 1 + r as u32;
        let _ = write!(out, r#"<{}row r="{}">"#, p, row_number);
        for (i, header) in table.headers.iter().enumerate() {
            if let Some(cell) = row.get(&header.key) {
                let reference = cell_ref(table.origin_col + i as u32, row_number);
                render_cell(&mut out, p, &reference, cell);
            }
        }
        let _ = write!(out, "</{}row>", p);
    }
    let _ = write!(out, "</{}sheetData>", p);
    out
}

/// Byte range and namespace prefix (`"x:"` or `""`) of an element.
struct Located {
    span: Range<usize>,
    prefix: String,
}

fn position(part: &str, reader: &Reader<&[u8]>) -> Result<usize, WorkbookError> {
    usize::try_from(reader.buffer_position()).map_err(|e| WorkbookError::xml(part, e))
}

/// Finds the first element with the given local name, including its
/// content and end tag.
fn locate(part: &str, xml: &str, local_name: &[u8]) -> Result<Option<Located>, WorkbookError> {
    let mut reader = Reader::from_str(xml);
    loop {
        let start = position(part, &reader)?;
        let (name, empty) = match reader.read_event().map_err(|e| WorkbookError::xml(part, e))? {
            Event::Start(e) if e.local_name().as_ref() == local_name => {
                (e.name().as_ref().to_vec(), false)
            }
            Event::Empty(e) if e.local_name().as_ref() == local_name => {
                (e.name().as_ref().to_vec(), true)
            }
            Event::Eof => return Ok(None),
            _ => continue,
        };
        if !empty {
            reader
                .read_to_end(QName(&name))
                .map_err(|e| WorkbookError::xml(part, e))?;
        }
        let prefix = match QName(&name).prefix() {
            Some(p) => format!("{}:", String::from_utf8_lossy(p.as_ref())),
            None => String::new(),
        };
        return Ok(Some(Located {
            span: start..position(part, &reader)?,
            prefix,
        }));
    }
}

fn splice(xml: &str, span: &Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(xml.len() + replacement.len());
    out.push_str(&xml[..span.start]);
    out.push_str(replacement);
    out.push_str(&xml[span.end..]);
    out
}

/// Rewrites `xml` so that its cell data is `table`.
pub fn encode_into(part: &str, xml: &str, table: &Table) -> Result<String, WorkbookError> {
    let exceeded = |what, limit| WorkbookError::SheetLimit {
        part: part.to_string(),
        what,
        limit,
    };
    if table.origin_row as usize + table.rows.len() > MAX_ROWS as usize {
        return Err(exceeded("rows", MAX_ROWS));
    }
    if table.origin_col as usize + table.headers.len() > MAX_COLUMNS as usize {
        return Err(exceeded("columns", MAX_COLUMNS));
    }

    let sheet_data = locate(part, xml, b"sheetData")?
        .ok_or_else(|| WorkbookError::xml(part, "worksheet has no <sheetData> element"))?;
    let out = splice(xml, &sheet_data.span, &render_sheet_data(table, &sheet_data.prefix));

    match locate(part, &out, b"dimension")? {
        Some(dimension) => {
            let replacement = format!(
                r#"<{}dimension ref="{}"/>"#,
                dimension.prefix,
                table.dimension()
            );
            Ok(splice(&out, &dimension.span, &replacement))
        }
        None => Ok(out),
    }
}
