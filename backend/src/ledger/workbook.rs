//! Workbook-level navigation: locating the workbook part, its sheets and the
//! shared-string table, and swapping the cell data of one sheet.

use super::error::WorkbookError;
use super::package::Package;
use super::sheet::{self, Table};
use super::xml::{attr, decode_text, parent_dir, rels_part, resolve_target};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;

const ROOT_RELS: &str = "_rels/.rels";
const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

/// Which sheet of the template receives the merged rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetSheet {
    /// The first sheet in workbook order.
    #[default]
    First,
    Named(String),
}

/// The sheet the ledger is merged into unless configured otherwise.
pub const LEDGER_SHEET: TargetSheet = TargetSheet::First;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    /// Package part holding the worksheet XML, e.g. `xl/worksheets/sheet1.xml`.
    pub part: String,
}

#[derive(Debug)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

/// A macro-enabled workbook held in memory.
#[derive(Debug, Clone)]
pub struct Workbook {
    package: Package,
    sheets: Vec<SheetEntry>,
    shared_strings: Vec<String>,
}

impl Workbook {
    pub fn open(path: &Path) -> Result<Self, WorkbookError> {
        Self::from_package(Package::open(path)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WorkbookError> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    fn from_package(package: Package) -> Result<Self, WorkbookError> {
        let workbook_part = office_document(&package)?;
        let base = parent_dir(&workbook_part).to_string();
        let rels = relationships(&package, &rels_part(&workbook_part))?;

        let sheets = sheet_entries(&package, &workbook_part, &rels, &base)?;
        let shared_strings = match rels
            .iter()
            .find(|r| r.rel_type.ends_with("/sharedStrings"))
        {
            Some(rel) => shared_strings(&package, &resolve_target(&base, &rel.target))?,
            None => Vec::new(),
        };

        Ok(Self {
            package,
            sheets,
            shared_strings,
        })
    }

    pub fn sheets(&self) -> &[SheetEntry] {
        &self.sheets
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// The VBA project embedded in the workbook, if any.
    pub fn macro_payload(&self) -> Option<&[u8]> {
        self.package
            .parts()
            .iter()
            .find(|p| p.name.to_ascii_lowercase().ends_with("vbaproject.bin"))
            .map(|p| p.data.as_slice())
            .filter(|data| !data.is_empty())
    }

    pub fn has_macros(&self) -> bool {
        self.macro_payload().is_some()
    }

    pub fn resolve(&self, target: &TargetSheet) -> Result<SheetEntry, WorkbookError> {
        match target {
            TargetSheet::First => self.sheets.first().cloned().ok_or(WorkbookError::NoSheets),
            TargetSheet::Named(name) => self
                .sheets
                .iter()
                .find(|s| &s.name == name)
                .cloned()
                .ok_or_else(|| WorkbookError::SheetNotFound(name.clone())),
        }
    }

    pub fn read_table(&self, sheet: &SheetEntry) -> Result<Table, WorkbookError> {
        let xml = self.package.require_xml(&sheet.part)?;
        sheet::decode(&sheet.part, xml, &self.shared_strings)
    }

    /// Replaces the cell data of `sheet`, leaving every other part untouched.
    pub fn write_table(&mut self, sheet: &SheetEntry, table: &Table) -> Result<(), WorkbookError> {
        let xml = self.package.require_xml(&sheet.part)?;
        let rewritten = sheet::encode_into(&sheet.part, xml, table)?;
        self.package.replace(&sheet.part, rewritten.into_bytes())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, WorkbookError> {
        self.package.to_bytes()
    }
}

fn office_document(package: &Package) -> Result<String, WorkbookError> {
    let rels = relationships(package, ROOT_RELS)?;
    Ok(rels
        .iter()
        .find(|r| r.rel_type.ends_with("/officeDocument"))
        .map(|r| resolve_target("", &r.target))
        .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string()))
}

fn relationships(package: &Package, part: &str) -> Result<Vec<Relationship>, WorkbookError> {
    let Some(xml) = package.xml(part)? else {
        return Ok(Vec::new());
    };

    let mut reader = Reader::from_str(xml);
    let mut rels = Vec::new();
    loop {
        match reader.read_event().map_err(|e| WorkbookError::xml(part, e))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if attr(part, &e, b"TargetMode")?.as_deref() == Some("External") {
                    continue;
                }
                if let (Some(id), Some(rel_type), Some(target)) = (
                    attr(part, &e, b"Id")?,
                    attr(part, &e, b"Type")?,
                    attr(part, &e, b"Target")?,
                ) {
                    rels.push(Relationship {
                        id,
                        rel_type,
                        target,
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(rels)
}

fn sheet_entries(
    package: &Package,
    workbook_part: &str,
    rels: &[Relationship],
    base: &str,
) -> Result<Vec<SheetEntry>, WorkbookError> {
    let xml = package.require_xml(workbook_part)?;
    let mut reader = Reader::from_str(xml);
    let mut sheets = Vec::new();

    loop {
        match reader
            .read_event()
            .map_err(|e| WorkbookError::xml(workbook_part, e))?
        {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let name = attr(workbook_part, &e, b"name")?.unwrap_or_default();
                let rel_id = attr(workbook_part, &e, b"id")?.ok_or_else(|| {
                    WorkbookError::xml(workbook_part, format!("sheet {:?} has no r:id", name))
                })?;
                let rel = rels.iter().find(|r| r.id == rel_id).ok_or_else(|| {
                    WorkbookError::xml(
                        workbook_part,
                        format!("sheet {:?} points at unknown relationship {}", name, rel_id),
                    )
                })?;
                sheets.push(SheetEntry {
                    name,
                    part: resolve_target(base, &rel.target),
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheets)
}

/// Reads `<sst>`; rich-text runs are concatenated and phonetic hints skipped.
fn shared_strings(package: &Package, part: &str) -> Result<Vec<String>, WorkbookError> {
    let Some(xml) = package.xml(part)? else {
        return Ok(Vec::new());
    };

    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event().map_err(|e| WorkbookError::xml(part, e))? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => phonetic_depth += 1,
                b"t" if phonetic_depth == 0 => in_text = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(t) if in_text => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&t.unescape().map_err(|e| WorkbookError::xml(part, e))?);
                }
            }
            Event::CData(t) if in_text => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.extend(current.take().map(|s| decode_text(&s).into_owned())),
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(strings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::fixtures::{LedgerFixture, VBA_PAYLOAD};

    #[test]
    fn sheets_are_listed_in_workbook_order() {
        let wb = Workbook::from_bytes(&LedgerFixture::default().build()).unwrap();
        let names: Vec<&str> = wb.sheets().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ledger", "Notes"]);
        assert_eq!(wb.sheets()[0].part, "xl/worksheets/sheet1.xml");
        assert_eq!(wb.macro_payload(), Some(VBA_PAYLOAD));
    }

    #[test]
    fn first_sheet_is_the_default_target() {
        let wb = Workbook::from_bytes(&LedgerFixture::default().build()).unwrap();
        assert_eq!(wb.resolve(&LEDGER_SHEET).unwrap().name, "Ledger");
        assert_eq!(
            wb.resolve(&TargetSheet::Named("Notes".into())).unwrap().part,
            "xl/worksheets/sheet2.xml"
        );
        assert!(matches!(
            wb.resolve(&TargetSheet::Named("Missing".into())),
            Err(WorkbookError::SheetNotFound(_))
        ));
    }

    #[test]
    fn workbook_without_vba_reports_no_macros() {
        let wb = Workbook::from_bytes(&LedgerFixture::default().without_macros().build()).unwrap();
        assert!(!wb.has_macros());
    }

    #[test]
    fn rich_text_shared_strings_are_flattened() {
        let fixture = LedgerFixture::default().with_shared_strings_xml(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="4">
<si><t>Serial No</t></si>
<si><r><t>St</t></r><r><rPr><b/></rPr><t>age</t></r></si>
<si><t>Operator</t><rPh sb="0" eb="1"><t>ignored</t></rPh></si>
<si><t xml:space="preserve">Timestamp</t></si>
</sst>"#,
        );
        let wb = Workbook::from_bytes(&fixture.build()).unwrap();
        assert_eq!(
            wb.shared_strings,
            vec!["Serial No", "Stage", "Operator", "Timestamp"]
        );
    }

    #[test]
    fn shared_string_hex_escapes_are_decoded() {
        let fixture = LedgerFixture::default().with_shared_strings_xml(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="2" uniqueCount="2">
<si><t>(01)0950_x001D_(21)ABC</t></si>
<si><t>LOT_x005F_x0041_</t></si>
</sst>"#,
        );
        let wb = Workbook::from_bytes(&fixture.build()).unwrap();
        assert_eq!(wb.shared_strings, vec!["(01)0950\u{1d}(21)ABC", "LOT_x0041_"]);
    }
}
