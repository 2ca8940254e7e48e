//! In-memory `.xlsm` packages for tests: a "Ledger" sheet, a "Notes" sheet
//! that reads from the shared-string table, and a fake VBA project.

use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const VBA_PAYLOAD: &[u8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1VBA-PROJECT\x00\x01\x02\x03";

pub const NOTES_SHEET_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><dimension ref="A1"/><sheetData><row r="1"><c r="A1" t="s"><v>4</v></c></row></sheetData></worksheet>"#;

const DEFAULT_SHARED_STRINGS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="5" uniqueCount="5"><si><t>Serial No</t></si><si><t>Stage</t></si><si><t>Operator</t></si><si><t>Timestamp</t></si><si><t>Keep me</t></si></sst>"#;

#[derive(Debug, Clone)]
pub struct LedgerFixture {
    rows: Vec<[String; 4]>,
    macros: bool,
    shared_strings_xml: String,
}

impl Default for LedgerFixture {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            macros: true,
            shared_strings_xml: DEFAULT_SHARED_STRINGS.to_string(),
        }
    }
}

impl LedgerFixture {
    /// Existing ledger rows as `[serial, stage, operator, timestamp]`.
    pub fn with_rows(mut self, rows: &[[&str; 4]]) -> Self {
        self.rows = rows
            .iter()
            .map(|r| [r[0], r[1], r[2], r[3]].map(str::to_string))
            .collect();
        self
    }

    pub fn without_macros(mut self) -> Self {
        self.macros = false;
        self
    }

    pub fn with_shared_strings_xml(mut self, xml: &str) -> Self {
        self.shared_strings_xml = xml.to_string();
        self
    }

    fn ledger_sheet_xml(&self) -> String {
        let mut rows = String::from(
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>2</v></c><c r="D1" t="s"><v>3</v></c></row>"#,
        );
        for (i, row) in self.rows.iter().enumerate() {
            let r = i + 2;
            rows.push_str(&format!(r#"<row r="{}">"#, r));
            for (col, value) in ["A", "B", "C", "D"].iter().zip(row.iter()) {
                rows.push_str(&format!(
                    r#"<c r="{}{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    col, r, value
                ));
            }
            rows.push_str("</row>");
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><dimension ref="A1:D{}"/><sheetViews><sheetView tabSelected="1" workbookViewId="0"/></sheetViews><sheetData>{}</sheetData><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/></worksheet>"#,
            self.rows.len() + 1,
            rows
        )
    }

    fn content_types(&self) -> String {
        let vba = if self.macros {
            r#"<Default Extension="bin" ContentType="application/vnd.ms-office.vbaProject"/>"#
        } else {
            ""
        };
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">{}<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.ms-excel.sheet.macroEnabled.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/worksheets/sheet2.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#,
            vba
        )
    }

    fn workbook_rels(&self) -> String {
        let vba = if self.macros {
            r#"<Relationship Id="rId9" Type="http://schemas.microsoft.com/office/2006/relationships/vbaProject" Target="vbaProject.bin"/>"#
        } else {
            ""
        };
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet2.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>{}</Relationships>"#,
            vba
        )
    }

    pub fn build(&self) -> Vec<u8> {
        let mut parts: Vec<(&str, Vec<u8>)> = vec![
            ("[Content_Types].xml", self.content_types().into_bytes()),
            (
                "_rels/.rels",
                br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
                    .to_vec(),
            ),
            (
                "xl/workbook.xml",
                br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Ledger" sheetId="1" r:id="rId1"/><sheet name="Notes" sheetId="2" r:id="rId2"/></sheets></workbook>"#
                    .to_vec(),
            ),
            ("xl/_rels/workbook.xml.rels", self.workbook_rels().into_bytes()),
            ("xl/worksheets/sheet1.xml", self.ledger_sheet_xml().into_bytes()),
            ("xl/worksheets/sheet2.xml", NOTES_SHEET_XML.as_bytes().to_vec()),
            ("xl/sharedStrings.xml", self.shared_strings_xml.clone().into_bytes()),
        ];
        if self.macros {
            parts.push(("xl/vbaProject.bin", VBA_PAYLOAD.to_vec()));
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in parts {
            writer.start_file(name, options).expect("start zip entry");
            writer.write_all(&data).expect("write zip entry");
        }
        writer.finish().expect("finish zip").into_inner()
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.build()).expect("write fixture workbook");
    }
}
