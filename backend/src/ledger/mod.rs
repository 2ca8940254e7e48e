//! # Ledger Merge Engine
//!
//! Folds the staged scan records into a copy of the macro-enabled master
//! workbook and writes the result as a new `Master_<unix-ms>.xlsm` file.
//!
//! ## Workflow
//!
//! 1.  **Load**: the template is read into a [`Workbook`], which keeps every
//!     package part (including `xl/vbaProject.bin`) in memory in its original
//!     order.
//! 2.  **Target**: the sheet named by [`TargetSheet`] is resolved; the ledger
//!     convention is [`LEDGER_SHEET`], the first sheet in workbook order.
//! 3.  **Decode**: the target sheet becomes a [`Table`] of header-keyed rows.
//! 4.  **Map**: each [`ScanRecord`] becomes a row with the fixed
//!     `Serial No / Stage / Operator / Timestamp` columns. Load and wagon
//!     fields are not part of the ledger schema.
//! 5.  **Append**: mapped rows go after the existing ones in staging order.
//!     Nothing is deduplicated or updated in place.
//! 6.  **Encode**: the table replaces the target sheet's cell data; all other
//!     sheets and parts are written back byte for byte.
//! 7.  **Write**: the package is serialized next to (never over) the template.

mod error;
mod package;
mod sheet;
mod workbook;
mod xml;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::WorkbookError;
pub use sheet::{Cell, Row, Table};
pub use workbook::{TargetSheet, Workbook, LEDGER_SHEET};

use common::model::scan::ScanRecord;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const SERIAL_NO: &str = "Serial No";
pub const STAGE: &str = "Stage";
pub const OPERATOR: &str = "Operator";
pub const TIMESTAMP: &str = "Timestamp";

/// Columns every staged record is projected onto, in sheet order.
pub const LEDGER_COLUMNS: [&str; 4] = [SERIAL_NO, STAGE, OPERATOR, TIMESTAMP];

/// MIME type of a macro-enabled workbook.
pub const XLSM_CONTENT_TYPE: &str = "application/vnd.ms-excel.sheet.macroEnabled.12";

const OUTPUT_PREFIX: &str = "Master_";
const OUTPUT_EXTENSION: &str = "xlsm";

/// What a merge did, for logging and for callers that want counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub sheet: String,
    pub existing_rows: usize,
    pub appended_rows: usize,
    pub total_rows: usize,
    pub sheet_count: usize,
    pub has_macros: bool,
}

/// A written export artifact.
#[derive(Debug)]
pub struct LedgerExport {
    pub file_name: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub summary: MergeSummary,
}

/// Projects a staged record onto the ledger columns.
pub fn ledger_row(record: &ScanRecord) -> Row {
    let values = [
        &record.serial,
        &record.stage,
        &record.operator,
        &record.timestamp,
    ];
    LEDGER_COLUMNS
        .iter()
        .zip(values)
        .fold(Row::new(), |row, (column, value)| {
            row.with(*column, Cell::text(value.as_str()))
        })
}

pub fn output_file_name(now_ms: i64) -> String {
    format!("{}{}.{}", OUTPUT_PREFIX, now_ms, OUTPUT_EXTENSION)
}

/// Appends `records` to the target sheet of an in-memory workbook.
pub fn merge(
    workbook: &mut Workbook,
    target: &TargetSheet,
    records: &[ScanRecord],
) -> Result<MergeSummary, WorkbookError> {
    let sheet = workbook.resolve(target)?;
    let mut table = workbook.read_table(&sheet)?;
    let existing_rows = table.row_count();

    table.append_rows(records.iter().map(ledger_row));
    workbook.write_table(&sheet, &table)?;

    Ok(MergeSummary {
        sheet: sheet.name,
        existing_rows,
        appended_rows: records.len(),
        total_rows: table.row_count(),
        sheet_count: workbook.sheet_count(),
        has_macros: workbook.has_macros(),
    })
}

/// Creates `Master_<ms>.xlsm` in `dir`, moving forward a millisecond at a
/// time while another export holds the name. Creation is exclusive, so
/// concurrent exports never share a file.
fn create_output(dir: &Path, now_ms: i64) -> Result<(String, PathBuf, File), WorkbookError> {
    let mut stamp = now_ms;
    loop {
        let name = output_file_name(stamp);
        let path = dir.join(&name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((name, path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => stamp += 1,
            Err(source) => return Err(WorkbookError::Write { path, source }),
        }
    }
}

/// Runs the whole merge against the template on disk and writes the result
/// into `export_dir`. Blocking; call it from a blocking thread.
pub fn export_ledger(
    template: &Path,
    export_dir: &Path,
    target: &TargetSheet,
    records: &[ScanRecord],
    now_ms: i64,
) -> Result<LedgerExport, WorkbookError> {
    let mut workbook = Workbook::open(template)?;
    let summary = merge(&mut workbook, target, records)?;
    let bytes = workbook.to_bytes()?;

    let (file_name, path, mut file) = create_output(export_dir, now_ms)?;
    if let Err(source) = file.write_all(&bytes).and_then(|()| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(&path);
        return Err(WorkbookError::Write { path, source });
    }

    Ok(LedgerExport {
        file_name,
        path,
        bytes,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::fixtures::{LedgerFixture, NOTES_SHEET_XML, VBA_PAYLOAD};
    use super::package::Package;
    use super::*;
    use tempfile::TempDir;

    fn staged(serial: &str) -> ScanRecord {
        ScanRecord {
            serial: serial.to_string(),
            stage: "received".to_string(),
            operator: "Clerk A".to_string(),
            timestamp: "2025-09-14T08:15:02.123Z".to_string(),
            load_id: Some("L-2025-09-001".to_string()),
            wagon1: Some("W-1".to_string()),
            wagon2: None,
            wagon3: None,
        }
    }

    fn existing() -> LedgerFixture {
        LedgerFixture::default().with_rows(&[
            ["E-1", "received", "Clerk B", "2025-09-01T10:00:00.000Z"],
            ["E-2", "shipped", "Clerk C", "2025-09-02T11:00:00.000Z"],
        ])
    }

    fn serials(table: &Table) -> Vec<String> {
        table.rows().iter().map(|r| r.text(SERIAL_NO)).collect()
    }

    #[test]
    fn merged_rows_are_existing_followed_by_staged() {
        let mut wb = Workbook::from_bytes(&existing().build()).unwrap();
        let records = [staged("S-1"), staged("S-2"), staged("S-3")];

        let summary = merge(&mut wb, &LEDGER_SHEET, &records).unwrap();

        assert_eq!(summary.existing_rows, 2);
        assert_eq!(summary.appended_rows, 3);
        assert_eq!(summary.total_rows, 5);

        let sheet = wb.resolve(&LEDGER_SHEET).unwrap();
        let table = wb.read_table(&sheet).unwrap();
        assert_eq!(serials(&table), vec!["E-1", "E-2", "S-1", "S-2", "S-3"]);
        assert_eq!(table.rows()[1].text(STAGE), "shipped");
        assert_eq!(table.rows()[4].text(OPERATOR), "Clerk A");
        assert_eq!(table.rows()[4].text(TIMESTAMP), "2025-09-14T08:15:02.123Z");
    }

    #[test]
    fn context_fields_are_not_projected() {
        let mut wb = Workbook::from_bytes(&existing().build()).unwrap();
        merge(&mut wb, &LEDGER_SHEET, &[staged("S-1")]).unwrap();

        let sheet = wb.resolve(&LEDGER_SHEET).unwrap();
        assert_eq!(wb.read_table(&sheet).unwrap().headers(), LEDGER_COLUMNS.to_vec());
    }

    #[test]
    fn repeated_serials_are_appended_not_merged() {
        let mut wb = Workbook::from_bytes(&existing().build()).unwrap();
        merge(&mut wb, &LEDGER_SHEET, &[staged("E-1"), staged("E-1")]).unwrap();

        let sheet = wb.resolve(&LEDGER_SHEET).unwrap();
        assert_eq!(
            serials(&wb.read_table(&sheet).unwrap()),
            vec!["E-1", "E-2", "E-1", "E-1"]
        );
    }

    #[test]
    fn empty_template_sheet_gets_ledger_headers() {
        let mut wb = Workbook::from_bytes(&LedgerFixture::default().build()).unwrap();
        let summary = merge(&mut wb, &LEDGER_SHEET, &[staged("S-1")]).unwrap();
        assert_eq!(summary.existing_rows, 0);
        assert_eq!(summary.total_rows, 1);
    }

    #[test]
    fn other_sheets_and_macros_survive_byte_for_byte() {
        let template = existing().build();
        let before = Package::from_bytes(&template).unwrap();
        let mut wb = Workbook::from_bytes(&template).unwrap();

        let summary = merge(&mut wb, &LEDGER_SHEET, &[staged("S-1")]).unwrap();
        assert_eq!(summary.sheet_count, 2);
        assert!(summary.has_macros);

        let after = Package::from_bytes(&wb.to_bytes().unwrap()).unwrap();
        for part in before.parts() {
            if part.name == "xl/worksheets/sheet1.xml" {
                continue;
            }
            assert_eq!(after.part(&part.name), Some(part.data.as_slice()), "{}", part.name);
        }
        assert_eq!(after.part("xl/vbaProject.bin"), Some(VBA_PAYLOAD));
        assert_eq!(
            after.part("xl/worksheets/sheet2.xml"),
            Some(NOTES_SHEET_XML.as_bytes())
        );

        let reopened = Workbook::from_bytes(&wb.to_bytes().unwrap()).unwrap();
        assert_eq!(reopened.sheet_count(), 2);
        let notes = reopened.resolve(&TargetSheet::Named("Notes".into())).unwrap();
        assert_eq!(reopened.read_table(&notes).unwrap().headers(), vec!["Keep me"]);
    }

    #[test]
    fn named_target_sheet_is_honoured() {
        let mut wb = Workbook::from_bytes(&existing().build()).unwrap();
        let summary = merge(&mut wb, &TargetSheet::Named("Notes".into()), &[staged("S-1")]).unwrap();
        assert_eq!(summary.sheet, "Notes");
        assert_eq!(summary.existing_rows, 0);

        let ledger = wb.resolve(&LEDGER_SHEET).unwrap();
        assert_eq!(wb.read_table(&ledger).unwrap().row_count(), 2);
    }

    #[test]
    fn export_writes_new_file_and_leaves_template_alone() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("template.xlsm");
        existing().write_to(&template);
        let pristine = fs::read(&template).unwrap();
        let records = [staged("S-1"), staged("S-2")];

        let first = export_ledger(&template, dir.path(), &LEDGER_SHEET, &records, 1_757_837_702_123)
            .unwrap();
        let second = export_ledger(&template, dir.path(), &LEDGER_SHEET, &records, 1_757_837_702_123)
            .unwrap();

        assert_eq!(first.file_name, "Master_1757837702123.xlsm");
        assert_eq!(second.file_name, "Master_1757837702124.xlsm");
        assert_eq!(fs::read(&first.path).unwrap(), first.bytes);
        assert_eq!(first.summary.total_rows, second.summary.total_rows);
        assert_eq!(first.summary.total_rows, 4);
        assert_eq!(fs::read(&template).unwrap(), pristine);
    }

    #[test]
    fn concurrent_exports_in_one_millisecond_get_distinct_files() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("template.xlsm");
        existing().write_to(&template);
        let records = [staged("S-1")];

        let (template, out_dir, records) = (template.as_path(), dir.path(), &records[..]);
        let mut names: Vec<String> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(move || {
                        export_ledger(template, out_dir, &LEDGER_SHEET, records, 1_000)
                            .unwrap()
                            .file_name
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        names.sort();

        assert_eq!(
            names,
            vec!["Master_1000.xlsm", "Master_1001.xlsm", "Master_1002.xlsm", "Master_1003.xlsm"]
        );
        for name in &names {
            let bytes = fs::read(dir.path().join(name)).unwrap();
            let wb = Workbook::from_bytes(&bytes).unwrap();
            let sheet = wb.resolve(&LEDGER_SHEET).unwrap();
            assert_eq!(wb.read_table(&sheet).unwrap().row_count(), 3);
        }
    }

    #[test]
    fn gs1_separators_produce_a_readable_ledger() {
        let gs1 = "(01)0950\u{1d}(21)ABC";
        let mut wb = Workbook::from_bytes(&existing().build()).unwrap();
        merge(&mut wb, &LEDGER_SHEET, &[staged(gs1)]).unwrap();

        let output = Package::from_bytes(&wb.to_bytes().unwrap()).unwrap();
        let sheet_xml = String::from_utf8(
            output.part("xl/worksheets/sheet1.xml").unwrap().to_vec(),
        )
        .unwrap();
        assert!(!sheet_xml.contains('\u{1d}'));
        assert!(sheet_xml.contains("_x001D_"));

        let reopened = Workbook::from_bytes(&wb.to_bytes().unwrap()).unwrap();
        let sheet = reopened.resolve(&LEDGER_SHEET).unwrap();
        let table = reopened.read_table(&sheet).unwrap();
        assert_eq!(table.rows()[2].text(SERIAL_NO), gs1);
    }

    #[test]
    fn missing_template_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let err = export_ledger(
            &dir.path().join("template.xlsm"),
            dir.path(),
            &LEDGER_SHEET,
            &[],
            0,
        )
        .unwrap_err();
        assert!(matches!(err, WorkbookError::Read { .. }));
    }

    #[test]
    fn output_names_carry_the_timestamp() {
        assert_eq!(output_file_name(42), "Master_42.xlsm");
    }
}
