use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading, rewriting or serializing a workbook package.
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid workbook container: {0}")]
    Container(#[from] zip::result::ZipError),

    #[error("cannot read part {part}: {source}")]
    PartIo {
        part: String,
        #[source]
        source: io::Error,
    },

    #[error("workbook part {0} is missing")]
    MissingPart(String),

    #[error("workbook part {0} is not valid UTF-8")]
    Encoding(String),

    #[error("malformed XML in {part}: {message}")]
    Xml { part: String, message: String },

    #[error("workbook has no sheets")]
    NoSheets,

    #[error("sheet {0:?} not found in workbook")]
    SheetNotFound(String),

    #[error("shared string {index} referenced by {cell} does not exist")]
    SharedString { index: usize, cell: String },

    #[error("invalid cell reference {0:?}")]
    CellRef(String),

    #[error("{part} would exceed the worksheet limit of {limit} {what}")]
    SheetLimit {
        part: String,
        what: &'static str,
        limit: u32,
    },
}

impl WorkbookError {
    pub(crate) fn xml(part: &str, err: impl std::fmt::Display) -> Self {
        WorkbookError::Xml {
            part: part.to_string(),
            message: err.to_string(),
        }
    }
}
