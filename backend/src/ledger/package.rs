//! Binary-safe access to the zip container behind an `.xlsm` workbook.
//!
//! Every entry is read into memory in its original order and written back
//! unchanged unless it was explicitly replaced. This is what keeps the macro
//! payload (`xl/vbaProject.bin`), the content-type declarations and any
//! other part we do not understand intact across a merge.

use super::error::WorkbookError;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// One named entry of the package.
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub data: Vec<u8>,
    stored: bool,
}

/// In-memory copy of an OOXML package.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    pub fn open(path: &Path) -> Result<Self, WorkbookError> {
        let bytes = fs::read(path).map_err(|source| WorkbookError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WorkbookError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let stored = entry.compression() == CompressionMethod::Stored;
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut data)
                .map_err(|source| WorkbookError::PartIo {
                    part: name.clone(),
                    source,
                })?;
            parts.push(Part { name, data, stored });
        }

        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Part names are case-insensitive in OOXML.
    fn position(&self, name: &str) -> Option<usize> {
        self.parts
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.position(name).map(|i| self.parts[i].data.as_slice())
    }

    /// Returns a part decoded as UTF-8 XML, or `None` when it does not exist.
    pub fn xml(&self, name: &str) -> Result<Option<&str>, WorkbookError> {
        match self.part(name) {
            None => Ok(None),
            Some(bytes) => {
                let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                std::str::from_utf8(bytes)
                    .map(Some)
                    .map_err(|_| WorkbookError::Encoding(name.to_string()))
            }
        }
    }

    pub fn require_xml(&self, name: &str) -> Result<&str, WorkbookError> {
        self.xml(name)?
            .ok_or_else(|| WorkbookError::MissingPart(name.to_string()))
    }

    /// Overwrites the content of an existing part, keeping its position.
    pub fn replace(&mut self, name: &str, data: Vec<u8>) -> Result<(), WorkbookError> {
        let i = self
            .position(name)
            .ok_or_else(|| WorkbookError::MissingPart(name.to_string()))?;
        self.parts[i].data = data;
        Ok(())
    }

    /// Serializes the package back into a zip container.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WorkbookError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for part in &self.parts {
            let options = if part.stored { stored } else { deflated };
            writer.start_file(part.name.as_str(), options)?;
            writer
                .write_all(&part.data)
                .map_err(|source| WorkbookError::PartIo {
                    part: part.name.clone(),
                    source,
                })?;
        }

        Ok(writer.finish()?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::fixtures::{LedgerFixture, VBA_PAYLOAD};

    #[test]
    fn round_trip_keeps_every_part_in_order() {
        let bytes = LedgerFixture::default().build();
        let original = Package::from_bytes(&bytes).unwrap();
        let again = Package::from_bytes(&original.to_bytes().unwrap()).unwrap();

        let names = |p: &Package| p.parts().iter().map(|x| x.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&original), names(&again));
        assert_eq!(names(&again)[0], "[Content_Types].xml");
        assert_eq!(again.part("xl/vbaProject.bin"), Some(VBA_PAYLOAD));
    }

    #[test]
    fn part_lookup_ignores_case() {
        let pkg = Package::from_bytes(&LedgerFixture::default().build()).unwrap();
        assert!(pkg.contains("XL/workbook.xml"));
        assert!(pkg.xml("xl/missing.xml").unwrap().is_none());
        assert!(matches!(
            pkg.require_xml("xl/missing.xml"),
            Err(WorkbookError::MissingPart(_))
        ));
    }

    #[test]
    fn replacing_unknown_part_fails() {
        let mut pkg = Package::from_bytes(&LedgerFixture::default().build()).unwrap();
        assert!(pkg.replace("xl/worksheets/sheet9.xml", Vec::new()).is_err());
    }

    #[test]
    fn garbage_is_not_a_package() {
        assert!(matches!(
            Package::from_bytes(b"Serial No,Stage\n"),
            Err(WorkbookError::Container(_))
        ));
    }
}
