//! Reading module zips with the `zip` crate.

use crate::GoError;
use geomys_rules::{ArchiveReader, BoxError, ModuleArchive};
use std::io::{self, Cursor, Read};
use zip::ZipArchive;

/// Most memory reserved up front for one entry. Header sizes are untrusted.
const MAX_RESERVE: u64 = 1 << 20;

/// Read a whole zip entry whose header claims `size` bytes.
pub(crate) fn read_entry(entry: &mut impl Read, size: u64) -> io::Result<Vec<u8>> {
    let mut data = Vec::with_capacity(size.min(MAX_RESERVE) as usize);
    entry.read_to_end(&mut data)?;
    Ok(data)
}

/// Opens module zips held in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveReader;

/// An open module zip.
pub struct ZipModuleArchive<'a> {
    zip: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> ZipModuleArchive<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self, GoError> {
        Ok(Self {
            zip: ZipArchive::new(Cursor::new(bytes))?,
        })
    }

    /// File entries (directories skipped), in archive order.
    pub fn file_names(&self) -> Vec<String> {
        self.zip
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(String::from)
            .collect()
    }

    pub fn read(&mut self, name: &str) -> Result<Vec<u8>, GoError> {
        let mut file = self.zip.by_name(name)?;
        let size = file.size();
        read_entry(&mut file, size).map_err(|e| GoError::io(name, e))
    }
}

impl ModuleArchive for ZipModuleArchive<'_> {
    fn file_names(&self) -> Vec<String> {
        ZipModuleArchive::file_names(self)
    }

    fn read(&mut self, name: &str) -> Result<Vec<u8>, BoxError> {
        Ok(ZipModuleArchive::read(self, name)?)
    }
}

impl ArchiveReader for ZipArchiveReader {
    fn open<'a>(&self, bytes: &'a [u8]) -> Result<Box<dyn ModuleArchive + 'a>, BoxError> {
        Ok(Box::new(ZipModuleArchive::new(bytes)?))
    }
}
