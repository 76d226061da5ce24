use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::ptr;

use log::debug;
use memmap2::{MmapMut, MmapOptions};

use crate::error::ConfigError;

/// An open device file and a shared read-write mapping of its first `len` bytes.
///
/// The mapping and the file are released together when the window is dropped.
pub struct RegisterWindow {
    // dropped before `_file`
    map: MmapMut,
    _file: File,
    path: PathBuf,
}

impl RegisterWindow {
    pub fn open(path: &Path, len: usize) -> Result<Self, ConfigError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| ConfigError::DeviceOpenFailed {
                path: path.to_path_buf(),
                source,
            })?;

        let mapping_failed = |source| ConfigError::MappingFailed {
            path: path.to_path_buf(),
            size: len,
            source,
        };
        // mmap(2) rejects empty mappings
        if len == 0 {
            return Err(mapping_failed(io::Error::new(
                io::ErrorKind::InvalidInput,
                "zero-length mapping",
            )));
        }
        // a regular file shorter than the window would fault on first access;
        // device nodes report length 0 and are taken at their word
        let meta = file.metadata().map_err(mapping_failed)?;
        if meta.file_type().is_file() && meta.len() < len as u64 {
            return Err(mapping_failed(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("file is only {} bytes long", meta.len()),
            )));
        }
        let map = unsafe { MmapOptions::new().len(len).map_mut(&file) }.map_err(mapping_failed)?;
        debug!("mapped {} bytes of {}", len, path.display());

        Ok(RegisterWindow {
            map,
            _file: file,
            path: path.to_path_buf(),
        })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Panics if `offset` is outside the window.
    pub fn read_byte(&self, offset: usize) -> u8 {
        unsafe { ptr::read_volatile(&self.map[offset]) }
    }

    /// Panics if `offset` is outside the window.
    pub fn write_byte(&mut self, offset: usize, value: u8) {
        unsafe { ptr::write_volatile(&mut self.map[offset], value) }
    }

    pub fn read_bit(&self, offset: usize, bit: u8) -> bool {
        (self.read_byte(offset) >> bit) & 1 != 0
    }

    /// Read-modify-write of a single bit.
    pub fn write_bit(&mut self, offset: usize, bit: u8, value: bool) {
        let byte = self.read_byte(offset);
        let byte = if value {
            byte | (1 << bit)
        } else {
            byte & !(1 << bit)
        };
        self.write_byte(offset, byte);
    }
}

impl Drop for RegisterWindow {
    fn drop(&mut self) {
        debug!("unmapping {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn register_file(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn missing_device_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope");
        match RegisterWindow::open(&path, 16) {
            Err(ConfigError::DeviceOpenFailed { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected {:?}", other.map(|w| w.len())),
        }
    }

    #[test]
    fn writes_reach_the_backing_file() {
        let file = register_file(&[0u8; 8]);
        let mut window = RegisterWindow::open(file.path(), 8).unwrap();
        window.write_bit(2, 5, true);
        window.write_byte(7, 0xa5);
        drop(window);

        let contents = fs::read(file.path()).unwrap();
        assert_eq!(contents[2], 0b0010_0000);
        assert_eq!(contents[7], 0xa5);
    }

    #[test]
    fn write_bit_preserves_neighbours() {
        let file = register_file(&[0xff, 0x00]);
        let mut window = RegisterWindow::open(file.path(), 2).unwrap();
        window.write_bit(0, 3, false);
        window.write_bit(1, 6, true);
        assert_eq!(window.read_byte(0), 0b1111_0111);
        assert_eq!(window.read_byte(1), 0b0100_0000);
        assert!(window.read_bit(1, 6));
        assert!(!window.read_bit(0, 3));
    }

    #[test]
    fn zero_length_window_is_a_mapping_failure() {
        let file = register_file(&[]);
        match RegisterWindow::open(file.path(), 0) {
            Err(ConfigError::MappingFailed { size: 0, .. }) => (),
            other => panic!("unexpected {:?}", other.map(|w| w.len())),
        }
    }

    #[test]
    fn short_file_is_a_mapping_failure() {
        let file = register_file(&[0u8; 4]);
        match RegisterWindow::open(file.path(), 8) {
            Err(ConfigError::MappingFailed { size: 8, source, .. }) => {
                assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof)
            }
            other => panic!("unexpected {:?}", other.map(|w| w.len())),
        }
        // a window may cover less than the whole file
        assert_eq!(RegisterWindow::open(file.path(), 2).unwrap().len(), 2);
    }

    #[test]
    fn window_remembers_its_device() {
        let file = register_file(&[0u8; 4]);
        let window = RegisterWindow::open(file.path(), 4).unwrap();
        assert_eq!(window.path(), file.path());
        assert_eq!(window.len(), 4);
        assert!(!window.is_empty());
    }
}
