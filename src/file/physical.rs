//! Read-only memory mapping of one module file.
//!
//! Dependency assemblies are often large, and decoding their metadata touches only a
//! fraction of them, so files are mapped rather than read. Instances are handed out by
//! [`crate::file::FileCache`], which maps every path at most once.

use std::{
    fs,
    path::{Path, PathBuf},
};

use memmap2::Mmap;

use super::Backend;
use crate::{Error, Result};

/// A module file mapped into memory.
///
/// The mapping lives as long as the value. Slicing is bounds-checked.
///
/// # Examples
///
/// ```rust,no_run
/// use dotscope_resolver::file::{Backend, Physical};
///
/// let physical = Physical::new("deps/System.Runtime.dll")?;
/// assert_eq!(physical.data_slice(0, 2)?, b"MZ");
/// # Ok::<(), dotscope_resolver::Error>(())
/// ```
#[derive(Debug)]
pub struct Physical {
    path: PathBuf,
    map: Mmap,
}

impl Physical {
    /// Map the file at `path`.
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if the file cannot be opened or mapped, and
    /// [`Error::Empty`] for a zero-length file, which cannot hold a module.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let path = path.as_ref();
        let file = fs::File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(Error::Empty);
        }

        // Safety: the mapping is read-only; files replaced on disk are picked up through
        // `FileCache::invalidate`, which drops this value once no view is left.
        let map = unsafe { Mmap::map(&file)? };

        Ok(Physical {
            path: path.to_path_buf(),
            map,
        })
    }

    /// The file this mapping was created from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.map.get(offset..end))
            .ok_or_else(|| {
                malformed_error!(
                    "{} bytes at offset {} are outside of '{}' ({} bytes)",
                    len,
                    offset,
                    self.path.display(),
                    self.map.len()
                )
            })
    }

    fn data(&self) -> &[u8] {
        &self.map
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}
