use std::path::Path;

use crate::{metadata::typesystem::ModuleRc, Result};

/// Turns the bytes of a located file into a module graph.
///
/// Implemented by the decoding layer. The resolver hands over the mapped bytes of the file
/// it located and stores whatever graph comes back; it never decodes metadata itself.
/// Closures with the matching signature implement the trait.
///
/// # Examples
///
/// ```rust
/// use std::path::Path;
/// use dotscope_resolver::{
///     metadata::{identity::AssemblyIdentity, typesystem::{ModuleDefinition, ModuleRc}},
///     resolver::ModuleReader,
///     Result,
/// };
///
/// fn read(path: &Path, _data: &[u8]) -> Result<ModuleRc> {
///     let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
///     Ok(ModuleDefinition::new(name, AssemblyIdentity::parse(name)?))
/// }
///
/// let reader: &dyn ModuleReader = &read;
/// let module = reader.read(Path::new("Demo.dll"), &[])?;
/// assert_eq!(module.assembly().name, "Demo");
/// # Ok::<(), dotscope_resolver::Error>(())
/// ```
pub trait ModuleReader: Send + Sync {
    /// Decode a module.
    ///
    /// # Arguments
    /// * `path` - The file the bytes were mapped from
    /// * `data` - The complete file contents
    ///
    /// # Errors
    /// Returns an error if the bytes are not a readable module.
    fn read(&self, path: &Path, data: &[u8]) -> Result<ModuleRc>;
}

impl<F> ModuleReader for F
where
    F: Fn(&Path, &[u8]) -> Result<ModuleRc> + Send + Sync,
{
    fn read(&self, path: &Path, data: &[u8]) -> Result<ModuleRc> {
        self(path, data)
    }
}
