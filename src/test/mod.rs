mod factories;

use std::{
    collections::HashMap,
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

pub use factories::*;

use crate::{
    metadata::{
        identity::{AssemblyIdentity, AssemblyVersion},
        typesystem::{ModuleDefinition, ModuleRc},
    },
    resolver::ModuleReader,
    Result,
};

// Helper function to create an unsigned, culture neutral identity `<name>, Version=<major>.0.0.0`
pub fn identity(name: &str, major: u16) -> AssemblyIdentity {
    AssemblyIdentity::simple(name, AssemblyVersion::new(major, 0, 0, 0))
}

type ModuleFactory = Box<dyn Fn(&Path) -> ModuleRc + Send + Sync>;

/// Reader counting how often it decodes.
///
/// Files whose content starts with `!` fail to read. Files whose stem has a registered
/// factory yield that factory's graph; any other file yields an empty module whose
/// assembly is named after the file stem, at version 1.0.0.0.
pub struct CountingReader {
    pub reads: AtomicUsize,
    factories: HashMap<String, ModuleFactory>,
}

impl CountingReader {
    pub fn new() -> Self {
        CountingReader {
            reads: AtomicUsize::new(0),
            factories: HashMap::new(),
        }
    }

    pub fn with_module(
        mut self,
        stem: &str,
        factory: impl Fn(&Path) -> ModuleRc + Send + Sync + 'static,
    ) -> Self {
        self.factories.insert(stem.to_string(), Box::new(factory));
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ModuleReader for CountingReader {
    fn read(&self, path: &Path, data: &[u8]) -> Result<ModuleRc> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        if data.first() == Some(&b'!') {
            return Err(malformed_error!("Not a module - {}", path.display()));
        }

        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();

        Ok(match self.factories.get(stem) {
            Some(factory) => factory(path),
            None => ModuleDefinition::new(
                &format!("{}.dll", stem),
                AssemblyIdentity::simple(stem, AssemblyVersion::new(1, 0, 0, 0)),
            ),
        })
    }
}
