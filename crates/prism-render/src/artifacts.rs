// SPDX-License-Identifier: CEPL-1.0
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::PathBuf;

use prism_core::{Error, Result};
use tracing::debug;

pub const VERTEX_SHADER: &str = "triangle.vert.spv";
pub const FRAGMENT_SHADER: &str = "triangle.frag.spv";

/// Source of pre-compiled SPIR-V.
pub trait ShaderStore {
    fn load_bytecode(&self, name: &str) -> Result<Cow<'_, [u8]>>;
}

/// Bytecode baked into the binary.
#[derive(Clone, Debug, Default)]
pub struct EmbeddedShaderStore {
    entries: Vec<(&'static str, &'static [u8])>,
}

impl EmbeddedShaderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, bytes: &'static [u8]) -> Self {
        self.entries.push((name, bytes));
        self
    }
}

impl ShaderStore for EmbeddedShaderStore {
    fn load_bytecode(&self, name: &str) -> Result<Cow<'_, [u8]>> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, bytes)| Cow::Borrowed(*bytes))
            .ok_or_else(|| Error::ArtifactNotFound {
                name: name.to_owned(),
            })
    }
}

/// `.spv` files read from a directory on every load.
#[derive(Clone, Debug)]
pub struct DirShaderStore {
    root: PathBuf,
}

impl DirShaderStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ShaderStore for DirShaderStore {
    fn load_bytecode(&self, name: &str) -> Result<Cow<'_, [u8]>> {
        let path = self.root.join(name);
        debug!("loading shader {}", path.display());
        match fs::read(&path) {
            Ok(bytes) => Ok(Cow::Owned(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::ArtifactNotFound {
                name: name.to_owned(),
            }),
            Err(source) => Err(Error::ArtifactReadFailed {
                name: name.to_owned(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_store_finds_by_name() {
        static BYTES: [u8; 4] = [0x03, 0x02, 0x23, 0x07];
        let store = EmbeddedShaderStore::new().with(VERTEX_SHADER, &BYTES);
        assert_eq!(&*store.load_bytecode(VERTEX_SHADER).unwrap(), &BYTES);
        assert!(matches!(
            store.load_bytecode(FRAGMENT_SHADER),
            Err(Error::ArtifactNotFound { name }) if name == FRAGMENT_SHADER
        ));
    }

    #[test]
    fn dir_store_reads_files_and_reports_missing() {
        let root = std::env::temp_dir().join(format!("prism-shaders-{}", std::process::id()));
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join(FRAGMENT_SHADER), [1u8, 2, 3, 4]).unwrap();

        let store = DirShaderStore::new(&root);
        assert_eq!(&*store.load_bytecode(FRAGMENT_SHADER).unwrap(), &[1, 2, 3, 4]);
        assert!(matches!(
            store.load_bytecode("missing.spv"),
            Err(Error::ArtifactNotFound { .. })
        ));

        fs::remove_dir_all(&root).unwrap();
    }
}
