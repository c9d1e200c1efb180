// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `ConfigStore` (uses the platform config dir).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use mapgraph_core::{ConfigError, ConfigStore};

/// Stores configs as `<key>.json` files under one directory.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Store rooted at the user config directory (e.g. `~/.config/mapgraph`).
    ///
    /// The directory is created on first save, not here.
    pub fn new() -> Result<Self, ConfigError> {
        let proj = ProjectDirs::from("dev", "flyingrobots", "mapgraph")
            .ok_or_else(|| ConfigError::Unavailable("no home directory to place config in".into()))?;
        Ok(Self::at(proj.config_dir()))
    }

    /// Store rooted at an explicit directory.
    pub fn at(dir: impl AsRef<Path>) -> Self {
        Self {
            base: dir.as_ref().to_path_buf(),
        }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(ConfigError::NotFound(key.to_owned())),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.base)?;
        fs::write(self.path_for(key), data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use mapgraph_core::{ConfigService, EditorConfig};

    #[test]
    fn missing_dir_reads_as_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(tmp.path().join("nested"));
        assert!(matches!(store.load_raw("editor"), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn saves_and_loads_editor_config() {
        let tmp = tempfile::tempdir().unwrap();
        let service = ConfigService::new(FsConfigStore::at(tmp.path().join("cfg")));
        let config = EditorConfig {
            max_history: 7,
            ..EditorConfig::default()
        };
        service.save_editor_config(&config).unwrap();
        assert!(tmp.path().join("cfg/editor.json").exists());
        assert_eq!(service.editor_config().unwrap(), config);
    }
}
