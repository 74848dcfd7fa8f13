use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::PresetConfig;
use crate::identity::TypeIdentity;

const PRESET_DIR: &str = "presets";

/// Locations of the two preset layers of one component type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetPaths {
    pub user: PathBuf,
    pub system: PathBuf,
}

impl PresetPaths {
    /// Sibling holding the previous user file.
    pub fn backup(&self) -> PathBuf {
        backup_path(&self.user)
    }
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Maps type identities to preset file paths. The first lookup of a type
/// creates its directories; the result is then reused for the lifetime of
/// the resolver even if the roots change on disk.
#[derive(Debug)]
pub struct PathResolver {
    user_dir: PathBuf,
    system_dir: PathBuf,
    extension: String,
    cache: Mutex<HashMap<TypeIdentity, PresetPaths>>,
}

impl PathResolver {
    pub fn new(config: &PresetConfig) -> Self {
        Self {
            user_dir: config.user_root.join(PRESET_DIR),
            system_dir: config.system_root.join(PRESET_DIR),
            extension: config.extension.clone(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn resolve(&self, identity: &TypeIdentity) -> PresetPaths {
        let mut cache = self.cache.lock();
        if let Some(paths) = cache.get(identity) {
            return paths.clone();
        }

        let file_name = format!("{identity}.{}", self.extension);
        ensure_dir(&self.user_dir);
        ensure_dir(&self.system_dir);
        let paths = PresetPaths {
            user: self.user_dir.join(&file_name),
            system: self.system_dir.join(&file_name),
        };
        debug!(
            %identity,
            user = %paths.user.display(),
            system = %paths.system.display(),
            "resolved preset paths"
        );
        cache.insert(identity.clone(), paths.clone());
        paths
    }
}

fn ensure_dir(dir: &Path) {
    if let Err(err) = fs::create_dir_all(dir) {
        warn!(dir = %dir.display(), "unable to create preset directory: {err}");
    }
}
