use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::PresetConfig;
use crate::error::{PresetError, Result};
use crate::file::{self, Layer};
use crate::identity::TypeIdentity;
use crate::keyfile::{check_group_name, check_key, meta_key, Document, Group};
use crate::merge;
use crate::paths::{PathResolver, PresetPaths};

/// The resolved presets of one component type, shared by all its instances.
///
/// Every mutating method writes the whole document back to the user layer
/// before returning.
#[derive(Debug)]
pub struct PresetStore {
    identity: TypeIdentity,
    paths: PresetPaths,
    version: String,
    document: Document,
}

impl PresetStore {
    /// Loads both layers from `paths` and merges them. Layers that are
    /// missing, malformed or belong to another type are ignored.
    pub fn open(identity: TypeIdentity, paths: PresetPaths, version: impl Into<String>) -> Self {
        let user = load_layer(&identity, &paths.user);
        let system = load_layer(&identity, &paths.system);
        let resolved = merge::resolve(&identity, system, user);

        let mut store = Self {
            identity,
            paths,
            version: version.into(),
            document: resolved.document,
        };
        if resolved.needs_resave {
            if let Err(err) = store.persist() {
                warn!(identity = %store.identity, "unable to store rebased presets: {err}");
            }
        }
        store
    }

    pub fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    pub fn paths(&self) -> &PresetPaths {
        &self.paths
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn persist(&mut self) -> Result<()> {
        debug!(identity = %self.identity, path = %self.paths.user.display(), "saving presets");
        file::save(&self.paths.user, &mut self.document, &self.version)
    }

    pub fn preset_names(&self) -> Vec<String> {
        self.document.preset_names()
    }

    pub fn preset(&self, name: &str) -> Option<&Group> {
        self.document.group(name)
    }

    pub fn has_preset(&self, name: &str) -> bool {
        self.document.has_group(name)
    }

    /// Writes `values` into preset `name`, creating it when needed. Keys not
    /// mentioned keep their stored value. Names that cannot be written are
    /// rejected before the document changes.
    pub fn store_values<I>(&mut self, name: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        check_group_name(name)?;
        let values: Vec<(String, String)> = values.into_iter().collect();
        for (key, _) in &values {
            check_key(name, key)?;
        }
        let group = self.document.group_or_insert(name);
        for (key, value) in values {
            group.set(key, value);
        }
        self.persist()
    }

    /// Moves all keys and comments of `old` into `new`. Keys of `new` that
    /// `old` does not have are left alone.
    pub fn rename_preset(&mut self, old: &str, new: &str) -> Result<()> {
        let source = self
            .document
            .group(old)
            .cloned()
            .ok_or_else(|| PresetError::NotFound(old.to_string()))?;
        if old == new {
            return Ok(());
        }
        check_group_name(new)?;

        let target = self.document.group_or_insert(new);
        if let Some(comment) = source.comment() {
            target.set_comment(Some(comment.to_string()));
        }
        if let Some(trailing) = source.trailing_comment() {
            target.set_trailing_comment(Some(trailing.to_string()));
        }
        for (key, entry) in source.iter() {
            target.set_entry(key, entry);
        }
        self.document.remove_group(old);
        self.persist()
    }

    pub fn delete_preset(&mut self, name: &str) -> Result<()> {
        if self.document.remove_group(name).is_none() {
            return Err(PresetError::NotFound(name.to_string()));
        }
        self.persist()
    }

    /// Sets meta data `tag` of preset `name`; an empty or missing value
    /// removes the tag instead.
    pub fn set_meta(&mut self, name: &str, tag: &str, value: Option<&str>) -> Result<()> {
        let key = meta_key(tag);
        match value.filter(|value| !value.is_empty()) {
            Some(value) => {
                check_group_name(name)?;
                check_key(name, &key)?;
                self.document.set_value(name, &key, value);
            }
            None => {
                self.document.remove_value(name, &key);
            }
        }
        self.persist()
    }

    pub fn get_meta(&self, name: &str, tag: &str) -> Option<String> {
        self.document
            .value(name, &meta_key(tag))
            .map(str::to_owned)
    }
}

fn load_layer(identity: &TypeIdentity, path: &Path) -> Option<Layer> {
    match file::load(path, identity) {
        Ok(layer) => Some(layer),
        Err(PresetError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            debug!(%identity, path = %path.display(), "no preset file");
            None
        }
        Err(err) => {
            warn!(%identity, "ignoring preset file: {err}");
            None
        }
    }
}

type Slot = Arc<Mutex<Option<PresetStore>>>;

static GLOBAL: Lazy<Arc<PresetRegistry>> =
    Lazy::new(|| Arc::new(PresetRegistry::new(PresetConfig::from_env())));

/// Lazily built [`PresetStore`]s keyed by type identity.
///
/// Each type has its own lock, held while its store is built and for the
/// whole of every operation on it, so operations on one type never
/// interleave inside a process. Nothing coordinates separate processes: the
/// last one to write the user file wins. Stores are never reloaded once
/// built.
#[derive(Debug)]
pub struct PresetRegistry {
    config: PresetConfig,
    resolver: PathResolver,
    stores: Mutex<HashMap<TypeIdentity, Slot>>,
}

impl PresetRegistry {
    pub fn new(config: PresetConfig) -> Self {
        Self {
            resolver: PathResolver::new(&config),
            config,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Process-wide registry configured from the environment.
    pub fn global() -> Arc<PresetRegistry> {
        Arc::clone(&GLOBAL)
    }

    pub fn config(&self) -> &PresetConfig {
        &self.config
    }

    pub fn paths(&self, identity: &TypeIdentity) -> PresetPaths {
        self.resolver.resolve(identity)
    }

    /// Runs `f` on the store of `identity`, building it on first use.
    pub fn with_store<T>(&self, identity: &TypeIdentity, f: impl FnOnce(&mut PresetStore) -> T) -> T {
        let slot = {
            let mut stores = self.stores.lock();
            Arc::clone(stores.entry(identity.clone()).or_default())
        };
        let mut guard = slot.lock();
        let store = guard.get_or_insert_with(|| {
            PresetStore::open(
                identity.clone(),
                self.resolver.resolve(identity),
                self.config.version.clone(),
            )
        });
        f(store)
    }

    pub fn is_loaded(&self, identity: &TypeIdentity) -> bool {
        let slot = self.stores.lock().get(identity).cloned();
        match slot {
            Some(slot) => {
                let loaded = slot.lock().is_some();
                loaded
            }
            None => false,
        }
    }
}
