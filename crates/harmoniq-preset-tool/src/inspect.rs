use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use harmoniq_presets::keyfile::META_PREFIX;
use harmoniq_presets::{PresetError, PresetRegistry, Result, TypeIdentity};

/// Presets available for one component type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresetListing {
    pub identity: TypeIdentity,
    pub user_file: PathBuf,
    pub system_file: PathBuf,
    pub presets: Vec<String>,
}

impl fmt::Display for PresetListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} presets)", self.identity, self.presets.len())?;
        writeln!(f, "  user:   {}", self.user_file.display())?;
        writeln!(f, "  system: {}", self.system_file.display())?;
        for name in &self.presets {
            writeln!(f, "  - {name}")?;
        }
        Ok(())
    }
}

/// Stored values of a single preset, with meta tags split off.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresetView {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub values: IndexMap<String, String>,
    pub meta: IndexMap<String, String>,
}

impl fmt::Display for PresetView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.name)?;
        if let Some(comment) = &self.comment {
            for line in comment.lines() {
                writeln!(f, "#{line}")?;
            }
        }
        for (key, value) in &self.values {
            writeln!(f, "{key} = {value}")?;
        }
        for (tag, value) in &self.meta {
            writeln!(f, "@{tag} = {value}")?;
        }
        Ok(())
    }
}

pub fn list(registry: &PresetRegistry, identity: &TypeIdentity) -> PresetListing {
    let paths = registry.paths(identity);
    PresetListing {
        identity: identity.clone(),
        user_file: paths.user,
        system_file: paths.system,
        presets: registry.with_store(identity, |store| store.preset_names()),
    }
}

pub fn show(registry: &PresetRegistry, identity: &TypeIdentity, name: &str) -> Result<PresetView> {
    registry.with_store(identity, |store| {
        let group = store
            .preset(name)
            .ok_or_else(|| PresetError::NotFound(name.to_string()))?;
        let mut values = IndexMap::new();
        let mut meta = IndexMap::new();
        for (key, entry) in group.iter() {
            match key.strip_prefix(META_PREFIX) {
                Some(tag) => meta.insert(tag.to_string(), entry.value.clone()),
                None => values.insert(key.to_string(), entry.value.clone()),
            };
        }
        Ok(PresetView {
            name: name.to_string(),
            comment: group.comment().map(str::to_owned),
            values,
            meta,
        })
    })
}

pub fn rename(registry: &PresetRegistry, identity: &TypeIdentity, old: &str, new: &str) -> Result<()> {
    registry.with_store(identity, |store| store.rename_preset(old, new))?;
    info!(%identity, "renamed preset '{old}' to '{new}'");
    Ok(())
}

pub fn delete(registry: &PresetRegistry, identity: &TypeIdentity, name: &str) -> Result<()> {
    registry.with_store(identity, |store| store.delete_preset(name))?;
    info!(%identity, "deleted preset '{name}'");
    Ok(())
}

pub fn get_meta(registry: &PresetRegistry, identity: &TypeIdentity, name: &str, tag: &str) -> Option<String> {
    registry.with_store(identity, |store| store.get_meta(name, tag))
}

pub fn set_meta(
    registry: &PresetRegistry,
    identity: &TypeIdentity,
    name: &str,
    tag: &str,
    value: Option<&str>,
) -> Result<()> {
    registry.with_store(identity, |store| store.set_meta(name, tag, value))
}
