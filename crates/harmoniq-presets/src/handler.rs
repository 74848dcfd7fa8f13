//! Preset operations on component instances.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::codec::{Codec, TextCodec};
use crate::error::{PresetError, Result};
use crate::property::PropertyProvider;
use crate::store::PresetRegistry;

/// Preset capability of a component.
///
/// [`DefaultPresetHandler`] stores presets in the two-layer preset files and
/// serves most components. Components wrapping a foreign plugin format can
/// provide their own implementation to expose the native presets of that
/// format instead; whoever owns the component picks the handler.
pub trait PresetHandler {
    /// Sorted names of all presets of the component's type.
    fn preset_names(&self, component: &dyn PropertyProvider) -> Vec<String>;

    /// Properties captured by presets, in the order they are applied.
    fn property_names(&self, component: &dyn PropertyProvider) -> Vec<String> {
        component.preset_property_names()
    }

    /// Applies preset `name` to `component`. Values that are missing or
    /// cannot be applied are skipped.
    fn load_preset(&self, component: &mut dyn PropertyProvider, name: &str) -> Result<()>;

    /// Stores the current property values of `component` as preset `name`,
    /// replacing stored values key by key.
    fn save_preset(&self, component: &dyn PropertyProvider, name: &str) -> Result<()>;

    /// Renames a preset; an existing preset called `new` is overwritten key
    /// by key.
    fn rename_preset(&self, component: &dyn PropertyProvider, old: &str, new: &str) -> Result<()>;

    fn delete_preset(&self, component: &dyn PropertyProvider, name: &str) -> Result<()>;

    /// Sets meta data such as `"comment"` or `"author"` on a preset. `None`
    /// or an empty value removes the tag.
    fn set_meta(
        &self,
        component: &dyn PropertyProvider,
        name: &str,
        tag: &str,
        value: Option<&str>,
    ) -> Result<()>;

    fn get_meta(&self, component: &dyn PropertyProvider, name: &str, tag: &str) -> Option<String>;
}

/// Preset handler backed by a [`PresetRegistry`] and a [`Codec`].
#[derive(Clone)]
pub struct DefaultPresetHandler {
    registry: Arc<PresetRegistry>,
    codec: Arc<dyn Codec>,
}

impl DefaultPresetHandler {
    pub fn new(registry: Arc<PresetRegistry>, codec: Arc<dyn Codec>) -> Self {
        Self { registry, codec }
    }

    /// Handler over the process-wide registry with the text codec.
    pub fn global() -> Self {
        Self::new(PresetRegistry::global(), Arc::new(TextCodec))
    }

    pub fn with_registry(registry: Arc<PresetRegistry>) -> Self {
        Self::new(registry, Arc::new(TextCodec))
    }

    pub fn registry(&self) -> &Arc<PresetRegistry> {
        &self.registry
    }
}

impl std::fmt::Debug for DefaultPresetHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultPresetHandler")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl PresetHandler for DefaultPresetHandler {
    fn preset_names(&self, component: &dyn PropertyProvider) -> Vec<String> {
        self.registry
            .with_store(&component.type_identity(), |store| store.preset_names())
    }

    fn load_preset(&self, component: &mut dyn PropertyProvider, name: &str) -> Result<()> {
        let identity = component.type_identity();
        let stored = self.registry.with_store(&identity, |store| {
            store.preset(name).cloned().ok_or_else(|| {
                warn!(%identity, "no preset named '{name}'");
                PresetError::NotFound(name.to_string())
            })
        })?;

        debug!(%identity, "loading preset '{name}'");
        for property in self.property_names(component) {
            let Some(text) = stored.get(&property) else {
                warn!(%identity, "parameter '{property}' not in preset '{name}'");
                continue;
            };
            let Some(spec) = component.find_property(&property) else {
                warn!(%identity, "property '{property}' not in component");
                continue;
            };
            let value = match self.codec.decode(text, &spec.kind) {
                Ok(value) => value,
                Err(err) => {
                    warn!(%identity, "cannot read '{property}' from preset '{name}': {err}");
                    continue;
                }
            };
            debug!(%identity, "setting '{property}' to '{text}'");
            if let Err(err) = component.set_value(&property, value) {
                warn!(%identity, "cannot apply '{property}' from preset '{name}': {err}");
            }
        }
        Ok(())
    }

    fn save_preset(&self, component: &dyn PropertyProvider, name: &str) -> Result<()> {
        let identity = component.type_identity();
        info!(%identity, "saving preset '{name}'");

        let mut values = Vec::new();
        for property in self.property_names(component) {
            let Some(value) = component.get_value(&property) else {
                warn!(%identity, "property '{property}' not in component");
                continue;
            };
            match self.codec.encode(&value) {
                Ok(text) => values.push((property, text)),
                Err(err) => warn!(%identity, "cannot store '{property}': {err}"),
            }
        }
        self.registry
            .with_store(&identity, |store| store.store_values(name, values))
    }

    fn rename_preset(&self, component: &dyn PropertyProvider, old: &str, new: &str) -> Result<()> {
        self.registry
            .with_store(&component.type_identity(), |store| store.rename_preset(old, new))
    }

    fn delete_preset(&self, component: &dyn PropertyProvider, name: &str) -> Result<()> {
        self.registry
            .with_store(&component.type_identity(), |store| store.delete_preset(name))
    }

    fn set_meta(
        &self,
        component: &dyn PropertyProvider,
        name: &str,
        tag: &str,
        value: Option<&str>,
    ) -> Result<()> {
        self.registry.with_store(&component.type_identity(), |store| {
            store.set_meta(name, tag, value)
        })
    }

    fn get_meta(&self, component: &dyn PropertyProvider, name: &str, tag: &str) -> Option<String> {
        self.registry
            .with_store(&component.type_identity(), |store| store.get_meta(name, tag))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::{tempdir, TempDir};

    use super::*;
    use crate::config::PresetConfig;
    use crate::parameters::{ParameterDefinition, ParameterLayout, ParameterSet};
    use crate::error::PropertyError;
    use crate::identity::TypeIdentity;
    use crate::property::{PropertyKind, PropertySpec, PropertyValue};

    fn handler(dir: &TempDir) -> DefaultPresetHandler {
        DefaultPresetHandler::with_registry(Arc::new(PresetRegistry::new(
            PresetConfig::default()
                .with_user_root(dir.path().join("user"))
                .with_system_root(dir.path().join("system"))
                .with_version("1.0.0"),
        )))
    }

    fn synth() -> ParameterSet {
        ParameterSet::new(
            "harmoniq.analog",
            ParameterLayout::new(vec![
                ParameterDefinition::new("cutoff", PropertyKind::float(0.0..=1.0), 0.5),
                ParameterDefinition::choice("waveform", ["saw", "square", "sine"], 0),
                ParameterDefinition::new("voices", PropertyKind::Int { min: 1, max: 16 }, 8i64)
                    .construct_only(),
                ParameterDefinition::new("name", PropertyKind::Text, "init"),
            ]),
        )
    }

    #[test]
    fn save_then_load_restores_values() {
        let dir = tempdir().unwrap();
        let handler = handler(&dir);
        let mut synth = synth();
        synth.set("cutoff", 0.35).unwrap();
        synth.set_value("waveform", PropertyValue::Choice("sine".into())).unwrap();
        handler.save_preset(&synth, "Bright").unwrap();

        let mut other = self::synth();
        handler.load_preset(&mut other, "Bright").unwrap();
        assert_eq!(other.get("cutoff"), Some(&PropertyValue::Float(0.35)));
        assert_eq!(other.get("waveform"), Some(&PropertyValue::Choice("sine".into())));
        assert_eq!(handler.preset_names(&other), vec!["Bright"]);

        let stored = handler
            .registry()
            .with_store(&synth.type_identity(), |store| store.preset("Bright").cloned())
            .unwrap();
        assert_eq!(stored.get("voices"), None);
        assert_eq!(stored.get("cutoff"), Some("0.35"));
    }

    #[test]
    fn loading_a_missing_preset_fails() {
        let dir = tempdir().unwrap();
        let handler = handler(&dir);
        let mut synth = synth();
        assert!(matches!(
            handler.load_preset(&mut synth, "Nope"),
            Err(PresetError::NotFound(name)) if name == "Nope"
        ));
    }

    #[test]
    fn unusable_values_are_skipped() {
        let dir = tempdir().unwrap();
        let handler = handler(&dir);
        let synth = synth();
        let paths = handler.registry().paths(&synth.type_identity());
        fs::write(
            &paths.user,
            "[_presets_]\nelement-name=harmoniq.analog\nversion=1.0.0\n\
             [Broken]\ncutoff=7\nwaveform=square\nname=lead\n",
        )
        .unwrap();

        let mut synth = synth;
        handler.load_preset(&mut synth, "Broken").unwrap();
        assert_eq!(synth.get("cutoff"), Some(&PropertyValue::Float(0.5)));
        assert_eq!(synth.get("waveform"), Some(&PropertyValue::Choice("square".into())));
        assert_eq!(synth.get("name"), Some(&PropertyValue::Text("lead".into())));
    }

    /// Lists a property in its presets that it does not declare.
    struct Mislabelled(ParameterSet);

    impl PropertyProvider for Mislabelled {
        fn type_identity(&self) -> TypeIdentity {
            self.0.type_identity()
        }

        fn list_properties(&self) -> Vec<PropertySpec> {
            self.0.list_properties()
        }

        fn get_value(&self, name: &str) -> Option<PropertyValue> {
            self.0.get_value(name)
        }

        fn set_value(
            &mut self,
            name: &str,
            value: PropertyValue,
        ) -> std::result::Result<(), PropertyError> {
            self.0.set_value(name, value)
        }

        fn preset_property_names(&self) -> Vec<String> {
            vec!["ghost".into(), "cutoff".into()]
        }
    }

    #[test]
    fn undeclared_properties_are_skipped_on_load() {
        let dir = tempdir().unwrap();
        let handler = handler(&dir);
        let paths = handler.registry().paths(&synth().type_identity());
        fs::write(
            &paths.user,
            "[_presets_]\nelement-name=harmoniq.analog\n[Odd]\nghost=1\ncutoff=0.1\n",
        )
        .unwrap();

        let mut component = Mislabelled(synth());
        assert!(component.find_property("ghost").is_none());
        handler.load_preset(&mut component, "Odd").unwrap();
        assert_eq!(component.0.get("cutoff"), Some(&PropertyValue::Float(0.1)));
    }

    #[test]
    fn saving_without_properties_still_creates_the_preset() {
        let dir = tempdir().unwrap();
        let handler = handler(&dir);
        let empty = ParameterSet::new("harmoniq.empty", ParameterLayout::default());
        assert!(handler.property_names(&empty).is_empty());
        handler.save_preset(&empty, "Blank").unwrap();
        assert_eq!(handler.preset_names(&empty), vec!["Blank"]);
    }

    #[test]
    fn rename_delete_and_meta_go_through_the_store() {
        let dir = tempdir().unwrap();
        let handler = handler(&dir);
        let synth = synth();
        handler.save_preset(&synth, "A").unwrap();
        handler.set_meta(&synth, "A", "author", Some("kim")).unwrap();

        handler.rename_preset(&synth, "A", "B").unwrap();
        assert_eq!(handler.preset_names(&synth), vec!["B"]);
        assert_eq!(handler.get_meta(&synth, "B", "author").as_deref(), Some("kim"));

        handler.set_meta(&synth, "B", "author", None).unwrap();
        assert_eq!(handler.get_meta(&synth, "B", "author"), None);

        handler.delete_preset(&synth, "B").unwrap();
        assert!(handler.preset_names(&synth).is_empty());
        assert!(matches!(
            handler.delete_preset(&synth, "B"),
            Err(PresetError::NotFound(_))
        ));
    }
}
