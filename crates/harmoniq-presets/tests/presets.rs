use std::fs;
use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tempfile::{tempdir, TempDir};

use harmoniq_presets::{
    backup_path, DefaultPresetHandler, Document, ParameterDefinition, ParameterLayout,
    ParameterSet, PresetConfig, PresetError, PresetHandler, PresetRegistry, PropertyError,
    PropertyKind, PropertyProvider, PropertySpec, PropertyValue, TypeIdentity,
};

const TYPE: &str = "harmoniq.westcoast";

fn config(dir: &TempDir, version: &str) -> PresetConfig {
    PresetConfig::default()
        .with_user_root(dir.path().join("home"))
        .with_system_root(dir.path().join("share"))
        .with_version(version)
}

fn handler(dir: &TempDir, version: &str) -> DefaultPresetHandler {
    DefaultPresetHandler::with_registry(Arc::new(PresetRegistry::new(config(dir, version))))
}

fn synth() -> ParameterSet {
    ParameterSet::new(
        TYPE,
        ParameterLayout::new(vec![
            ParameterDefinition::new("fold", PropertyKind::float(0.0..=1.0), 0.0)
                .with_unit("%"),
            ParameterDefinition::new("lpg", PropertyKind::Bool, false),
            ParameterDefinition::choice("shape", ["sine", "triangle"], 0),
            ParameterDefinition::new("patch-name", PropertyKind::Text, "init"),
            ParameterDefinition::new("peak", PropertyKind::float(0.0..=1.0), 0.0).read_only(),
        ]),
    )
}

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

#[test]
fn presets_survive_a_restart() {
    let dir = tempdir().unwrap();
    {
        let presets = handler(&dir, "1.0.0");
        let mut synth = synth();
        synth.set("fold", 0.75).unwrap();
        synth.set("lpg", true).unwrap();
        synth.set("patch-name", " spaced out ").unwrap();
        presets.save_preset(&synth, "Buchla").unwrap();
        presets
            .set_meta(&synth, "Buchla", "comment", Some("folded\nsine"))
            .unwrap();
    }

    let presets = handler(&dir, "1.0.0");
    let mut fresh = synth();
    assert_eq!(presets.preset_names(&fresh), vec!["Buchla"]);
    presets.load_preset(&mut fresh, "Buchla").unwrap();
    assert_eq!(fresh.get("fold"), Some(&PropertyValue::Float(0.75)));
    assert_eq!(fresh.get("lpg"), Some(&PropertyValue::Bool(true)));
    assert_eq!(
        fresh.get("patch-name"),
        Some(&PropertyValue::Text(" spaced out ".into()))
    );
    assert_eq!(
        presets.get_meta(&fresh, "Buchla", "comment").as_deref(),
        Some("folded\nsine")
    );
}

#[test]
fn saving_unchanged_presets_only_touches_the_version() {
    let dir = tempdir().unwrap();
    let synth = synth();
    handler(&dir, "1.0.0").save_preset(&synth, "A").unwrap();
    let path = dir.path().join("home/presets").join(format!("{TYPE}.prs"));
    let first = fs::read_to_string(&path).unwrap();

    handler(&dir, "2.0.0").save_preset(&synth, "A").unwrap();
    let second = fs::read_to_string(&path).unwrap();
    assert_eq!(
        second.replace("version=2.0.0", "version=1.0.0"),
        first,
        "only the version stamp differs"
    );
    assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), first);
}

#[test]
fn newer_system_presets_are_merged_under_user_edits() {
    let dir = tempdir().unwrap();
    let presets = handler(&dir, "1.3");
    let paths = presets.registry().paths(&TypeIdentity::new(TYPE));
    write(
        &paths.system,
        &format!(
            "[_presets_]\nelement-name={TYPE}\nversion=1.2\n\
             [A]\nfold=0.1\nlpg=true\n[Factory]\nfold=0.9\n"
        ),
    );
    write(
        &paths.user,
        &format!("[_presets_]\nelement-name={TYPE}\nversion=1.1\n[A]\nfold=0.5\n"),
    );

    let mut synth = synth();
    assert_eq!(presets.preset_names(&synth), vec!["A", "Factory"]);
    presets.load_preset(&mut synth, "A").unwrap();
    assert_eq!(synth.get("fold"), Some(&PropertyValue::Float(0.5)));
    assert_eq!(synth.get("lpg"), Some(&PropertyValue::Bool(false)));

    let written = Document::parse(&fs::read_to_string(&paths.user).unwrap()).unwrap();
    assert_eq!(written.version(), Some("1.3"));
    assert_eq!(written.value("Factory", "fold"), Some("0.9"));
}

#[test]
fn older_system_presets_are_ignored() {
    let dir = tempdir().unwrap();
    let presets = handler(&dir, "1.3");
    let paths = presets.registry().paths(&TypeIdentity::new(TYPE));
    let user = format!("[_presets_]\nelement-name={TYPE}\nversion=1.2\n[A]\nfold=0.5\n");
    write(
        &paths.system,
        &format!("[_presets_]\nelement-name={TYPE}\nversion=1.1\n[A]\nfold=0.1\n[B]\nfold=0\n"),
    );
    write(&paths.user, &user);

    assert_eq!(presets.preset_names(&synth()), vec!["A"]);
    assert_eq!(fs::read_to_string(&paths.user).unwrap(), user);
    assert!(!backup_path(&paths.user).exists());
}

#[test]
fn private_groups_are_kept_but_never_listed() {
    let dir = tempdir().unwrap();
    let presets = handler(&dir, "1.0");
    let paths = presets.registry().paths(&TypeIdentity::new(TYPE));
    write(
        &paths.user,
        &format!("[_presets_]\nelement-name={TYPE}\nversion=1.0\n[_ui]\nzoom=2\n[Lead]\nfold=1\n"),
    );

    let synth = synth();
    assert_eq!(presets.preset_names(&synth), vec!["Lead"]);
    presets.save_preset(&synth, "Pad").unwrap();
    let written = Document::parse(&fs::read_to_string(&paths.user).unwrap()).unwrap();
    assert_eq!(written.value("_ui", "zoom"), Some("2"));
}

#[test]
fn broken_files_count_as_missing() {
    let dir = tempdir().unwrap();
    let presets = handler(&dir, "1.0");
    let paths = presets.registry().paths(&TypeIdentity::new(TYPE));
    write(&paths.user, "this is not a preset file\n");
    write(
        &paths.system,
        &format!("[_presets_]\nelement-name={TYPE}\nversion=0.5\n[Init]\nfold=0\n"),
    );

    assert_eq!(presets.preset_names(&synth()), vec!["Init"]);
    assert_eq!(
        fs::read_to_string(&paths.user).unwrap(),
        "this is not a preset file\n"
    );
}

#[test]
fn rename_and_delete_follow_each_other() {
    let dir = tempdir().unwrap();
    let presets = handler(&dir, "1.0");
    let mut synth = synth();
    synth.set("fold", 0.6).unwrap();
    synth.set("lpg", true).unwrap();
    synth
        .set_value("shape", PropertyValue::Choice("triangle".into()))
        .unwrap();
    presets.save_preset(&synth, "Old").unwrap();

    presets.rename_preset(&synth, "Old", "New").unwrap();
    assert_eq!(presets.preset_names(&synth), vec!["New"]);
    assert!(matches!(
        presets.delete_preset(&synth, "Old"),
        Err(PresetError::NotFound(_))
    ));
    let mut target = self::synth();
    assert!(matches!(
        presets.load_preset(&mut target, "Old"),
        Err(PresetError::NotFound(_))
    ));
    presets.load_preset(&mut target, "New").unwrap();
    let loaded: Vec<_> = target.iter().collect();
    let saved: Vec<_> = synth.iter().collect();
    assert_eq!(loaded, saved);
    assert!(matches!(
        presets.rename_preset(&synth, "Old", "Other"),
        Err(PresetError::NotFound(_))
    ));

    presets.delete_preset(&synth, "New").unwrap();
    assert!(presets.preset_names(&synth).is_empty());
    let path = presets.registry().paths(&TypeIdentity::new(TYPE)).user;
    assert!(!path.exists());
    assert!(backup_path(&path).exists());
}

#[test]
fn unwritable_preset_name_does_not_block_later_saves() {
    let dir = tempdir().unwrap();
    let presets = handler(&dir, "1.0");
    let synth = synth();
    assert!(matches!(
        presets.save_preset(&synth, "Lead [v2]"),
        Err(PresetError::InvalidDocument(_))
    ));
    assert!(presets.preset_names(&synth).is_empty());

    presets.save_preset(&synth, "Lead v2").unwrap();
    assert_eq!(presets.preset_names(&synth), vec!["Lead v2"]);
    assert!(presets
        .registry()
        .paths(&TypeIdentity::new(TYPE))
        .user
        .exists());
}

#[test]
fn empty_meta_value_removes_the_tag() {
    let dir = tempdir().unwrap();
    let presets = handler(&dir, "1.0");
    let synth = synth();
    presets.save_preset(&synth, "A").unwrap();
    presets.set_meta(&synth, "A", "author", Some("rosa")).unwrap();
    presets.set_meta(&synth, "A", "author", Some("")).unwrap();
    assert_eq!(presets.get_meta(&synth, "A", "author"), None);
}

/// Component that exposes only a subset of its properties to presets.
struct Sequencer {
    steps: i64,
    swing: f64,
    running: bool,
}

impl PropertyProvider for Sequencer {
    fn type_identity(&self) -> TypeIdentity {
        TypeIdentity::new("harmoniq.sequencer")
    }

    fn list_properties(&self) -> Vec<PropertySpec> {
        vec![
            PropertySpec::new("steps", PropertyKind::Int { min: 1, max: 64 }),
            PropertySpec::new("swing", PropertyKind::float(0.0..=1.0)),
            PropertySpec::new("running", PropertyKind::Bool),
        ]
    }

    fn get_value(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "steps" => Some(PropertyValue::Int(self.steps)),
            "swing" => Some(PropertyValue::Float(self.swing)),
            "running" => Some(PropertyValue::Bool(self.running)),
            _ => None,
        }
    }

    fn set_value(&mut self, name: &str, value: PropertyValue) -> Result<(), PropertyError> {
        match (name, value) {
            ("steps", PropertyValue::Int(steps)) => self.steps = steps,
            ("swing", PropertyValue::Float(swing)) => self.swing = swing,
            ("running", PropertyValue::Bool(running)) => self.running = running,
            (name, _) => return Err(PropertyError::Unknown(name.to_string())),
        }
        Ok(())
    }

    fn preset_property_names(&self) -> Vec<String> {
        vec!["steps".into(), "swing".into()]
    }
}

#[test]
fn components_choose_which_properties_are_stored() {
    let dir = tempdir().unwrap();
    let presets = handler(&dir, "1.0");
    let sequencer = Sequencer {
        steps: 12,
        swing: 0.25,
        running: true,
    };
    presets.save_preset(&sequencer, "Shuffle").unwrap();

    let mut other = Sequencer {
        steps: 16,
        swing: 0.0,
        running: false,
    };
    presets.load_preset(&mut other, "Shuffle").unwrap();
    assert_eq!((other.steps, other.swing, other.running), (12, 0.25, false));

    let stored = presets
        .registry()
        .with_store(&other.type_identity(), |store| store.preset("Shuffle").cloned())
        .unwrap();
    assert!(!stored.contains_key("running"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn saved_values_load_back(fold in 0.0f64..=1.0, lpg in any::<bool>(), name in "[ -~]{0,24}") {
        let dir = tempdir().unwrap();
        let presets = handler(&dir, "1.0");
        let mut source = synth();
        source.set("fold", fold).unwrap();
        source.set("lpg", lpg).unwrap();
        source.set("patch-name", name.as_str()).unwrap();
        presets.save_preset(&source, "P").unwrap();

        let mut target = synth();
        handler(&dir, "1.0").load_preset(&mut target, "P").unwrap();
        prop_assert_eq!(target.get("fold"), Some(&PropertyValue::Float(fold)));
        prop_assert_eq!(target.get("lpg"), Some(&PropertyValue::Bool(lpg)));
        prop_assert_eq!(target.get("patch-name"), Some(&PropertyValue::Text(name)));
    }
}
