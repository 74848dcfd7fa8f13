//! Preset storage for Harmoniq Studio components.
//!
//! Presets of a component type live in two files: a read-only system file
//! shipped with the application and a writable user file. Both are merged
//! into one [`PresetStore`] per type on first use and every change is written
//! back to the user file.
//!
//! ```no_run
//! use harmoniq_presets::{
//!     DefaultPresetHandler, ParameterDefinition, ParameterLayout, ParameterSet, PresetHandler,
//!     PropertyKind,
//! };
//!
//! let mut synth = ParameterSet::new(
//!     "harmoniq.analog",
//!     ParameterLayout::new(vec![ParameterDefinition::new(
//!         "cutoff",
//!         PropertyKind::float(0.0..=1.0),
//!         0.5,
//!     )]),
//! );
//! let presets = DefaultPresetHandler::global();
//! presets.save_preset(&synth, "Init")?;
//! presets.load_preset(&mut synth, "Init")?;
//! # Ok::<(), harmoniq_presets::PresetError>(())
//! ```

mod codec;
mod config;
mod error;
mod file;
mod handler;
mod identity;
pub mod keyfile;
mod merge;
mod parameters;
mod paths;
mod property;
mod store;
mod version;

pub use codec::{Codec, TextCodec};
pub use config::{PresetConfig, DEFAULT_EXTENSION, SYSTEM_DIR_ENV, USER_DIR_ENV};
pub use error::{CodecError, PresetError, PropertyError, Result};
pub use file::Layer;
pub use handler::{DefaultPresetHandler, PresetHandler};
pub use identity::TypeIdentity;
pub use keyfile::{Document, Entry, Group};
pub use merge::Resolved;
pub use parameters::{ParameterDefinition, ParameterLayout, ParameterSet};
pub use paths::{backup_path, PathResolver, PresetPaths};
pub use property::{PropertyKind, PropertyProvider, PropertySpec, PropertyValue};
pub use store::{PresetRegistry, PresetStore};
pub use version::VersionOrdinal;

/// Reads and writes single preset files.
pub mod files {
    pub use crate::file::{load, save};
}

/// Combines the system and user layers of one type.
pub mod layers {
    pub use crate::merge::{overlay, resolve};
}
