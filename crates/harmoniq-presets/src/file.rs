//! Reading and writing single preset layers.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{PresetError, Result};
use crate::identity::TypeIdentity;
use crate::keyfile::{Document, HEADER_GROUP, HEADER_VERSION};
use crate::paths::backup_path;

/// A document read from disk together with the version found in its header.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub document: Document,
    pub version: Option<String>,
}

/// Reads the preset file at `path` and checks that it belongs to `identity`.
pub fn load(path: &Path, identity: &TypeIdentity) -> Result<Layer> {
    let bytes = fs::read(path).map_err(|err| PresetError::io(path, err))?;
    let text = String::from_utf8(bytes).map_err(|err| {
        let valid = &err.as_bytes()[..err.utf8_error().valid_up_to()];
        PresetError::Parse {
            path: path.to_path_buf(),
            line: valid.iter().filter(|byte| **byte == b'\n').count() + 1,
            message: "file is not valid UTF-8".to_string(),
        }
    })?;
    let document = Document::parse(&text).map_err(|err| PresetError::Parse {
        path: path.to_path_buf(),
        line: err.line,
        message: err.message,
    })?;

    match document.element_name() {
        Some(name) if name == identity.as_str() => {}
        found => {
            return Err(PresetError::NameMismatch {
                path: path.to_path_buf(),
                expected: identity.to_string(),
                found: found.map(str::to_owned),
            })
        }
    }

    let version = document.version().map(str::to_owned);
    debug!(path = %path.display(), version = ?version, "loaded preset file");
    Ok(Layer { document, version })
}

/// Writes `document` to `path`, keeping the previous file as `<path>.bak`.
///
/// The header is stamped with `version` first. Rendering happens before
/// anything on disk is touched, so a document that cannot be rendered leaves
/// both the file and the in-memory document as they were. A document without
/// presets leaves no file behind.
pub fn save(path: &Path, document: &mut Document, version: &str) -> Result<()> {
    if document.preset_count() == 0 {
        debug!(path = %path.display(), "no presets left, removing preset file");
        rotate_backup(path);
        return match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                warn!(path = %path.display(), "unable to remove preset file: {err}");
                Ok(())
            }
        };
    }

    let previous = document.version().map(str::to_owned);
    document.set_version(version);
    let text = match document.to_text() {
        Ok(text) => text,
        Err(err) => {
            match previous {
                Some(previous) => document.set_version(&previous),
                None => {
                    document.remove_value(HEADER_GROUP, HEADER_VERSION);
                }
            }
            warn!(path = %path.display(), "unable to render preset file: {err}");
            return Err(err);
        }
    };

    rotate_backup(path);
    write_atomic(path, text.as_bytes()).map_err(|err| {
        warn!(path = %path.display(), "unable to store preset file: {err}");
        PresetError::io(path, err)
    })?;
    info!(path = %path.display(), "saved preset file");
    Ok(())
}

/// Moves an existing file aside as `<path>.bak`. Failures only cost the
/// backup and never stop the save.
fn rotate_backup(path: &Path) {
    if !path.exists() {
        return;
    }
    let backup = backup_path(path);
    if backup.exists() {
        if let Err(err) = fs::remove_file(&backup) {
            warn!(backup = %backup.display(), "cannot remove old backup file: {err}");
            return;
        }
    }
    if let Err(err) = fs::rename(path, &backup) {
        warn!(
            path = %path.display(),
            backup = %backup.display(),
            "cannot back up preset file: {err}"
        );
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}
