//! Reconciliation of the shipped and the user preset layers.

use tracing::debug;

use crate::file::Layer;
use crate::identity::TypeIdentity;
use crate::keyfile::{is_private, Document};
use crate::version::VersionOrdinal;

/// Result of combining both layers of one component type.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub document: Document,
    /// Set when the user layer was rebased onto a newer system layer; the
    /// result has to be written back so the merge is not repeated.
    pub needs_resave: bool,
}

pub fn resolve(identity: &TypeIdentity, system: Option<Layer>, user: Option<Layer>) -> Resolved {
    match (system, user) {
        (None, None) => Resolved {
            document: Document::with_header(identity.as_str()),
            needs_resave: false,
        },
        (Some(layer), None) | (None, Some(layer)) => Resolved {
            document: layer.document,
            needs_resave: false,
        },
        (Some(system), Some(user)) => {
            let system_version = VersionOrdinal::parse_opt(system.version.as_deref());
            let user_version = VersionOrdinal::parse_opt(user.version.as_deref());
            if system_version > user_version {
                debug!(
                    %identity,
                    %system_version,
                    %user_version,
                    "system presets are newer, rebasing user presets"
                );
                let mut document = system.document;
                overlay(&mut document, &user.document);
                Resolved {
                    document,
                    needs_resave: true,
                }
            } else {
                debug!(%identity, %system_version, %user_version, "keeping user presets");
                Resolved {
                    document: user.document,
                    needs_resave: false,
                }
            }
        }
    }
}

/// Copies every public group of `overlay` into `target`, replacing groups of
/// the same name as a whole. The overlay's file comment wins when present.
pub fn overlay(target: &mut Document, overlay: &Document) {
    if let Some(comment) = overlay.comment() {
        target.set_comment(Some(comment.to_string()));
    }
    for (name, group) in overlay.groups() {
        if is_private(name) {
            continue;
        }
        target.remove_group(name);
        let copy = target.group_or_insert(name);
        if let Some(comment) = group.comment() {
            copy.set_comment(Some(comment.to_string()));
        }
        copy.set_trailing_comment(group.trailing_comment().map(str::to_owned));
        for (key, entry) in group.iter() {
            copy.set_entry(key, entry);
        }
    }
}
