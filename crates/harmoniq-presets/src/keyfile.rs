//! Group/key text documents with comments, the on-disk preset format.
//!
//! The format is a compatible subset of the freedesktop key file syntax:
//!
//! ```text
//! # file comment
//!
//! # group comment
//! [Warm Pad]
//! # key comment
//! cutoff=0.35
//! _meta/comment=Soft attack\sand long release
//! ```
//!
//! Comments are kept for the file, for every group and for every key, so a
//! document survives a load/modify/save cycle with its annotations intact.

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::error::PresetError;

/// Reserved group holding the identity and version of a preset file.
pub const HEADER_GROUP: &str = "_presets_";
pub const HEADER_ELEMENT_NAME: &str = "element-name";
pub const HEADER_VERSION: &str = "version";
/// Prefix separating meta data keys from property keys inside a preset.
pub const META_PREFIX: &str = "_meta/";

/// Groups starting with `_` are private and are never reported as presets.
pub fn is_private(group: &str) -> bool {
    group.starts_with('_')
}

const BLANK: [char; 2] = [' ', '\t'];

pub fn meta_key(tag: &str) -> String {
    format!("{META_PREFIX}{tag}")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// An ordered set of keys, the body of one `[group]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Group {
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    entries: IndexMap<String, Entry>,
    /// Comment lines after the last key, or separated from the next key by
    /// a blank line.
    #[serde(skip_serializing_if = "Option::is_none")]
    trailing: Option<String>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }

    pub fn trailing_comment(&self) -> Option<&str> {
        self.trailing.as_deref()
    }

    pub fn set_trailing_comment(&mut self, comment: Option<String>) {
        self.trailing = comment;
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|entry| entry.value.as_str())
    }

    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Sets a value, keeping any comment already attached to the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        self.entries
            .entry(key.into())
            .and_modify(|entry| entry.value.clone_from(&value))
            .or_insert_with(|| Entry {
                value,
                comment: None,
            });
    }

    /// Sets a value together with its comment. A `None` comment leaves an
    /// existing comment in place.
    pub fn set_entry(&mut self, key: impl Into<String>, entry: &Entry) {
        let slot = self.entries.entry(key.into()).or_default();
        slot.value.clone_from(&entry.value);
        if entry.comment.is_some() {
            slot.comment.clone_from(&entry.comment);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered groups plus an optional file comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    groups: IndexMap<String, Group>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document holding nothing but the header for `element_name`.
    pub fn with_header(element_name: &str) -> Self {
        let mut document = Self::new();
        document.set_value(HEADER_GROUP, HEADER_ELEMENT_NAME, element_name);
        document
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut Group> {
        self.groups.get_mut(name)
    }

    pub fn group_or_insert(&mut self, name: &str) -> &mut Group {
        self.groups.entry(name.to_string()).or_default()
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn remove_group(&mut self, name: &str) -> Option<Group> {
        self.groups.shift_remove(name)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &Group)> {
        self.groups.iter().map(|(name, group)| (name.as_str(), group))
    }

    /// Public group names in ascending order.
    pub fn preset_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .groups
            .keys()
            .filter(|name| !is_private(name))
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn preset_count(&self) -> usize {
        self.groups.keys().filter(|name| !is_private(name)).count()
    }

    pub fn value(&self, group: &str, key: &str) -> Option<&str> {
        self.groups.get(group).and_then(|group| group.get(key))
    }

    pub fn set_value(&mut self, group: &str, key: &str, value: impl Into<String>) {
        self.group_or_insert(group).set(key, value);
    }

    /// Returns whether the key existed.
    pub fn remove_value(&mut self, group: &str, key: &str) -> bool {
        self.groups
            .get_mut(group)
            .and_then(|group| group.remove(key))
            .is_some()
    }

    pub fn element_name(&self) -> Option<&str> {
        self.value(HEADER_GROUP, HEADER_ELEMENT_NAME)
    }

    pub fn version(&self) -> Option<&str> {
        self.value(HEADER_GROUP, HEADER_VERSION)
    }

    pub fn set_version(&mut self, version: &str) {
        self.set_value(HEADER_GROUP, HEADER_VERSION, version);
    }

    pub fn parse(text: &str) -> Result<Self, SyntaxError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut document = Document::new();
        let mut file_lines: Vec<String> = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        let mut current: Option<String> = None;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim_matches(BLANK);

            if line.is_empty() {
                // A blank line detaches the comment block above it from
                // whatever follows.
                if !pending.is_empty() {
                    match current.as_deref() {
                        None => {
                            if !file_lines.is_empty() {
                                file_lines.push(String::new());
                            }
                            file_lines.append(&mut pending);
                        }
                        Some(name) => {
                            let group = document.group_or_insert(name);
                            append_block(&mut group.trailing, &mut pending);
                        }
                    }
                }
                continue;
            }

            if let Some(comment) = line.strip_prefix('#') {
                pending.push(comment.to_string());
                continue;
            }

            if line.starts_with('[') {
                let name = line
                    .strip_suffix(']')
                    .map(|inner| &inner[1..])
                    .ok_or_else(|| SyntaxError::new(line_no, "unterminated group header"))?;
                if let Some(problem) = group_name_problem(name) {
                    return Err(SyntaxError::new(
                        line_no,
                        format!("invalid group name `{name}`: {problem}"),
                    ));
                }
                if current.is_none() && !file_lines.is_empty() {
                    document.comment = Some(file_lines.join("\n"));
                    file_lines.clear();
                }
                let group = document.group_or_insert(name);
                if !pending.is_empty() {
                    group.comment = Some(pending.join("\n"));
                    pending.clear();
                }
                current = Some(name.to_string());
                continue;
            }

            let Some(group_name) = current.as_deref() else {
                return Err(SyntaxError::new(line_no, "key/value pair outside of any group"));
            };
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| SyntaxError::new(line_no, "expected `key=value`"))?;
            let key = key.trim_end_matches(BLANK);
            if key.is_empty() {
                return Err(SyntaxError::new(line_no, "empty key"));
            }
            let value = unescape(value.trim_start_matches(BLANK))
                .map_err(|message| SyntaxError::new(line_no, message))?;
            let comment = if pending.is_empty() {
                None
            } else {
                Some(pending.join("\n"))
            };
            pending.clear();
            let group = document.group_or_insert(group_name);
            group.entries.insert(key.to_string(), Entry { value, comment });
        }

        match current.as_deref() {
            None => {
                if !pending.is_empty() {
                    if !file_lines.is_empty() {
                        file_lines.push(String::new());
                    }
                    file_lines.append(&mut pending);
                }
                if !file_lines.is_empty() {
                    document.comment = Some(file_lines.join("\n"));
                }
            }
            Some(name) if !pending.is_empty() => {
                append_block(&mut document.group_or_insert(name).trailing, &mut pending)
            }
            Some(_) => {}
        }
        Ok(document)
    }

    /// Renders the document as text. Fails without side effects when a group
    /// or key name cannot be represented in the format.
    pub fn to_text(&self) -> Result<String, PresetError> {
        let mut out = String::new();
        if let Some(comment) = &self.comment {
            push_comment(&mut out, comment);
            out.push('\n');
        }
        for (index, (name, group)) in self.groups.iter().enumerate() {
            check_group_name(name)?;
            if index > 0 {
                out.push('\n');
            }
            if let Some(comment) = &group.comment {
                push_comment(&mut out, comment);
            }
            out.push('[');
            out.push_str(name);
            out.push_str("]\n");
            for (key, entry) in &group.entries {
                check_key(name, key)?;
                if let Some(comment) = &entry.comment {
                    push_comment(&mut out, comment);
                }
                out.push_str(key);
                out.push('=');
                out.push_str(&escape(&entry.value));
                out.push('\n');
            }
            if let Some(trailing) = &group.trailing {
                push_comment(&mut out, trailing);
            }
        }
        Ok(out)
    }
}

/// Fails with [`PresetError::InvalidDocument`] when `name` cannot be written
/// as a group header.
pub fn check_group_name(name: &str) -> Result<(), PresetError> {
    match group_name_problem(name) {
        Some(problem) => Err(PresetError::InvalidDocument(format!(
            "group name `{}`: {problem}",
            name.escape_debug()
        ))),
        None => Ok(()),
    }
}

pub fn check_key(group: &str, key: &str) -> Result<(), PresetError> {
    match key_problem(key) {
        Some(problem) => Err(PresetError::InvalidDocument(format!(
            "key `{}` in group `{}`: {problem}",
            key.escape_debug(),
            group.escape_debug()
        ))),
        None => Ok(()),
    }
}

/// Appends a detached comment block, keeping earlier blocks apart with an
/// empty line.
fn append_block(slot: &mut Option<String>, lines: &mut Vec<String>) {
    let block = lines.join("\n");
    lines.clear();
    match slot {
        Some(existing) => {
            existing.push_str("\n\n");
            existing.push_str(&block);
        }
        None => *slot = Some(block),
    }
}

fn push_comment(out: &mut String, comment: &str) {
    for line in comment.split('\n') {
        out.push('#');
        out.push_str(line);
        out.push('\n');
    }
}

fn group_name_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("must not be empty")
    } else if name.contains(['[', ']']) {
        Some("must not contain brackets")
    } else if name.chars().any(char::is_control) {
        Some("must not contain control characters")
    } else if name.trim() != name {
        Some("must not start or end with whitespace")
    } else {
        None
    }
}

fn key_problem(key: &str) -> Option<&'static str> {
    if key.is_empty() {
        Some("must not be empty")
    } else if key.contains(['=', '[', ']']) {
        Some("must not contain `=` or brackets")
    } else if key.starts_with('#') {
        Some("must not start with `#`")
    } else if key.chars().any(char::is_control) {
        Some("must not contain control characters")
    } else if key.trim() != key {
        Some("must not start or end with whitespace")
    } else {
        None
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);
    for (index, ch) in value.chars().enumerate() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            ' ' if index == 0 || index == last => out.push_str("\\s"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('s') => out.push(' '),
            Some(other) => return Err(format!("invalid escape sequence `\\{other}`")),
            None => return Err("value ends with a lone backslash".to_string()),
        }
    }
    Ok(out)
}
