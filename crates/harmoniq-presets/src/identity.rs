use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable name of a component type. All instances of one type share one
/// preset file and one in-memory store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeIdentity(String);

impl TypeIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeIdentity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TypeIdentity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for TypeIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
