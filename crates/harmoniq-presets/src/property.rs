//! Boundary between the preset engine and the components it configures.

use serde::{Deserialize, Serialize};

use crate::error::PropertyError;
use crate::identity::TypeIdentity;

/// Value type of a property, used to decode stored text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyKind {
    Bool,
    Int { min: i64, max: i64 },
    Float { min: f64, max: f64 },
    Text,
    Choice { options: Vec<String> },
    /// A value without a text form, e.g. a handle to another object.
    Opaque { type_name: String },
}

impl PropertyKind {
    pub fn int() -> Self {
        PropertyKind::Int {
            min: i64::MIN,
            max: i64::MAX,
        }
    }

    pub fn float(range: std::ops::RangeInclusive<f64>) -> Self {
        PropertyKind::Float {
            min: *range.start(),
            max: *range.end(),
        }
    }

    pub fn choice<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PropertyKind::Choice {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyKind::Bool => "bool",
            PropertyKind::Int { .. } => "int",
            PropertyKind::Float { .. } => "float",
            PropertyKind::Text => "text",
            PropertyKind::Choice { .. } => "choice",
            PropertyKind::Opaque { .. } => "opaque",
        }
    }
}

/// Runtime value of a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Choice(String),
    Opaque(String),
}

impl PropertyValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Text(_) => "text",
            PropertyValue::Choice(_) => "choice",
            PropertyValue::Opaque(_) => "opaque",
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

/// Description of one settable property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    pub kind: PropertyKind,
    pub readable: bool,
    pub writable: bool,
    pub construct_only: bool,
}

impl PropertySpec {
    /// A readable and writable property.
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            readable: true,
            writable: true,
            construct_only: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }

    pub fn construct_only(mut self) -> Self {
        self.construct_only = true;
        self
    }

    /// Whether presets store this property: it must be readable, writable and
    /// settable after construction.
    pub fn is_presettable(&self) -> bool {
        self.readable && self.writable && !self.construct_only
    }
}

/// A component instance whose properties can be captured into presets.
pub trait PropertyProvider {
    /// Type the instance belongs to; all instances of a type share presets.
    fn type_identity(&self) -> TypeIdentity;

    /// Properties in declaration order.
    fn list_properties(&self) -> Vec<PropertySpec>;

    fn get_value(&self, name: &str) -> Option<PropertyValue>;

    fn set_value(&mut self, name: &str, value: PropertyValue) -> Result<(), PropertyError>;

    /// Names of the properties stored in presets, in the order they are
    /// saved and applied. Override to restrict or reorder the set.
    fn preset_property_names(&self) -> Vec<String> {
        self.list_properties()
            .into_iter()
            .filter(PropertySpec::is_presettable)
            .map(|spec| spec.name)
            .collect()
    }

    fn find_property(&self, name: &str) -> Option<PropertySpec> {
        self.list_properties()
            .into_iter()
            .find(|spec| spec.name == name)
    }
}
