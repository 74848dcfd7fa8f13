//! In-memory property storage for components that keep their tunable state
//! as a flat parameter list.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::PropertyError;
use crate::identity::TypeIdentity;
use crate::property::{PropertyKind, PropertyProvider, PropertySpec, PropertyValue};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub spec: PropertySpec,
    pub default: PropertyValue,
    pub unit: Option<String>,
    pub description: Option<String>,
}

impl ParameterDefinition {
    pub fn new(name: impl Into<String>, kind: PropertyKind, default: impl Into<PropertyValue>) -> Self {
        Self {
            spec: PropertySpec::new(name, kind),
            default: default.into(),
            unit: None,
            description: None,
        }
    }

    pub fn choice<I, S>(name: impl Into<String>, options: I, default: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kind = PropertyKind::choice(options);
        let default = match &kind {
            PropertyKind::Choice { options } => options.get(default).cloned().unwrap_or_default(),
            _ => String::new(),
        };
        Self {
            spec: PropertySpec::new(name, kind),
            default: PropertyValue::Choice(default),
            unit: None,
            description: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.spec = self.spec.read_only();
        self
    }

    pub fn construct_only(mut self) -> Self {
        self.spec = self.spec.construct_only();
        self
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterLayout {
    parameters: Vec<ParameterDefinition>,
}

impl ParameterLayout {
    pub fn new(parameters: Vec<ParameterDefinition>) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &[ParameterDefinition] {
        &self.parameters
    }

    pub fn find(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters
            .iter()
            .find(|definition| definition.name() == name)
    }
}

/// Current values for a [`ParameterLayout`], validated against each
/// parameter's kind.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    identity: TypeIdentity,
    layout: ParameterLayout,
    values: HashMap<String, PropertyValue>,
}

impl ParameterSet {
    pub fn new(identity: impl Into<TypeIdentity>, layout: ParameterLayout) -> Self {
        let values = layout
            .parameters()
            .iter()
            .map(|definition| (definition.name().to_string(), definition.default.clone()))
            .collect();
        Self {
            identity: identity.into(),
            layout,
            values,
        }
    }

    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<PropertyValue>) -> Result<(), PropertyError> {
        self.set_value(name, value.into())
    }

    /// Replaces a value regardless of writability, as done while a
    /// component is being constructed.
    pub fn initialise(&mut self, name: &str, value: impl Into<PropertyValue>) -> Result<(), PropertyError> {
        let value = value.into();
        let definition = self
            .layout
            .find(name)
            .ok_or_else(|| PropertyError::Unknown(name.to_string()))?;
        validate(name, &definition.spec.kind, &value)?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.layout.parameters().iter().filter_map(|definition| {
            self.values
                .get(definition.name())
                .map(|value| (definition.name(), value))
        })
    }
}

impl PropertyProvider for ParameterSet {
    fn type_identity(&self) -> TypeIdentity {
        self.identity.clone()
    }

    fn list_properties(&self) -> Vec<PropertySpec> {
        self.layout
            .parameters()
            .iter()
            .map(|definition| definition.spec.clone())
            .collect()
    }

    fn get_value(&self, name: &str) -> Option<PropertyValue> {
        let definition = self.layout.find(name)?;
        if !definition.spec.readable {
            return None;
        }
        self.values.get(name).cloned()
    }

    fn set_value(&mut self, name: &str, value: PropertyValue) -> Result<(), PropertyError> {
        let definition = self
            .layout
            .find(name)
            .ok_or_else(|| PropertyError::Unknown(name.to_string()))?;
        if !definition.spec.writable || definition.spec.construct_only {
            return Err(PropertyError::ReadOnly(name.to_string()));
        }
        validate(name, &definition.spec.kind, &value)?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }
}

fn validate(name: &str, kind: &PropertyKind, value: &PropertyValue) -> Result<(), PropertyError> {
    match (kind, value) {
        (PropertyKind::Bool, PropertyValue::Bool(_))
        | (PropertyKind::Text, PropertyValue::Text(_))
        | (PropertyKind::Opaque { .. }, PropertyValue::Opaque(_)) => Ok(()),
        (PropertyKind::Int { min, max }, PropertyValue::Int(v)) => {
            if v < min || v > max {
                Err(PropertyError::OutOfRange {
                    name: name.to_string(),
                    min: *min as f64,
                    max: *max as f64,
                    value: *v as f64,
                })
            } else {
                Ok(())
            }
        }
        (PropertyKind::Float { min, max }, PropertyValue::Float(v)) => {
            if !(min..=max).contains(&v) {
                Err(PropertyError::OutOfRange {
                    name: name.to_string(),
                    min: *min,
                    max: *max,
                    value: *v,
                })
            } else {
                Ok(())
            }
        }
        (PropertyKind::Choice { options }, PropertyValue::Choice(choice)) => {
            if options.contains(choice) {
                Ok(())
            } else {
                Err(PropertyError::InvalidChoice {
                    name: name.to_string(),
                    value: choice.clone(),
                })
            }
        }
        _ => Err(PropertyError::WrongType {
            name: name.to_string(),
            expected: kind.type_name(),
            actual: value.type_name(),
        }),
    }
}
