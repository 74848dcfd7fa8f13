use crate::error::CodecError;
use crate::property::{PropertyKind, PropertyValue};

/// Converts single property values to and from the text stored in presets.
pub trait Codec: Send + Sync {
    fn encode(&self, value: &PropertyValue) -> Result<String, CodecError>;
    fn decode(&self, text: &str, expected: &PropertyKind) -> Result<PropertyValue, CodecError>;
}

/// Plain text representation used by the default preset handler.
///
/// Floats use the shortest form that reads back to the same value, choices
/// are stored by option name.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl Codec for TextCodec {
    fn encode(&self, value: &PropertyValue) -> Result<String, CodecError> {
        match value {
            PropertyValue::Bool(value) => Ok(value.to_string()),
            PropertyValue::Int(value) => Ok(value.to_string()),
            PropertyValue::Float(value) => Ok(value.to_string()),
            PropertyValue::Text(value) | PropertyValue::Choice(value) => Ok(value.clone()),
            PropertyValue::Opaque(type_name) => Err(CodecError::Unencodable {
                kind: type_name.clone(),
            }),
        }
    }

    fn decode(&self, text: &str, expected: &PropertyKind) -> Result<PropertyValue, CodecError> {
        let invalid = || CodecError::Invalid {
            text: text.to_string(),
            expected: expected.type_name().to_string(),
        };
        match expected {
            PropertyKind::Bool => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(PropertyValue::Bool(true)),
                "false" | "no" | "off" | "0" => Ok(PropertyValue::Bool(false)),
                _ => Err(invalid()),
            },
            PropertyKind::Int { .. } => text
                .trim()
                .parse()
                .map(PropertyValue::Int)
                .map_err(|_| invalid()),
            PropertyKind::Float { .. } => text
                .trim()
                .parse()
                .map(PropertyValue::Float)
                .map_err(|_| invalid()),
            PropertyKind::Text => Ok(PropertyValue::Text(text.to_string())),
            PropertyKind::Choice { options } => {
                if let Some(option) = options.iter().find(|option| option.as_str() == text) {
                    return Ok(PropertyValue::Choice(option.clone()));
                }
                text.trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| options.get(index))
                    .map(|option| PropertyValue::Choice(option.clone()))
                    .ok_or_else(invalid)
            }
            PropertyKind::Opaque { type_name } => Err(CodecError::Unencodable {
                kind: type_name.clone(),
            }),
        }
    }
}
