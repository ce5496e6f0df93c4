//! Contract interface descriptions.
//!
//! An interface description is the machine-readable side of a compiled
//! contract artifact: the actions it accepts with their field layouts,
//! and the tables it maintains. The harness uses it to validate
//! structured payloads and encode them into the canonical byte form the
//! execution engine receives.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    crypto::{PublicKey, Signature},
    name::Name,
};

/// Errors raised while parsing an interface description or resolving a
/// structured payload against it.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum InterfaceError {
    /// The description bytes were not a valid JSON document of the
    /// expected shape.
    #[error("invalid interface description: {0}")]
    Parse(String),
    /// Two actions with the same name were declared.
    #[error("duplicate action declaration: {0}")]
    DuplicateAction(Name),
    /// Two tables with the same name were declared.
    #[error("duplicate table declaration: {0}")]
    DuplicateTable(Name),
    /// The action is not declared by the interface.
    #[error("unknown action: {0}")]
    UnknownAction(Name),
    /// Structured payloads must be JSON objects.
    #[error("structured payload must be a JSON object")]
    ExpectedObject,
    /// The payload did not deserialize into the expected record.
    #[error("malformed payload: {0}")]
    Payload(String),
    /// A declared field was absent from the payload.
    #[error("missing field: {0}")]
    MissingField(String),
    /// The payload carried a field the declaration does not know.
    #[error("unexpected field: {0}")]
    UnexpectedField(String),
    /// A field value had the wrong JSON type.
    #[error("field {field}: expected {expected}")]
    TypeMismatch {
        /// The offending field.
        field: String,
        /// The expected type.
        expected: &'static str,
    },
    /// A field value was well-typed but invalid (range, hex, key
    /// format).
    #[error("field {field}: {message}")]
    InvalidValue {
        /// The offending field.
        field: String,
        /// Failure detail.
        message: String,
    },
}

/// The type of a declared action field.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Boolean, encoded as a single byte.
    Bool,
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer, little endian.
    U16,
    /// Unsigned 32-bit integer, little endian.
    U32,
    /// Unsigned 64-bit integer, little endian.
    U64,
    /// Signed 64-bit integer, little endian.
    I64,
    /// Length-prefixed UTF-8 string.
    String,
    /// Length-prefixed bytes, hex-encoded in JSON.
    Bytes,
    /// A chain identifier, encoded as a length-prefixed string.
    Name,
    /// An algorithm-tagged public key.
    PublicKey,
    /// An algorithm-tagged signature.
    Signature,
}

impl FieldType {
    fn expected(&self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::U8 => "u8",
            FieldType::U16 => "u16",
            FieldType::U32 => "u32",
            FieldType::U64 => "u64",
            FieldType::I64 => "i64",
            FieldType::String => "string",
            FieldType::Bytes => "hex string",
            FieldType::Name => "name string",
            FieldType::PublicKey => "public key string",
            FieldType::Signature => "signature string",
        }
    }
}

/// A declared field of an action.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Field name.
    pub name: String,
    /// Field type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

/// A declared action and its field layout.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct ActionDecl {
    /// Action name.
    pub name: Name,
    /// Declared fields, in encoding order.
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

/// A declared table.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct TableDecl {
    /// Table name.
    pub name: Name,
}

/// A contract's action and table interface description.
#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct InterfaceDescription {
    /// Free-form version marker.
    #[serde(default)]
    pub version: String,
    /// Declared actions.
    #[serde(default)]
    pub actions: Vec<ActionDecl>,
    /// Declared tables.
    #[serde(default)]
    pub tables: Vec<TableDecl>,
}

impl InterfaceDescription {
    /// Parses an interface description from its JSON byte form and
    /// checks declaration uniqueness.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, InterfaceError> {
        let description: InterfaceDescription =
            serde_json::from_slice(bytes).map_err(|error| InterfaceError::Parse(error.to_string()))?;
        description.validate()?;
        Ok(description)
    }

    fn validate(&self) -> Result<(), InterfaceError> {
        let mut seen_actions = std::collections::BTreeSet::new();
        for action in &self.actions {
            if !seen_actions.insert(&action.name) {
                return Err(InterfaceError::DuplicateAction(action.name.clone()));
            }
        }
        let mut seen_tables = std::collections::BTreeSet::new();
        for table in &self.tables {
            if !seen_tables.insert(&table.name) {
                return Err(InterfaceError::DuplicateTable(table.name.clone()));
            }
        }
        Ok(())
    }

    /// Looks up a declared action.
    pub fn action(&self, name: &Name) -> Option<&ActionDecl> {
        self.actions.iter().find(|action| &action.name == name)
    }

    /// Looks up a declared table.
    pub fn table(&self, name: &Name) -> Option<&TableDecl> {
        self.tables.iter().find(|table| &table.name == name)
    }

    /// Validates `value` against the declaration of `action` and
    /// encodes it into canonical bytes: fields in declaration order,
    /// integers little endian, strings and byte blobs varuint
    /// length-prefixed, keys and signatures algorithm-tagged.
    pub fn decode_action(&self, action: &Name, value: &Value) -> Result<Vec<u8>, InterfaceError> {
        let declaration = self
            .action(action)
            .ok_or_else(|| InterfaceError::UnknownAction(action.clone()))?;
        let object = value.as_object().ok_or(InterfaceError::ExpectedObject)?;

        if let Some(extra) = object
            .keys()
            .find(|key| !declaration.fields.iter().any(|field| &&field.name == key))
        {
            return Err(InterfaceError::UnexpectedField(extra.clone()));
        }

        let mut encoded = Vec::new();
        for field in &declaration.fields {
            let field_value = object
                .get(&field.name)
                .ok_or_else(|| InterfaceError::MissingField(field.name.clone()))?;
            encode_field(&mut encoded, field, field_value)?;
        }
        Ok(encoded)
    }
}

fn write_varuint32(out: &mut Vec<u8>, mut value: u32) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
}

fn type_mismatch(field: &FieldDecl) -> InterfaceError {
    InterfaceError::TypeMismatch {
        field: field.name.clone(),
        expected: field.field_type.expected(),
    }
}

fn invalid_value(field: &FieldDecl, message: impl ToString) -> InterfaceError {
    InterfaceError::InvalidValue {
        field: field.name.clone(),
        message: message.to_string(),
    }
}

fn encode_field(out: &mut Vec<u8>, field: &FieldDecl, value: &Value) -> Result<(), InterfaceError> {
    match field.field_type {
        FieldType::Bool => {
            let flag = value.as_bool().ok_or_else(|| type_mismatch(field))?;
            out.push(flag as u8);
        }
        FieldType::U8 => {
            let number = value.as_u64().ok_or_else(|| type_mismatch(field))?;
            let narrowed =
                u8::try_from(number).map_err(|_| invalid_value(field, "out of range for u8"))?;
            out.push(narrowed);
        }
        FieldType::U16 => {
            let number = value.as_u64().ok_or_else(|| type_mismatch(field))?;
            let narrowed =
                u16::try_from(number).map_err(|_| invalid_value(field, "out of range for u16"))?;
            out.extend_from_slice(&narrowed.to_le_bytes());
        }
        FieldType::U32 => {
            let number = value.as_u64().ok_or_else(|| type_mismatch(field))?;
            let narrowed =
                u32::try_from(number).map_err(|_| invalid_value(field, "out of range for u32"))?;
            out.extend_from_slice(&narrowed.to_le_bytes());
        }
        FieldType::U64 => {
            let number = value.as_u64().ok_or_else(|| type_mismatch(field))?;
            out.extend_from_slice(&number.to_le_bytes());
        }
        FieldType::I64 => {
            let number = value.as_i64().ok_or_else(|| type_mismatch(field))?;
            out.extend_from_slice(&number.to_le_bytes());
        }
        FieldType::String => {
            let text = value.as_str().ok_or_else(|| type_mismatch(field))?;
            write_varuint32(out, text.len() as u32);
            out.extend_from_slice(text.as_bytes());
        }
        FieldType::Bytes => {
            let text = value.as_str().ok_or_else(|| type_mismatch(field))?;
            let bytes = hex::decode(text).map_err(|error| invalid_value(field, error))?;
            write_varuint32(out, bytes.len() as u32);
            out.extend_from_slice(&bytes);
        }
        FieldType::Name => {
            let text = value.as_str().ok_or_else(|| type_mismatch(field))?;
            let name = Name::new(text).map_err(|error| invalid_value(field, error))?;
            write_varuint32(out, name.as_bytes().len() as u32);
            out.extend_from_slice(name.as_bytes());
        }
        FieldType::PublicKey => {
            let text = value.as_str().ok_or_else(|| type_mismatch(field))?;
            let key = PublicKey::from_str(text).map_err(|error| invalid_value(field, error))?;
            out.extend_from_slice(&key.to_bytes());
        }
        FieldType::Signature => {
            let text = value.as_str().ok_or_else(|| type_mismatch(field))?;
            let signature =
                Signature::from_str(text).map_err(|error| invalid_value(field, error))?;
            out.extend_from_slice(&signature.to_bytes());
        }
    }
    Ok(())
}
