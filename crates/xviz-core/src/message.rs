//! Message envelope: schema-tagged wrapper around metadata or a state
//! update, with JSON, text and length-framed binary renderings.

use base64::{engine::general_purpose::STANDARD, Engine};
use byteorder::{BigEndian, WriteBytesExt};
use serde_json::{json, Value as JsonValue};
use thiserror::Error;

use crate::data::{Metadata, StateUpdate};

/// Marks the binary envelope framing.
pub const PBE_MAGIC: u32 = 0x5042_4531; // "PBE1"

pub const METADATA_SCHEMA: &str = "xviz/metadata";
pub const STATE_UPDATE_SCHEMA: &str = "xviz/state_update";

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid base64 in {field}: {source}")]
    Color {
        field: &'static str,
        source: base64::DecodeError,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Metadata(Metadata),
    StateUpdate(StateUpdate),
}

impl Message {
    pub fn schema(&self) -> &'static str {
        match self {
            Message::Metadata(_) => METADATA_SCHEMA,
            Message::StateUpdate(_) => STATE_UPDATE_SCHEMA,
        }
    }

    fn data_object(&self) -> Result<JsonValue, MessageError> {
        let data = match self {
            Message::Metadata(metadata) => serde_json::to_value(metadata)?,
            Message::StateUpdate(update) => serde_json::to_value(update)?,
        };
        Ok(data)
    }

    /// Envelope as a JSON value with the compact wire encodings expanded:
    /// base64 style colors become numeric arrays and inline point colors
    /// become byte arrays.
    pub fn to_object(&self) -> Result<JsonValue, MessageError> {
        let mut data = self.data_object()?;
        unravel(&mut data)?;
        Ok(json!({
            "type": self.schema(),
            "data": data,
        }))
    }

    pub fn to_object_string(&self) -> Result<String, MessageError> {
        Ok(self.to_object()?.to_string())
    }

    /// Length-efficient framing: a four byte magic followed by the envelope
    /// JSON, unravelled the same way as `to_object`.
    pub fn to_binary(&self) -> Result<Vec<u8>, MessageError> {
        let text = self.to_object_string()?;
        let mut out = Vec::with_capacity(4 + text.len());
        // Infallible on Vec.
        let _ = out.write_u32::<BigEndian>(PBE_MAGIC);
        out.extend_from_slice(text.as_bytes());
        Ok(out)
    }
}

/// Expand base64 payloads in place: `fill_color`/`stroke_color` strings in
/// style objects become arrays of numbers, and primitive `colors` strings
/// become byte arrays. `#/` buffer references are left alone.
fn unravel(value: &mut JsonValue) -> Result<(), MessageError> {
    let JsonValue::Object(map) = value else {
        if let JsonValue::Array(items) = value {
            for item in items {
                unravel(item)?;
            }
        }
        return Ok(());
    };
    for (key, entry) in map.iter_mut() {
        match (key.as_str(), &*entry) {
            ("fill_color", JsonValue::String(text)) => {
                *entry = decode_color(text, "fill_color")?;
            }
            ("stroke_color", JsonValue::String(text)) => {
                *entry = decode_color(text, "stroke_color")?;
            }
            ("colors", JsonValue::String(text)) if !text.starts_with("#/") => {
                *entry = decode_color(text, "colors")?;
            }
            _ => unravel(entry)?,
        }
    }
    Ok(())
}

fn decode_color(text: &str, field: &'static str) -> Result<JsonValue, MessageError> {
    let bytes = STANDARD
        .decode(text)
        .map_err(|source| MessageError::Color { field, source })?;
    Ok(JsonValue::Array(
        bytes.into_iter().map(JsonValue::from).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UpdateType;

    #[test]
    fn schema_matches_variant() {
        assert_eq!(Message::Metadata(Metadata::default()).schema(), "xviz/metadata");
        let update = StateUpdate {
            update_type: UpdateType::Snapshot,
            updates: Vec::new(),
        };
        assert_eq!(Message::StateUpdate(update).schema(), "xviz/state_update");
    }

    #[test]
    fn envelope_wraps_data() {
        let object = Message::Metadata(Metadata::default()).to_object().unwrap();
        assert_eq!(object["type"], "xviz/metadata");
        assert_eq!(object["data"]["version"], "2.0.0");
    }

    #[test]
    fn binary_form_starts_with_magic() {
        let bytes = Message::Metadata(Metadata::default()).to_binary().unwrap();
        assert_eq!(&bytes[..4], b"PBE1");
        assert!(bytes[4..].starts_with(b"{"));
    }

    #[test]
    fn unravel_expands_style_colors() {
        // "I2ZmYQ==" is base64 for "#ffa".
        let mut value = serde_json::json!({
            "base": {"style": {"fill_color": "I2ZmYQ=="}}
        });
        unravel(&mut value).unwrap();
        assert_eq!(
            value["base"]["style"]["fill_color"],
            serde_json::json!([0x23, 0x66, 0x66, 0x61])
        );
    }

    #[test]
    fn unravel_leaves_references_alone() {
        let mut value = serde_json::json!({"colors": "#/accessors/1"});
        unravel(&mut value).unwrap();
        assert_eq!(value["colors"], "#/accessors/1");
    }
}
