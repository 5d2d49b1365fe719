//! Binary frame encoder: walks a state update, moves image bytes and point
//! clouds into a shared binary buffer with symbolic back-references, and
//! frames the result as a GLB file. Updates with no bulk payload come out
//! as plain JSON text.

use base64::{engine::general_purpose::STANDARD, Engine};
use byteorder::{LittleEndian, WriteBytesExt};
use log::warn;
use thiserror::Error;

use xviz_core::data::{Image, ImageData, Point, VertexData};
use xviz_core::message::{Message, MessageError};

use crate::glb::{
    encode_container, pad_binary, Accessor, AccessorType, Asset, Buffer, BufferView, GlbDocument,
    GlbImage, COMPONENT_FLOAT, COMPONENT_UNSIGNED_BYTE,
};

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("only state update messages can be frame-encoded")]
    NotAStateUpdate,
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error("failed to serialize glTF document: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Default)]
struct Encoder {
    doc: GlbDocument,
    bin: Vec<u8>,
}

impl Encoder {
    fn push_view(&mut self, bytes: &[u8]) -> usize {
        let byte_offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        // View length covers the alignment padding, matching the reader's
        // expectation for byte payloads.
        let pad = pad_binary(&mut self.bin);
        self.doc.buffer_views.push(BufferView {
            buffer: 0,
            byte_offset,
            byte_length: bytes.len() + pad,
        });
        self.doc.buffer_views.len() - 1
    }

    fn encode_image(&mut self, image: &mut Image) {
        let bytes = match &image.data {
            ImageData::Raw(bytes) if !bytes.is_empty() => bytes.clone(),
            ImageData::Encoded(text) if !text.is_empty() => match STANDARD.decode(text) {
                Ok(bytes) => {
                    warn!("Image arrived base64-encoded; send raw bytes when frame-encoding");
                    bytes
                }
                Err(err) => {
                    warn!("Leaving image inline, its base64 data is invalid: {err}");
                    return;
                }
            },
            _ => return,
        };
        // The payload is raw bytes in the buffer now, whatever came in.
        image.is_encoded = false;
        let view = self.push_view(&bytes);
        let index = self.doc.images.len();
        self.doc.images.push(GlbImage {
            buffer_view: view,
            mime_type: Some("image/png".to_string()),
        });
        image.data = ImageData::Reference(format!("#/images/{index}"));
    }

    fn encode_point(&mut self, point: &mut Point) {
        let VertexData::Values(values) = &point.points else {
            return;
        };
        if values.is_empty() {
            return;
        }
        let point_count = values.len() / 3;

        let mut bytes = Vec::with_capacity(values.len() * 4);
        for value in values {
            // Writes to a Vec cannot fail.
            let _ = bytes.write_f32::<LittleEndian>(*value as f32);
        }
        let view = self.push_view(&bytes);
        let index = self.doc.accessors.len();
        self.doc.accessors.push(Accessor {
            buffer_view: view,
            component_type: COMPONENT_FLOAT,
            count: point_count,
            accessor_type: AccessorType::Vec3,
        });
        point.points = VertexData::Reference(format!("#/accessors/{index}"));

        self.encode_colors(point, point_count);
    }

    fn encode_colors(&mut self, point: &mut Point, point_count: usize) {
        let Some(text) = &point.colors else {
            return;
        };
        if text.starts_with("#/") {
            return;
        }
        let bytes = match STANDARD.decode(text) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Dropping point colors, invalid base64: {err}");
                point.colors = None;
                return;
            }
        };
        if bytes.len() != point_count * 4 {
            warn!(
                "Dropping point colors: expected {} RGBA bytes for {} points, got {}",
                point_count * 4,
                point_count,
                bytes.len()
            );
            point.colors = None;
            return;
        }
        let view = self.push_view(&bytes);
        let index = self.doc.accessors.len();
        self.doc.accessors.push(Accessor {
            buffer_view: view,
            component_type: COMPONENT_UNSIGNED_BYTE,
            count: point_count,
            accessor_type: AccessorType::Vec4,
        });
        point.colors = Some(format!("#/accessors/{index}"));
    }
}

/// Encode a state update message. When any image or point payload exists
/// the result is a GLB byte stream with the message spliced into the JSON
/// chunk under an `xviz` key; otherwise it is the plain JSON envelope.
pub fn write_message(message: &Message) -> Result<Vec<u8>, WriterError> {
    let Message::StateUpdate(update) = message else {
        return Err(WriterError::NotAStateUpdate);
    };

    let mut update = update.clone();
    let mut encoder = Encoder::default();
    for frame in &mut update.updates {
        for primitives in frame.primitives.values_mut() {
            for image in &mut primitives.images {
                encoder.encode_image(image);
            }
            for point in &mut primitives.points {
                encoder.encode_point(point);
            }
        }
    }

    let message = Message::StateUpdate(update);
    if !encoder.doc.has_binary() {
        return Ok(message.to_object_string()?.into_bytes());
    }

    encoder.doc.asset = Some(Asset::default());
    encoder.doc.buffers.push(Buffer {
        byte_length: encoder.bin.len(),
    });

    // Splice the message into the document as its last member.
    let mut json = serde_json::to_vec(&encoder.doc)?;
    json.pop();
    json.extend_from_slice(b",\"xviz\":");
    json.extend_from_slice(message.to_object_string()?.as_bytes());
    json.push(b'}');

    Ok(encode_container(json, encoder.bin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use xviz_core::data::{Metadata, StateUpdate, UpdateType};
    use xviz_core::XvizBuilder;

    fn empty_update() -> Message {
        Message::StateUpdate(StateUpdate {
            update_type: UpdateType::Snapshot,
            updates: Vec::new(),
        })
    }

    #[test]
    fn metadata_is_rejected() {
        let result = write_message(&Message::Metadata(Metadata::default()));
        assert!(matches!(result, Err(WriterError::NotAStateUpdate)));
    }

    #[test]
    fn update_without_bulk_payloads_stays_json() {
        let bytes = write_message(&empty_update()).unwrap();
        assert!(bytes.starts_with(b"{"));
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["type"], "xviz/state_update");
    }

    #[test]
    fn update_with_points_becomes_glb() {
        let mut b = XvizBuilder::new(Metadata::default());
        b.pose("/vehicle_pose").timestamp(1.0);
        b.primitive("/points").points(vec![0.0, 1.0, 2.0]);
        let bytes = write_message(&b.get_message()).unwrap();
        assert_eq!(&bytes[0..4], b"glTF");
    }
}
