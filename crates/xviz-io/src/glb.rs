//! Minimal glTF-binary container: a JSON document describing buffer views
//! and accessors over one binary buffer, framed as a two-chunk GLB file.

use byteorder::{LittleEndian, WriteBytesExt};
use serde::Serialize;

pub const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF" once little-endian
pub const GLB_VERSION: u32 = 2;
pub const CHUNK_JSON: u32 = 0x4E4F_534A; // "JSON"
pub const CHUNK_BIN: u32 = 0x004E_4942; // "BIN\0"

pub const COMPONENT_FLOAT: u32 = 5126;
pub const COMPONENT_UNSIGNED_BYTE: u32 = 5121;

#[derive(Clone, Debug, Serialize)]
pub struct Asset {
    pub version: &'static str,
}

impl Default for Asset {
    fn default() -> Self {
        Asset { version: "2.0" }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    pub byte_length: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub enum AccessorType {
    #[serde(rename = "VEC3")]
    Vec3,
    #[serde(rename = "VEC4")]
    Vec4,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    pub buffer_view: usize,
    pub component_type: u32,
    pub count: usize,
    #[serde(rename = "type")]
    pub accessor_type: AccessorType,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlbImage {
    pub buffer_view: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// The JSON chunk of the container, extended at serialization time with an
/// application payload spliced in under an `xviz` key.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlbDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<Asset>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buffers: Vec<Buffer>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buffer_views: Vec<BufferView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accessors: Vec<Accessor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<GlbImage>,
}

impl GlbDocument {
    pub fn has_binary(&self) -> bool {
        !self.buffer_views.is_empty()
    }
}

fn padding_to(len: usize, align: usize) -> usize {
    (align - len % align) % align
}

/// Pad `bin` with zeros to a four byte boundary and return the number of
/// bytes appended.
pub fn pad_binary(bin: &mut Vec<u8>) -> usize {
    let pad = padding_to(bin.len(), 4);
    bin.extend(std::iter::repeat(0u8).take(pad));
    pad
}

/// Frame a JSON document and its binary buffer as a GLB byte stream. The
/// JSON chunk is space-padded, the binary chunk zero-padded, both to four
/// bytes as the container requires.
pub fn encode_container(mut json: Vec<u8>, mut bin: Vec<u8>) -> Vec<u8> {
    let json_pad = padding_to(json.len(), 4);
    json.extend(std::iter::repeat(b' ').take(json_pad));
    pad_binary(&mut bin);

    let total = 12 + 8 + json.len() + if bin.is_empty() { 0 } else { 8 + bin.len() };
    let mut out = Vec::with_capacity(total);
    // Writes to a Vec cannot fail.
    let _ = out.write_u32::<LittleEndian>(GLB_MAGIC);
    let _ = out.write_u32::<LittleEndian>(GLB_VERSION);
    let _ = out.write_u32::<LittleEndian>(total as u32);
    let _ = out.write_u32::<LittleEndian>(json.len() as u32);
    let _ = out.write_u32::<LittleEndian>(CHUNK_JSON);
    out.extend_from_slice(&json);
    if !bin.is_empty() {
        let _ = out.write_u32::<LittleEndian>(bin.len() as u32);
        let _ = out.write_u32::<LittleEndian>(CHUNK_BIN);
        out.extend_from_slice(&bin);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_carries_magic_version_and_length() {
        let out = encode_container(b"{}".to_vec(), vec![1, 2, 3]);
        assert_eq!(&out[0..4], b"glTF");
        assert_eq!(&out[4..8], &[2, 0, 0, 0]);
        let total = u32::from_le_bytes([out[8], out[9], out[10], out[11]]);
        assert_eq!(total as usize, out.len());
    }

    #[test]
    fn json_chunk_is_space_padded_at_offset_20() {
        let out = encode_container(b"{}".to_vec(), Vec::new());
        let json_len = u32::from_le_bytes([out[12], out[13], out[14], out[15]]);
        assert_eq!(json_len, 4);
        assert_eq!(&out[16..20], b"JSON");
        assert_eq!(&out[20..24], b"{}  ");
        assert_eq!(out.len(), 24);
    }

    #[test]
    fn binary_chunk_is_zero_padded() {
        let out = encode_container(b"{}".to_vec(), vec![7]);
        let bin_len = u32::from_le_bytes([out[24], out[25], out[26], out[27]]);
        assert_eq!(bin_len, 4);
        assert_eq!(u32::from_le_bytes([out[28], out[29], out[30], out[31]]), CHUNK_BIN);
        assert_eq!(&out[32..36], &[7, 0, 0, 0]);
    }
}
