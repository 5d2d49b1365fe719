//! Wire output for XVIZ messages: a glTF-binary container and the frame
//! encoder that packs bulk payloads (images, point clouds) into it.

pub mod glb;
pub mod writer;

pub use glb::{GlbDocument, CHUNK_BIN, CHUNK_JSON, GLB_MAGIC, GLB_VERSION};
pub use writer::{write_message, WriterError};
