//! Stream accumulators: stateful builders that accept chained setter calls,
//! flush pending entities on stream switch, and commit typed values into
//! per-stream maps validated against the metadata snapshot.

pub mod metadata;
pub mod pose;
pub mod primitive;
pub mod time_series;
pub mod ui_primitive;
pub mod xviz;

use log::warn;

use crate::data::Metadata;
use crate::types::Category;

/// Advisory check that a stream is declared and its declared category
/// matches the accumulator using it. Warnings only, never enforced.
pub(crate) fn validate_stream_matches_metadata(
    metadata: &Metadata,
    stream_id: &str,
    category: Category,
) {
    match metadata.streams.get(stream_id) {
        None => warn!("{stream_id} is not defined in metadata."),
        Some(entry) => {
            if let Some(declared) = entry.category {
                if declared != category {
                    warn!(
                        "Stream {stream_id} category {category} does not match metadata \
                         definition {declared}"
                    );
                }
            }
        }
    }
}
