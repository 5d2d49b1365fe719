//! Producer-side building blocks for the XVIZ v2 protocol: a metadata
//! registry, per-category stream accumulators, a frame facade and the
//! schema-tagged message envelope.
//!
//! Data flows in one direction: declare streams with [`MetadataBuilder`],
//! hand the resulting [`Metadata`] to an [`XvizBuilder`], feed it entities
//! through chained setter calls, then pull a frame per [`XvizBuilder::get_data`]
//! or a wire-ready [`Message`] per [`XvizBuilder::get_message`].
//!
//! Validation is advisory throughout: malformed input is logged and
//! dropped or corrected, never turned into a hard failure mid-frame.

pub mod builder;
pub mod data;
pub mod declarative_ui;
pub mod message;
pub mod style;
pub mod types;

pub use builder::metadata::MetadataBuilder;
pub use builder::pose::PoseBuilder;
pub use builder::primitive::PrimitiveBuilder;
pub use builder::time_series::{TimeSeriesBuilder, TimeSeriesValue};
pub use builder::ui_primitive::{TreeTableRowBuilder, UiPrimitiveBuilder};
pub use builder::xviz::{XvizBuilder, PRIMARY_POSE_STREAM};
pub use data::{
    Metadata, Pose, PrimitiveState, StateUpdate, StreamMetadata, StreamSet, TimeSeriesState,
    UiPrimitiveState, UpdateType,
};
pub use declarative_ui::{UiBuilder, UiElement};
pub use message::{Message, MessageError};
pub use style::{ObjectStyle, StreamStyle, StyleClass};
pub use types::{
    Category, CoordinateType, PrimitiveType, ScalarType, TreeTableColumnType, UiPrimitiveType,
};
