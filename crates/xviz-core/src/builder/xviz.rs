//! Frame facade: one accumulator per category behind a single entry point,
//! assembled into a timestamped snapshot frame.

use log::error;

use crate::data::{Metadata, StateUpdate, StreamSet, UpdateType};
use crate::message::Message;

use super::pose::PoseBuilder;
use super::primitive::PrimitiveBuilder;
use super::time_series::TimeSeriesBuilder;
use super::ui_primitive::UiPrimitiveBuilder;

/// The frame timestamp is read from this pose stream.
pub const PRIMARY_POSE_STREAM: &str = "/vehicle_pose";

#[derive(Clone, Debug)]
pub struct XvizBuilder {
    pose: PoseBuilder,
    primitive: PrimitiveBuilder,
    time_series: TimeSeriesBuilder,
    ui_primitive: UiPrimitiveBuilder,
}

impl XvizBuilder {
    /// Stream declarations in `metadata` drive the advisory checks every
    /// accumulator performs.
    pub fn new(metadata: Metadata) -> Self {
        XvizBuilder {
            pose: PoseBuilder::new(metadata.clone()),
            primitive: PrimitiveBuilder::new(metadata.clone()),
            time_series: TimeSeriesBuilder::new(metadata.clone()),
            ui_primitive: UiPrimitiveBuilder::new(metadata),
        }
    }

    pub fn pose(&mut self, stream_id: impl Into<String>) -> &mut PoseBuilder {
        self.pose.stream(stream_id)
    }

    pub fn primitive(&mut self, stream_id: impl Into<String>) -> &mut PrimitiveBuilder {
        self.primitive.stream(stream_id)
    }

    pub fn time_series(&mut self, stream_id: impl Into<String>) -> &mut TimeSeriesBuilder {
        self.time_series.stream(stream_id)
    }

    pub fn ui_primitive(&mut self, stream_id: impl Into<String>) -> &mut UiPrimitiveBuilder {
        self.ui_primitive.stream(stream_id)
    }

    /// Assemble everything accumulated since the last call into one frame.
    /// The timestamp comes from the primary pose; a frame without one is
    /// still produced, minus its timestamp.
    pub fn get_data(&mut self) -> StreamSet {
        let mut frame = StreamSet::default();
        if let Some(poses) = self.pose.get_data() {
            frame.timestamp = poses
                .get(PRIMARY_POSE_STREAM)
                .and_then(|pose| pose.timestamp);
            frame.poses = poses;
        }
        if frame.timestamp.is_none() {
            error!(
                "Frame has no timestamp: add a timestamped pose on {}",
                PRIMARY_POSE_STREAM
            );
        }
        if let Some(primitives) = self.primitive.get_data() {
            frame.primitives = primitives;
        }
        frame.time_series = self.time_series.get_data();
        if let Some(ui_primitives) = self.ui_primitive.get_data() {
            frame.ui_primitives = ui_primitives;
        }
        frame
    }

    /// The frame wrapped as a snapshot state update message.
    pub fn get_message(&mut self) -> Message {
        Message::StateUpdate(StateUpdate {
            update_type: UpdateType::Snapshot,
            updates: vec![self.get_data()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_takes_timestamp_from_primary_pose() {
        let mut b = XvizBuilder::new(Metadata::default());
        b.pose(PRIMARY_POSE_STREAM)
            .timestamp(1001.5)
            .position(1.0, 2.0, 3.0);
        let frame = b.get_data();
        assert_eq!(frame.timestamp, Some(1001.5));
        assert_eq!(frame.poses[PRIMARY_POSE_STREAM].position, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn frame_without_primary_pose_still_builds() {
        let mut b = XvizBuilder::new(Metadata::default());
        b.primitive("/lane").polyline(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let frame = b.get_data();
        assert_eq!(frame.timestamp, None);
        assert_eq!(frame.primitives["/lane"].polylines.len(), 1);
    }

    #[test]
    fn message_is_a_single_snapshot_update() {
        let mut b = XvizBuilder::new(Metadata::default());
        b.pose(PRIMARY_POSE_STREAM).timestamp(7.0);
        let Message::StateUpdate(update) = b.get_message() else {
            panic!("expected state update");
        };
        assert_eq!(update.update_type, UpdateType::Snapshot);
        assert_eq!(update.updates.len(), 1);
        assert_eq!(update.updates[0].timestamp, Some(7.0));
    }

    #[test]
    fn poses_persist_across_frames_but_drained_categories_do_not() {
        let mut b = XvizBuilder::new(Metadata::default());
        b.pose(PRIMARY_POSE_STREAM).timestamp(1.0);
        b.primitive("/lane").polyline(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let first = b.get_data();
        assert_eq!(first.primitives.len(), 1);

        let second = b.get_data();
        assert!(second.primitives.is_empty());
        assert_eq!(second.timestamp, Some(1.0));
    }
}
