//! Pose accumulator: one pose per stream id, last write wins.

use hashbrown::HashMap;

use super::validate_stream_matches_metadata;
use crate::data::{MapOrigin, Metadata, Pose};
use crate::types::Category;

#[derive(Clone, Debug)]
pub struct PoseBuilder {
    metadata: Metadata,
    stream_id: String,
    pending: Pose,
    poses: HashMap<String, Pose>,
}

impl PoseBuilder {
    pub fn new(metadata: Metadata) -> Self {
        PoseBuilder {
            metadata,
            stream_id: String::new(),
            pending: Pose::default(),
            poses: HashMap::new(),
        }
    }

    /// Flush the pending pose, then target `stream_id`.
    pub fn stream(&mut self, stream_id: impl Into<String>) -> &mut Self {
        if !self.stream_id.is_empty() {
            self.flush();
        }
        self.stream_id = stream_id.into();
        self
    }

    pub fn map_origin(&mut self, longitude: f64, latitude: f64, altitude: f64) -> &mut Self {
        self.pending.map_origin = Some(MapOrigin {
            longitude,
            latitude,
            altitude,
        });
        self
    }

    pub fn position(&mut self, x: f64, y: f64, z: f64) -> &mut Self {
        self.pending.position = vec![x, y, z];
        self
    }

    pub fn orientation(&mut self, roll: f64, pitch: f64, yaw: f64) -> &mut Self {
        self.pending.orientation = vec![roll, pitch, yaw];
        self
    }

    pub fn timestamp(&mut self, timestamp: f64) -> &mut Self {
        self.pending.timestamp = Some(timestamp);
        self
    }

    fn flush(&mut self) {
        validate_stream_matches_metadata(&self.metadata, &self.stream_id, Category::Pose);
        let pose = std::mem::take(&mut self.pending);
        self.poses.insert(self.stream_id.clone(), pose);
    }

    /// Flush and return the committed poses. The map is cumulative: it is
    /// not drained here, so repeated calls keep returning committed state.
    pub fn get_data(&mut self) -> Option<HashMap<String, Pose>> {
        if !self.stream_id.is_empty() {
            self.flush();
            self.stream_id.clear();
        }
        if self.poses.is_empty() {
            None
        } else {
            Some(self.poses.clone())
        }
    }
}
