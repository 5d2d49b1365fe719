//! Primitive accumulator: one call chain builds one primitive instance,
//! appended to its stream's per-variant list on flush.

use base64::{engine::general_purpose::STANDARD, Engine};
use hashbrown::HashMap;
use log::{error, warn};
use serde_json::Value as JsonValue;

use super::validate_stream_matches_metadata;
use crate::data::{
    Circle, Image, ImageData, Metadata, Point, Polygon, Polyline, PrimitiveBase,
    PrimitiveState, Stadium, Text, VertexData,
};
use crate::style::{validate_style, ObjectStyle};
use crate::types::{Category, PrimitiveType};

/// In-progress primitive between a variant starter and the next flush.
#[derive(Clone, Debug)]
struct PendingPrimitive {
    kind: PrimitiveType,
    vertices: Vec<f64>,
    radius: f64,
    text: Option<String>,
    image: Option<Image>,
    colors: Option<Vec<u8>>,
    object_id: Option<String>,
    style: Option<ObjectStyle>,
    classes: Option<Vec<String>>,
}

impl PendingPrimitive {
    fn new(kind: PrimitiveType) -> Self {
        PendingPrimitive {
            kind,
            vertices: Vec::new(),
            radius: 0.0,
            text: None,
            image: None,
            colors: None,
            object_id: None,
            style: None,
            classes: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PrimitiveBuilder {
    metadata: Metadata,
    stream_id: String,
    pending: Option<PendingPrimitive>,
    primitives: HashMap<String, PrimitiveState>,
}

impl PrimitiveBuilder {
    pub fn new(metadata: Metadata) -> Self {
        PrimitiveBuilder {
            metadata,
            stream_id: String::new(),
            pending: None,
            primitives: HashMap::new(),
        }
    }

    /// Flush any pending primitive, then target `stream_id`.
    pub fn stream(&mut self, stream_id: impl Into<String>) -> &mut Self {
        if !self.stream_id.is_empty() {
            self.flush();
        }
        self.stream_id = stream_id.into();
        self
    }

    fn start(&mut self, kind: PrimitiveType) -> &mut PendingPrimitive {
        if self.pending.is_some() {
            self.flush();
        }
        self.pending.insert(PendingPrimitive::new(kind))
    }

    fn require_pending(&mut self, setter: &str) -> Option<&mut PendingPrimitive> {
        if self.pending.is_none() {
            warn!("Start from a primitive first, e.g. polygon(), image(), before calling {setter}().");
        }
        self.pending.as_mut()
    }

    pub fn polygon(&mut self, vertices: Vec<f64>) -> &mut Self {
        check_vertex_triples("polygon", &vertices);
        self.start(PrimitiveType::Polygon).vertices = vertices;
        self
    }

    pub fn polyline(&mut self, vertices: Vec<f64>) -> &mut Self {
        check_vertex_triples("polyline", &vertices);
        self.start(PrimitiveType::Polyline).vertices = vertices;
        self
    }

    pub fn points(&mut self, vertices: Vec<f64>) -> &mut Self {
        check_vertex_triples("points", &vertices);
        self.start(PrimitiveType::Point).vertices = vertices;
        self
    }

    /// RGBA bytes, one 4-byte color per point. The count is checked against
    /// the point count at flush; mismatches drop the colors with a warning.
    pub fn colors(&mut self, colors: Vec<u8>) -> &mut Self {
        match &mut self.pending {
            Some(pending) if pending.kind == PrimitiveType::Point => {
                pending.colors = Some(colors);
            }
            _ => error!("points() needs to be called before calling colors()"),
        }
        self
    }

    pub fn circle(&mut self, center: Vec<f64>, radius: f64) -> &mut Self {
        let pending = self.start(PrimitiveType::Circle);
        pending.radius = radius;
        pending.vertices = center;
        self
    }

    /// Raw image bytes. With `encode` set the bytes are base64-encoded
    /// before storage, matching the bytes-typed schema field.
    pub fn image(&mut self, data: Vec<u8>, encode: bool) -> &mut Self {
        let image = Image {
            data: if encode {
                ImageData::Encoded(STANDARD.encode(&data))
            } else {
                ImageData::Raw(data)
            },
            is_encoded: encode,
            ..Image::default()
        };
        self.start(PrimitiveType::Image).image = Some(image);
        self
    }

    pub fn dimensions(&mut self, width_px: u32, height_px: u32) -> &mut Self {
        match self.pending.as_mut().and_then(|p| p.image.as_mut()) {
            Some(image) => {
                image.width_px = Some(width_px);
                image.height_px = Some(height_px);
            }
            None => error!("An image must be set before calling dimensions()"),
        }
        self
    }

    pub fn text(&mut self, message: impl Into<String>) -> &mut Self {
        self.start(PrimitiveType::Text).text = Some(message.into());
        self
    }

    pub fn stadium(&mut self, start: Vec<f64>, end: Vec<f64>, radius: f64) -> &mut Self {
        if self.pending.is_some() {
            self.flush();
        }
        if start.len() != 3 || end.len() != 3 {
            error!("The start/end position should be of the form [x, y, z]");
            return self;
        }
        let pending = self.start(PrimitiveType::Stadium);
        pending.vertices = start.into_iter().chain(end).collect();
        pending.radius = radius;
        self
    }

    /// Position refinement for a started primitive (image anchor, text
    /// position). Must be exactly [x, y, z].
    pub fn position(&mut self, position: Vec<f64>) -> &mut Self {
        if position.len() != 3 {
            error!("A position must be of the form [x, y, z]");
            return self;
        }
        if let Some(pending) = self.require_pending("position") {
            pending.vertices = position;
        }
        self
    }

    pub fn object_id(&mut self, object_id: impl Into<String>) -> &mut Self {
        let object_id = object_id.into();
        if let Some(pending) = self.require_pending("object_id") {
            pending.object_id = Some(object_id);
        }
        self
    }

    pub fn classes(&mut self, classes: Vec<String>) -> &mut Self {
        if let Some(pending) = self.require_pending("classes") {
            pending.classes = Some(classes);
        }
        self
    }

    pub fn style(&mut self, style_json: &JsonValue) -> &mut Self {
        let style = ObjectStyle::from_json(style_json);
        if let Some(pending) = self.require_pending("style") {
            pending.style = Some(style);
        }
        self
    }

    fn flush(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        validate_stream_matches_metadata(&self.metadata, &self.stream_id, Category::Primitive);
        if let Some(style) = &pending.style {
            validate_style(pending.kind, &style.set_fields(), true);
        }
        let state = self.primitives.entry(self.stream_id.clone()).or_default();
        commit(state, pending);
    }

    /// Flush and drain: the committed map is taken, so a second call with
    /// no intervening setters returns `None`.
    pub fn get_data(&mut self) -> Option<HashMap<String, PrimitiveState>> {
        if self.pending.is_some() {
            self.flush();
        }
        if self.primitives.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.primitives))
        }
    }
}

fn check_vertex_triples(variant: &str, vertices: &[f64]) {
    if vertices.is_empty() || vertices.len() % 3 != 0 {
        warn!(
            "A {variant} vertex list should be a non-empty flat [x, y, z, ...] list, got {} values",
            vertices.len()
        );
    }
}

fn build_base(pending: &mut PendingPrimitive) -> Option<PrimitiveBase> {
    let base = PrimitiveBase {
        object_id: pending.object_id.take(),
        classes: pending.classes.take().unwrap_or_default(),
        style: pending.style.take(),
    };
    if base.is_empty() {
        None
    } else {
        Some(base)
    }
}

fn commit(state: &mut PrimitiveState, mut pending: PendingPrimitive) {
    let base = build_base(&mut pending);
    match pending.kind {
        PrimitiveType::Polygon => state.polygons.push(Polygon {
            vertices: pending.vertices,
            base,
        }),
        PrimitiveType::Polyline => state.polylines.push(Polyline {
            vertices: pending.vertices,
            base,
        }),
        PrimitiveType::Point => {
            let point_count = pending.vertices.len() / 3;
            let colors = match pending.colors {
                Some(colors) if colors.len() / 4 != point_count => {
                    warn!("Point count and color count do not match, not showing colors");
                    None
                }
                Some(colors) => Some(STANDARD.encode(colors)),
                None => None,
            };
            state.points.push(Point {
                points: VertexData::Values(pending.vertices),
                colors,
                base,
            });
        }
        PrimitiveType::Circle => {
            if pending.vertices.len() != 3 {
                error!("A circle's center must be of the form [x, y, z]");
                return;
            }
            state.circles.push(Circle {
                center: pending.vertices,
                radius: pending.radius,
                base,
            });
        }
        PrimitiveType::Image => {
            let Some(mut image) = pending.image else {
                error!("Image data is missing");
                return;
            };
            if pending.vertices.len() == 3 {
                image.position = pending.vertices;
            }
            image.base = base;
            state.images.push(image);
        }
        PrimitiveType::Text => {
            if pending.vertices.len() != 3 {
                error!("A text's position must be of the form [x, y, z]");
                return;
            }
            state.texts.push(Text {
                text: pending.text.unwrap_or_default(),
                position: pending.vertices,
                base,
            });
        }
        PrimitiveType::Stadium => {
            if pending.vertices.len() != 6 {
                error!("A stadium should have start and end positions");
                return;
            }
            let end = pending.vertices.split_off(3);
            state.stadiums.push(Stadium {
                start: pending.vertices,
                end,
                radius: pending.radius,
                base,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn builder() -> PrimitiveBuilder {
        PrimitiveBuilder::new(Metadata::default())
    }

    #[test]
    fn one_chain_commits_one_primitive() {
        let mut b = builder();
        b.stream("/objects")
            .polygon(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0])
            .object_id("car-1");
        let data = b.get_data().unwrap();
        let state = &data["/objects"];
        assert_eq!(state.polygons.len(), 1);
        assert_eq!(
            state.polygons[0].base.as_ref().unwrap().object_id.as_deref(),
            Some("car-1")
        );
    }

    #[test]
    fn starting_a_new_primitive_flushes_the_previous_one() {
        let mut b = builder();
        b.stream("/objects")
            .circle(vec![0.0, 0.0, 0.0], 1.0)
            .circle(vec![1.0, 1.0, 0.0], 2.0);
        let data = b.get_data().unwrap();
        assert_eq!(data["/objects"].circles.len(), 2);
    }

    #[test]
    fn matching_colors_are_committed_as_base64() {
        let mut b = builder();
        b.stream("/lidar")
            .points(vec![1.0, 2.0, 3.0])
            .colors(vec![4, 4, 4, 4]);
        let data = b.get_data().unwrap();
        let point = &data["/lidar"].points[0];
        assert_eq!(point.colors.as_deref(), Some(STANDARD.encode([4u8; 4]).as_str()));
    }

    #[test]
    fn mismatched_colors_are_dropped() {
        let mut b = builder();
        b.stream("/lidar")
            .points(vec![1.0, 2.0, 3.0])
            .colors(vec![0; 8]);
        let data = b.get_data().unwrap();
        let point = &data["/lidar"].points[0];
        assert!(point.colors.is_none());
        assert_eq!(point.points, VertexData::Values(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn auxiliary_setters_without_a_primitive_are_no_ops() {
        let mut b = builder();
        b.stream("/objects").object_id("ignored").colors(vec![1, 2, 3, 4]);
        assert!(b.get_data().is_none());
    }

    #[test]
    fn get_data_drains_committed_state() {
        let mut b = builder();
        b.stream("/objects").text("hi").position(vec![0.0, 0.0, 0.0]);
        assert!(b.get_data().is_some());
        assert!(b.get_data().is_none());
    }

    #[test]
    fn style_is_written_even_when_advisory_validation_warns() {
        let mut b = builder();
        b.stream("/lidar")
            .points(vec![1.0, 2.0, 3.0])
            .style(&json!({"stroke_width": 2.0}));
        let data = b.get_data().unwrap();
        let base = data["/lidar"].points[0].base.as_ref().unwrap();
        assert_eq!(base.style.as_ref().unwrap().stroke_width, Some(2.0));
    }

    #[test]
    fn stadium_commits_start_and_end() {
        let mut b = builder();
        b.stream("/zones")
            .stadium(vec![0.0, 0.0, 0.0], vec![1.0, 0.0, 0.0], 2.0);
        let data = b.get_data().unwrap();
        let stadium = &data["/zones"].stadiums[0];
        assert_eq!(stadium.start, vec![0.0, 0.0, 0.0]);
        assert_eq!(stadium.end, vec![1.0, 0.0, 0.0]);
        assert_eq!(stadium.radius, 2.0);
    }

    #[test]
    fn invalid_stadium_does_not_start_a_primitive() {
        let mut b = builder();
        b.stream("/zones").stadium(vec![0.0, 0.0], vec![1.0, 0.0, 0.0], 2.0);
        assert!(b.get_data().is_none());
    }

    #[test]
    fn image_position_refinement_is_applied() {
        let mut b = builder();
        b.stream("/camera")
            .image(vec![1, 2, 3], false)
            .dimensions(640, 480)
            .position(vec![1.0, 2.0, 3.0]);
        let data = b.get_data().unwrap();
        let image = &data["/camera"].images[0];
        assert_eq!(image.width_px, Some(640));
        assert_eq!(image.position, vec![1.0, 2.0, 3.0]);
        assert_eq!(image.data, ImageData::Raw(vec![1, 2, 3]));
    }

    #[test]
    fn encoded_image_is_base64_text() {
        let mut b = builder();
        b.stream("/camera").image(vec![1, 2, 3], true);
        let data = b.get_data().unwrap();
        let image = &data["/camera"].images[0];
        assert!(image.is_encoded);
        assert_eq!(image.data, ImageData::Encoded("AQID".to_string()));
    }
}
