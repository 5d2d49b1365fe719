//! Metadata registry builder: declares streams, their categories and types,
//! styling, coordinate frames and the log's UI layout.

use hashbrown::HashMap;
use log::{error, warn};

use crate::data::{LogInfo, Metadata, StreamMetadata};
use crate::declarative_ui::{panels_to_ui_config, UiBuilder};
use crate::message::Message;
use crate::style::{validate_style, ObjectStyle, StreamStyle, StyleClass};
use crate::types::{Category, CoordinateType, PrimitiveType, ScalarType};

/// Type recorded for the stream being declared, resolved against the
/// category at flush time.
#[derive(Clone, Copy, Debug, PartialEq)]
enum PendingType {
    Primitive(PrimitiveType),
    Scalar(ScalarType),
}

#[derive(Clone, Debug, Default)]
pub struct MetadataBuilder {
    data: Metadata,
    stream_id: String,
    entry: StreamMetadata,
    pending_type: Option<PendingType>,
    panels: HashMap<String, UiBuilder>,
}

impl MetadataBuilder {
    pub fn new() -> Self {
        MetadataBuilder::default()
    }

    /// Close out the current stream declaration and begin a new one.
    pub fn stream(&mut self, stream_id: impl Into<String>) -> &mut Self {
        if !self.stream_id.is_empty() {
            self.flush();
        }
        self.stream_id = stream_id.into();
        self
    }

    pub fn category(&mut self, category: Category) -> &mut Self {
        self.entry.category = Some(category);
        self
    }

    pub fn primitive_type(&mut self, primitive_type: PrimitiveType) -> &mut Self {
        self.pending_type = Some(PendingType::Primitive(primitive_type));
        self
    }

    pub fn scalar_type(&mut self, scalar_type: ScalarType) -> &mut Self {
        self.pending_type = Some(PendingType::Scalar(scalar_type));
        self
    }

    pub fn coordinate(&mut self, coordinate: CoordinateType) -> &mut Self {
        self.entry.coordinate = Some(coordinate);
        self
    }

    pub fn unit(&mut self, unit: impl Into<String>) -> &mut Self {
        self.entry.units = Some(unit.into());
        self
    }

    pub fn source(&mut self, source: impl Into<String>) -> &mut Self {
        self.entry.source = Some(source.into());
        self
    }

    /// Row-major 4x4 transform for this stream's coordinate frame. Anything
    /// other than 16 values is rejected.
    pub fn transform_matrix(&mut self, matrix: &[f64]) -> &mut Self {
        if matrix.len() != 16 {
            error!(
                "Stream {} transform must contain 16 values, got {}",
                self.stream_id,
                matrix.len()
            );
            return self;
        }
        self.entry.transform = matrix.to_vec();
        self
    }

    /// Stream-scope default style. The primitive type must already be
    /// declared so field names can be checked against it.
    pub fn stream_style(&mut self, style: StreamStyle) -> &mut Self {
        let Some(PendingType::Primitive(primitive_type)) = self.pending_type else {
            warn!(
                "Stream {} declared a style before its primitive type; ignoring",
                self.stream_id
            );
            return self;
        };
        validate_style(primitive_type, &style.set_fields(), false);
        match &mut self.entry.stream_style {
            Some(existing) => existing.merge_from(&style),
            None => self.entry.stream_style = Some(style),
        }
        self
    }

    /// Named object-scope style applied via `classes` on primitives.
    pub fn style_class(&mut self, name: impl Into<String>, style: ObjectStyle) -> &mut Self {
        let Some(PendingType::Primitive(primitive_type)) = self.pending_type else {
            warn!(
                "Stream {} declared a style class before its primitive type; ignoring",
                self.stream_id
            );
            return self;
        };
        validate_style(primitive_type, &style.set_fields(), true);
        self.entry.style_classes.push(StyleClass {
            name: name.into(),
            style,
        });
        self
    }

    pub fn start_time(&mut self, time: f64) -> &mut Self {
        self.data.log_info.start_time = Some(time);
        self
    }

    pub fn end_time(&mut self, time: f64) -> &mut Self {
        self.data.log_info.end_time = Some(time);
        self
    }

    pub fn log_info(&mut self, log_info: LogInfo) -> &mut Self {
        self.data.log_info = log_info;
        self
    }

    /// Declarative UI panels, keyed by panel name.
    pub fn ui(&mut self, panels: HashMap<String, UiBuilder>) -> &mut Self {
        self.panels = panels;
        self
    }

    fn flush(&mut self) {
        if self.stream_id.is_empty() {
            return;
        }
        let mut entry = std::mem::take(&mut self.entry);
        match (entry.category, self.pending_type.take()) {
            (Some(Category::Primitive | Category::FutureInstance), pending) => match pending {
                Some(PendingType::Primitive(t)) => entry.primitive_type = Some(t),
                _ => warn!(
                    "Stream {} requires a primitive type, one of: {}",
                    self.stream_id,
                    PrimitiveType::option_names()
                ),
            },
            (Some(Category::Variable | Category::TimeSeries), pending) => match pending {
                Some(PendingType::Scalar(t)) => entry.scalar_type = Some(t),
                _ => warn!(
                    "Stream {} requires a scalar type, one of: {}",
                    self.stream_id,
                    ScalarType::option_names()
                ),
            },
            (_, Some(_)) => warn!(
                "Stream {} set a type but its category does not take one",
                self.stream_id
            ),
            (_, None) => {}
        }
        self.data
            .streams
            .entry(std::mem::take(&mut self.stream_id))
            .or_default()
            .merge_from(&entry);
    }

    /// Snapshot the accumulated metadata. Declarations made afterwards keep
    /// extending the same registry.
    pub fn get_data(&mut self) -> Metadata {
        self.flush();
        let mut data = self.data.clone();
        if !self.panels.is_empty() {
            data.ui_config = panels_to_ui_config(&self.panels);
        }
        data
    }

    pub fn get_message(&mut self) -> Message {
        Message::Metadata(self.get_data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_a_primitive_stream() {
        let mut b = MetadataBuilder::new();
        b.stream("/object/shape")
            .category(Category::Primitive)
            .primitive_type(PrimitiveType::Polygon)
            .coordinate(CoordinateType::VehicleRelative);
        let data = b.get_data();
        let entry = &data.streams["/object/shape"];
        assert_eq!(entry.category, Some(Category::Primitive));
        assert_eq!(entry.primitive_type, Some(PrimitiveType::Polygon));
        assert_eq!(entry.coordinate, Some(CoordinateType::VehicleRelative));
    }

    #[test]
    fn declares_a_time_series_stream() {
        let mut b = MetadataBuilder::new();
        b.stream("/vehicle/velocity")
            .category(Category::TimeSeries)
            .scalar_type(ScalarType::Float)
            .unit("m/s");
        let data = b.get_data();
        let entry = &data.streams["/vehicle/velocity"];
        assert_eq!(entry.scalar_type, Some(ScalarType::Float));
        assert_eq!(entry.units.as_deref(), Some("m/s"));
    }

    #[test]
    fn redeclaring_a_stream_merges() {
        let mut b = MetadataBuilder::new();
        b.stream("/a").category(Category::Primitive).primitive_type(PrimitiveType::Circle);
        b.stream("/b").category(Category::Pose);
        b.stream("/a").unit("m");
        let data = b.get_data();
        let entry = &data.streams["/a"];
        assert_eq!(entry.primitive_type, Some(PrimitiveType::Circle));
        assert_eq!(entry.units.as_deref(), Some("m"));
        assert_eq!(data.streams.len(), 2);
    }

    #[test]
    fn bad_transform_is_rejected() {
        let mut b = MetadataBuilder::new();
        b.stream("/a").category(Category::Pose).transform_matrix(&[1.0, 2.0]);
        let data = b.get_data();
        assert!(data.streams["/a"].transform.is_empty());
    }

    #[test]
    fn transform_matrix_is_kept() {
        let mut identity = vec![0.0; 16];
        for i in 0..4 {
            identity[i * 4 + i] = 1.0;
        }
        let mut b = MetadataBuilder::new();
        b.stream("/a").category(Category::Pose).transform_matrix(&identity);
        let data = b.get_data();
        assert_eq!(data.streams["/a"].transform, identity);
    }

    #[test]
    fn style_before_type_is_ignored() {
        let mut b = MetadataBuilder::new();
        b.stream("/a")
            .category(Category::Primitive)
            .stream_style(StreamStyle::default())
            .primitive_type(PrimitiveType::Circle);
        let data = b.get_data();
        assert!(data.streams["/a"].stream_style.is_none());
    }

    #[test]
    fn log_info_serializes() {
        let mut b = MetadataBuilder::new();
        b.start_time(100.0).end_time(200.0);
        let data = b.get_data();
        assert_eq!(data.log_info.start_time, Some(100.0));
        assert_eq!(data.log_info.end_time, Some(200.0));
    }
}
