//! Wire data model for XVIZ v2 state updates and metadata.
//!
//! Field names match the v2 JSON schema exactly (`update_type`, `updates`,
//! `poses`, `primitives`, `time_series`, `ui_primitives`, ...); empty
//! collections and unset options are skipped so the output stays minimal.

use base64::{engine::general_purpose::STANDARD, Engine};
use hashbrown::HashMap;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::declarative_ui::UiElement;
use crate::style::{ObjectStyle, StreamStyle, StyleClass};
use crate::types::{
    Category, CoordinateType, PrimitiveType, ScalarType, TreeTableColumnType,
};

fn is_false(v: &bool) -> bool {
    !v
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapOrigin {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_origin: Option<MapOrigin>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub position: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orientation: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

/// Cross-cutting fields shared by every primitive variant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveBase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ObjectStyle>,
}

impl PrimitiveBase {
    pub fn is_empty(&self) -> bool {
        self.object_id.is_none() && self.classes.is_empty() && self.style.is_none()
    }
}

/// Flat vertex payload, or a symbolic `#/accessors/N` reference once the
/// binary encoder has externalized it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VertexData {
    Values(Vec<f64>),
    Reference(String),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<PrimitiveBase>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub vertices: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<PrimitiveBase>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub points: VertexData,
    /// RGBA bytes as base64, or an accessor reference after binary packing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<PrimitiveBase>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec<f64>,
    pub radius: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<PrimitiveBase>,
}

/// Image payload in one of three states: raw bytes from the producer,
/// base64 text when the producer asked for encoding, or a `#/images/N`
/// reference once the binary encoder has externalized the bytes.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageData {
    Raw(Vec<u8>),
    Encoded(String),
    Reference(String),
}

impl Default for ImageData {
    fn default() -> Self {
        ImageData::Raw(Vec::new())
    }
}

impl ImageData {
    pub fn is_empty(&self) -> bool {
        match self {
            ImageData::Raw(bytes) => bytes.is_empty(),
            ImageData::Encoded(text) | ImageData::Reference(text) => text.is_empty(),
        }
    }
}

// JSON always carries image data as a string: raw bytes are base64-encoded
// on the way out (the schema field is bytes-typed), encoded payloads and
// buffer references pass through verbatim.
impl Serialize for ImageData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ImageData::Raw(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            ImageData::Encoded(text) | ImageData::Reference(text) => {
                serializer.serialize_str(text)
            }
        }
    }
}

impl<'de> Deserialize<'de> for ImageData {
    fn deserialize<D>(deserializer: D) -> Result<ImageData, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer).map_err(de::Error::custom)?;
        if text.starts_with("#/") {
            Ok(ImageData::Reference(text))
        } else {
            Ok(ImageData::Encoded(text))
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub data: ImageData,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_encoded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_px: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_px: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub position: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<PrimitiveBase>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    pub position: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<PrimitiveBase>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stadium {
    pub start: Vec<f64>,
    pub end: Vec<f64>,
    pub radius: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<PrimitiveBase>,
}

/// Committed primitives for one stream, partitioned by variant kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveState {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub polygons: Vec<Polygon>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub polylines: Vec<Polyline>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<Point>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub circles: Vec<Circle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub texts: Vec<Text>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stadiums: Vec<Stadium>,
}

/// Parallel value arrays of one committed time-series record. Only the
/// array matching the sample kind is populated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesValues {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub doubles: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub int32s: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bools: Vec<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesState {
    pub timestamp: f64,
    pub object_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub streams: Vec<String>,
    pub values: TimeSeriesValues,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeTableColumn {
    pub display_text: String,
    #[serde(rename = "type")]
    pub column_type: TreeTableColumnType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeTableNode {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_values: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeTable {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<TreeTableColumn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<TreeTableNode>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UiPrimitiveState {
    pub treetable: TreeTable,
}

/// One complete timestamped frame of per-stream state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub poses: HashMap<String, Pose>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub primitives: HashMap<String, PrimitiveState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_series: Vec<TimeSeriesState>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub ui_primitives: HashMap<String, UiPrimitiveState>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateType {
    Snapshot,
    Incremental,
    CompleteState,
}

/// Full-snapshot state update. Incremental updates are wire vocabulary
/// only; the builders never produce them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub update_type: UpdateType,
    pub updates: Vec<StreamSet>,
}

/// Declaration for a single stream, amended by later calls to the same id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primitive_type: Option<PrimitiveType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scalar_type: Option<ScalarType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<CoordinateType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transform: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_style: Option<StreamStyle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub style_classes: Vec<StyleClass>,
}

impl StreamMetadata {
    /// Merge an amendment into this entry: scalar fields set on `other`
    /// overwrite, the transform is replaced when present, style classes
    /// append, and the stream style merges field-wise.
    pub fn merge_from(&mut self, other: &StreamMetadata) {
        if other.category.is_some() {
            self.category = other.category;
        }
        if other.primitive_type.is_some() {
            self.primitive_type = other.primitive_type;
        }
        if other.scalar_type.is_some() {
            self.scalar_type = other.scalar_type;
        }
        if other.coordinate.is_some() {
            self.coordinate = other.coordinate;
        }
        if other.units.is_some() {
            self.units = other.units.clone();
        }
        if other.source.is_some() {
            self.source = other.source.clone();
        }
        if !other.transform.is_empty() {
            self.transform = other.transform.clone();
        }
        match (&mut self.stream_style, &other.stream_style) {
            (Some(existing), Some(incoming)) => existing.merge_from(incoming),
            (None, Some(incoming)) => self.stream_style = Some(incoming.clone()),
            _ => {}
        }
        self.style_classes.extend(other.style_classes.iter().cloned());
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
}

impl LogInfo {
    pub fn is_empty(&self) -> bool {
        self.start_time.is_none() && self.end_time.is_none()
    }
}

/// Top-level panel entry in metadata `ui_config`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UiPanelInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub panel_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<UiElement>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub version: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub streams: HashMap<String, StreamMetadata>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub ui_config: HashMap<String, UiPanelInfo>,
    #[serde(default, skip_serializing_if = "LogInfo::is_empty")]
    pub log_info: LogInfo,
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata {
            version: "2.0.0".to_string(),
            streams: HashMap::new(),
            ui_config: HashMap::new(),
            log_info: LogInfo::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_image_data_serializes_as_base64() {
        let image = Image {
            data: ImageData::Raw(vec![1, 2, 3]),
            ..Image::default()
        };
        let value = serde_json::to_value(&image).unwrap();
        assert_eq!(value, json!({"data": "AQID"}));
    }

    #[test]
    fn image_reference_round_trips() {
        let data: ImageData = serde_json::from_value(json!("#/images/0")).unwrap();
        assert_eq!(data, ImageData::Reference("#/images/0".to_string()));
    }

    #[test]
    fn vertex_reference_serializes_as_string() {
        let points = VertexData::Reference("#/accessors/1".to_string());
        assert_eq!(serde_json::to_value(&points).unwrap(), json!("#/accessors/1"));
    }

    #[test]
    fn stream_metadata_merge_amends() {
        let mut entry = StreamMetadata {
            category: Some(Category::Primitive),
            units: Some("m".to_string()),
            ..StreamMetadata::default()
        };
        let amendment = StreamMetadata {
            primitive_type: Some(PrimitiveType::Circle),
            ..StreamMetadata::default()
        };
        entry.merge_from(&amendment);
        assert_eq!(entry.category, Some(Category::Primitive));
        assert_eq!(entry.primitive_type, Some(PrimitiveType::Circle));
        assert_eq!(entry.units.as_deref(), Some("m"));
    }

    #[test]
    fn empty_stream_set_serializes_to_empty_object() {
        let set = StreamSet::default();
        assert_eq!(serde_json::to_value(&set).unwrap(), json!({}));
    }
}
