//! Style values and the per-primitive style capability table.
//!
//! Colors are held as base64 strings because the schema types them as bytes;
//! the message envelope's unravel pass turns them back into numeric arrays
//! for JSON consumers. All style validation is advisory: a bad key warns and
//! the rest of the style is still written.

use base64::{engine::general_purpose::STANDARD, Engine};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::types::PrimitiveType;

/// Object-scoped style override attached to a single primitive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_anchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_baseline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Stream-scoped default style declared in metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_anchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_baseline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extruded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_min_pixels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_max_pixels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width_min_pixels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width_max_pixels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_pixels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_color_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_color_domain: Option<Vec<f64>>,
}

/// Named style class declared on a stream's metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleClass {
    pub name: String,
    pub style: ObjectStyle,
}

/// Color inputs arrive either as a string (`"#ffa"`) or a numeric array;
/// both are committed as base64 because the schema field is bytes-typed.
fn color_value(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(STANDARD.encode(s.as_bytes())),
        JsonValue::Array(items) => {
            let bytes: Option<Vec<u8>> = items
                .iter()
                .map(|v| v.as_u64().map(|n| n as u8))
                .collect();
            bytes.map(|b| STANDARD.encode(b))
        }
        _ => None,
    }
}

fn enum_value(value: &JsonValue) -> Option<String> {
    value.as_str().map(|s| s.to_ascii_uppercase())
}

fn pixel_value(value: &JsonValue) -> Option<u32> {
    value.as_u64().map(|n| n as u32)
}

impl ObjectStyle {
    /// Parse a style object from caller JSON. Unknown keys are reported and
    /// dropped; everything else is written.
    pub fn from_json(json: &JsonValue) -> Self {
        let mut style = ObjectStyle::default();
        let Some(map) = json.as_object() else {
            warn!("Style must be a JSON object, got: {json}");
            return style;
        };
        let mut invalid = Vec::new();
        for (key, value) in map {
            match key.as_str() {
                "fill_color" => style.fill_color = color_value(value),
                "stroke_color" => style.stroke_color = color_value(value),
                "stroke_width" => style.stroke_width = value.as_f64(),
                "radius" => style.radius = value.as_f64(),
                "text_size" => style.text_size = value.as_f64(),
                "text_rotation" => style.text_rotation = value.as_f64(),
                "text_anchor" => style.text_anchor = enum_value(value),
                "text_baseline" => style.text_baseline = enum_value(value),
                "height" => style.height = value.as_f64(),
                _ => invalid.push(key.as_str()),
            }
        }
        if !invalid.is_empty() {
            warn!("Keys: {} are invalid in a style object.", invalid.join(", "));
        }
        style
    }

    /// Names of the fields that are set, for capability validation.
    pub fn set_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.fill_color.is_some() {
            fields.push("fill_color");
        }
        if self.stroke_color.is_some() {
            fields.push("stroke_color");
        }
        if self.stroke_width.is_some() {
            fields.push("stroke_width");
        }
        if self.radius.is_some() {
            fields.push("radius");
        }
        if self.text_size.is_some() {
            fields.push("text_size");
        }
        if self.text_rotation.is_some() {
            fields.push("text_rotation");
        }
        if self.text_anchor.is_some() {
            fields.push("text_anchor");
        }
        if self.text_baseline.is_some() {
            fields.push("text_baseline");
        }
        if self.height.is_some() {
            fields.push("height");
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.set_fields().is_empty()
    }
}

impl StreamStyle {
    pub fn from_json(json: &JsonValue) -> Self {
        let mut style = StreamStyle::default();
        let Some(map) = json.as_object() else {
            warn!("Stream style must be a JSON object, got: {json}");
            return style;
        };
        let mut invalid = Vec::new();
        for (key, value) in map {
            match key.as_str() {
                "fill_color" => style.fill_color = color_value(value),
                "stroke_color" => style.stroke_color = color_value(value),
                "stroke_width" => style.stroke_width = value.as_f64(),
                "radius" => style.radius = value.as_f64(),
                "text_size" => style.text_size = value.as_f64(),
                "text_rotation" => style.text_rotation = value.as_f64(),
                "text_anchor" => style.text_anchor = enum_value(value),
                "text_baseline" => style.text_baseline = enum_value(value),
                "height" => style.height = value.as_f64(),
                "opacity" => style.opacity = value.as_f64(),
                "stroked" => style.stroked = value.as_bool(),
                "filled" => style.filled = value.as_bool(),
                "extruded" => style.extruded = value.as_bool(),
                "radius_min_pixels" => style.radius_min_pixels = pixel_value(value),
                "radius_max_pixels" => style.radius_max_pixels = pixel_value(value),
                "stroke_width_min_pixels" => style.stroke_width_min_pixels = pixel_value(value),
                "stroke_width_max_pixels" => style.stroke_width_max_pixels = pixel_value(value),
                "radius_pixels" => style.radius_pixels = pixel_value(value),
                "font_weight" => style.font_weight = pixel_value(value),
                "font_family" => style.font_family = value.as_str().map(String::from),
                "point_color_mode" => style.point_color_mode = enum_value(value),
                "point_color_domain" => {
                    style.point_color_domain = value
                        .as_array()
                        .map(|a| a.iter().filter_map(|v| v.as_f64()).collect())
                }
                _ => invalid.push(key.as_str()),
            }
        }
        if !invalid.is_empty() {
            warn!(
                "Keys: {} are invalid in a stream style.",
                invalid.join(", ")
            );
        }
        style
    }

    pub fn set_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.fill_color.is_some() {
            fields.push("fill_color");
        }
        if self.stroke_color.is_some() {
            fields.push("stroke_color");
        }
        if self.stroke_width.is_some() {
            fields.push("stroke_width");
        }
        if self.radius.is_some() {
            fields.push("radius");
        }
        if self.text_size.is_some() {
            fields.push("text_size");
        }
        if self.text_rotation.is_some() {
            fields.push("text_rotation");
        }
        if self.text_anchor.is_some() {
            fields.push("text_anchor");
        }
        if self.text_baseline.is_some() {
            fields.push("text_baseline");
        }
        if self.height.is_some() {
            fields.push("height");
        }
        if self.opacity.is_some() {
            fields.push("opacity");
        }
        if self.stroked.is_some() {
            fields.push("stroked");
        }
        if self.filled.is_some() {
            fields.push("filled");
        }
        if self.extruded.is_some() {
            fields.push("extruded");
        }
        if self.radius_min_pixels.is_some() {
            fields.push("radius_min_pixels");
        }
        if self.radius_max_pixels.is_some() {
            fields.push("radius_max_pixels");
        }
        if self.stroke_width_min_pixels.is_some() {
            fields.push("stroke_width_min_pixels");
        }
        if self.stroke_width_max_pixels.is_some() {
            fields.push("stroke_width_max_pixels");
        }
        if self.radius_pixels.is_some() {
            fields.push("radius_pixels");
        }
        if self.font_weight.is_some() {
            fields.push("font_weight");
        }
        if self.font_family.is_some() {
            fields.push("font_family");
        }
        if self.point_color_mode.is_some() {
            fields.push("point_color_mode");
        }
        if self.point_color_domain.is_some() {
            fields.push("point_color_domain");
        }
        fields
    }

    /// Merge another stream style into this one; fields set on `other` win.
    pub fn merge_from(&mut self, other: &StreamStyle) {
        macro_rules! take {
            ($field:ident) => {
                if other.$field.is_some() {
                    self.$field = other.$field.clone();
                }
            };
        }
        take!(fill_color);
        take!(stroke_color);
        take!(stroke_width);
        take!(radius);
        take!(text_size);
        take!(text_rotation);
        take!(text_anchor);
        take!(text_baseline);
        take!(height);
        take!(opacity);
        take!(stroked);
        take!(filled);
        take!(extruded);
        take!(radius_min_pixels);
        take!(radius_max_pixels);
        take!(stroke_width_min_pixels);
        take!(stroke_width_max_pixels);
        take!(radius_pixels);
        take!(font_weight);
        take!(font_family);
        take!(point_color_mode);
        take!(point_color_domain);
    }
}

/// Capability table: primitive type -> (style field, object scope allowed).
/// A field absent from a type's row is not a valid style for that type at
/// all; a `false` entry may only be set stream-wide in metadata.
const STYLE_CAPABILITIES: &[(PrimitiveType, &[(&str, bool)])] = &[
    (
        PrimitiveType::Circle,
        &[
            ("opacity", false),
            ("stroked", false),
            ("filled", false),
            ("stroke_color", true),
            ("fill_color", true),
            ("radius", true),
            ("radius_min_pixels", false),
            ("radius_max_pixels", false),
            ("stroke_width", true),
            ("stroke_width_min_pixels", false),
            ("stroke_width_max_pixels", false),
        ],
    ),
    (PrimitiveType::Image, &[]),
    (
        PrimitiveType::Point,
        &[
            ("opacity", false),
            ("fill_color", false),
            ("radius_pixels", false),
            ("point_color_mode", false),
            ("point_color_domain", false),
        ],
    ),
    (
        PrimitiveType::Polygon,
        &[
            ("stroke_color", true),
            ("fill_color", true),
            ("stroke_width", true),
            ("stroke_width_min_pixels", false),
            ("stroke_width_max_pixels", false),
            ("height", true),
            ("opacity", false),
            ("stroked", false),
            ("filled", false),
            ("extruded", false),
        ],
    ),
    (
        PrimitiveType::Polyline,
        &[
            ("opacity", false),
            ("stroke_color", true),
            ("stroke_width", true),
            ("stroke_width_min_pixels", false),
            ("stroke_width_max_pixels", false),
        ],
    ),
    (
        PrimitiveType::Text,
        &[
            ("opacity", false),
            ("font_family", false),
            ("font_weight", false),
            ("text_size", true),
            ("text_rotation", true),
            ("text_anchor", true),
            ("text_baseline", true),
            ("fill_color", true),
        ],
    ),
    (
        PrimitiveType::Stadium,
        &[
            ("opacity", false),
            ("fill_color", true),
            ("radius", true),
            ("radius_min_pixels", false),
            ("radius_max_pixels", false),
        ],
    ),
];

fn capabilities_for(primitive_type: PrimitiveType) -> Option<&'static [(&'static str, bool)]> {
    STYLE_CAPABILITIES
        .iter()
        .find(|(t, _)| *t == primitive_type)
        .map(|(_, caps)| *caps)
}

/// Check the set style fields against the capability table. Advisory only:
/// callers keep the value regardless of the outcome.
pub fn validate_style(primitive_type: PrimitiveType, fields: &[&str], object_scope: bool) {
    let Some(caps) = capabilities_for(primitive_type) else {
        warn!("Type: {primitive_type} is not supported currently.");
        return;
    };
    let mut unknown = Vec::new();
    let mut stream_only = Vec::new();
    for field in fields {
        match caps.iter().find(|(name, _)| name == field) {
            None => unknown.push(*field),
            Some((_, per_object)) => {
                if object_scope && !per_object {
                    stream_only.push(*field);
                }
            }
        }
    }
    if !unknown.is_empty() {
        warn!(
            "Primitive type: {primitive_type} does not have these style options: {}.",
            unknown.join(", ")
        );
    }
    if !stream_only.is_empty() {
        warn!(
            "Primitive type: {primitive_type} cannot set these style options: {} per object. \
             You should set these styles in the metadata.",
            stream_only.join(", ")
        );
    }
}
