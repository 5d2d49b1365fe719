//! Wire-level enums for the XVIZ v2 schema.
//!
//! Every variant serializes under its SCREAMING_SNAKE_CASE wire name so the
//! JSON output stays interoperable with existing XVIZ consumers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared category of a stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Pose,
    Primitive,
    TimeSeries,
    Variable,
    UiPrimitive,
    FutureInstance,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pose => "POSE",
            Category::Primitive => "PRIMITIVE",
            Category::TimeSeries => "TIME_SERIES",
            Category::Variable => "VARIABLE",
            Category::UiPrimitive => "UI_PRIMITIVE",
            Category::FutureInstance => "FUTURE_INSTANCE",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometry kind carried by a primitive stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrimitiveType {
    Circle,
    Image,
    Point,
    Polygon,
    Polyline,
    Stadium,
    Text,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 7] = [
        PrimitiveType::Circle,
        PrimitiveType::Image,
        PrimitiveType::Point,
        PrimitiveType::Polygon,
        PrimitiveType::Polyline,
        PrimitiveType::Stadium,
        PrimitiveType::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::Circle => "CIRCLE",
            PrimitiveType::Image => "IMAGE",
            PrimitiveType::Point => "POINT",
            PrimitiveType::Polygon => "POLYGON",
            PrimitiveType::Polyline => "POLYLINE",
            PrimitiveType::Stadium => "STADIUM",
            PrimitiveType::Text => "TEXT",
        }
    }

    /// Comma-joined list of every option, used by metadata warnings.
    pub fn option_names() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value kind carried by a time-series or variable stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScalarType {
    Float,
    Int32,
    String,
    Bool,
}

impl ScalarType {
    pub const ALL: [ScalarType; 4] = [
        ScalarType::Float,
        ScalarType::Int32,
        ScalarType::String,
        ScalarType::Bool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::Float => "FLOAT",
            ScalarType::Int32 => "INT32",
            ScalarType::String => "STRING",
            ScalarType::Bool => "BOOL",
        }
    }

    pub fn option_names() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coordinate frame a stream's geometry is expressed in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoordinateType {
    Identity,
    Geographic,
    VehicleRelative,
    Dynamic,
}

/// Kind of declarative UI primitive. TREETABLE is the only kind XVIZ defines.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiPrimitiveType {
    Treetable,
}

/// Column type inside a treetable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TreeTableColumnType {
    Int32,
    Double,
    String,
    Boolean,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_use_wire_names() {
        assert_eq!(
            serde_json::to_value(Category::UiPrimitive).unwrap(),
            serde_json::json!("UI_PRIMITIVE")
        );
        assert_eq!(
            serde_json::to_value(PrimitiveType::Polyline).unwrap(),
            serde_json::json!("POLYLINE")
        );
        assert_eq!(
            serde_json::to_value(ScalarType::Int32).unwrap(),
            serde_json::json!("INT32")
        );
        assert_eq!(
            serde_json::to_value(UiPrimitiveType::Treetable).unwrap(),
            serde_json::json!("TREETABLE")
        );
    }

    #[test]
    fn option_names_enumerate_all_variants() {
        let names = PrimitiveType::option_names();
        for t in PrimitiveType::ALL {
            assert!(names.contains(t.as_str()));
        }
    }
}
