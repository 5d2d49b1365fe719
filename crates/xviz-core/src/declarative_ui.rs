//! Declarative UI tree for metadata `ui_config`.
//!
//! One tagged enum per component kind with owned children; the JSON tag is
//! the lowercase `type` field the XVIZ declarative UI schema uses.

use hashbrown::HashMap;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::data::UiPanelInfo;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutType {
    Vertical,
    Horizontal,
}

/// One declarative UI component. Containers and panels own their children
/// directly; there is no shared-pointer ambiguity in the tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UiElement {
    Panel {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        layout: Option<LayoutType>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<UiElement>,
    },
    Container {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        layout: Option<LayoutType>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<UiElement>,
    },
    Metric {
        streams: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Video {
        cameras: Vec<String>,
    },
    Plot {
        #[serde(rename = "independentVariable", skip_serializing_if = "Option::is_none")]
        independent_variable: Option<String>,
        #[serde(
            rename = "dependentVariables",
            default,
            skip_serializing_if = "Vec::is_empty"
        )]
        dependent_variables: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Table {
        stream: String,
        #[serde(rename = "displayObjectId", default)]
        display_object_id: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl UiElement {
    /// Advisory shape checks: a metric without streams or a video without
    /// cameras still serializes, but the producer is told about it.
    pub fn validate(&self) {
        match self {
            UiElement::Metric { streams, .. } if streams.is_empty() => {
                warn!("Metric component should have streams.");
            }
            UiElement::Video { cameras } if cameras.is_empty() => {
                warn!("Video component should have cameras.");
            }
            UiElement::Plot {
                independent_variable: Some(_),
                dependent_variables,
                ..
            } if dependent_variables.is_empty() => {
                warn!("Plot with an independent variable should have dependent variables.");
            }
            UiElement::Panel { children, .. } | UiElement::Container { children, .. } => {
                for child in children {
                    child.validate();
                }
            }
            _ => {}
        }
    }
}

/// Accumulates the UI elements for one named panel of `ui_config`.
#[derive(Clone, Debug, Default)]
pub struct UiBuilder {
    children: Vec<UiElement>,
}

impl UiBuilder {
    pub fn new() -> Self {
        UiBuilder::default()
    }

    pub fn child(&mut self, element: UiElement) -> &mut Self {
        element.validate();
        self.children.push(element);
        self
    }

    pub fn get_ui(&self) -> Vec<UiElement> {
        self.children.clone()
    }
}

/// Turn per-panel builders into the `ui_config` map of metadata.
pub fn panels_to_ui_config(panels: &HashMap<String, UiBuilder>) -> HashMap<String, UiPanelInfo> {
    panels
        .iter()
        .map(|(name, builder)| {
            (
                name.clone(),
                UiPanelInfo {
                    name: name.clone(),
                    panel_type: "panel".to_string(),
                    children: builder.get_ui(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn elements_carry_lowercase_type_tags() {
        let metric = UiElement::Metric {
            streams: vec!["/vehicle/velocity".to_string()],
            title: Some("Velocity".to_string()),
            description: None,
        };
        assert_eq!(
            serde_json::to_value(&metric).unwrap(),
            json!({
                "type": "metric",
                "streams": ["/vehicle/velocity"],
                "title": "Velocity"
            })
        );
    }

    #[test]
    fn containers_own_their_children() {
        let container = UiElement::Container {
            name: "left".to_string(),
            layout: Some(LayoutType::Vertical),
            children: vec![UiElement::Video {
                cameras: vec!["front".to_string()],
            }],
        };
        let value = serde_json::to_value(&container).unwrap();
        assert_eq!(value["children"][0]["type"], json!("video"));
        assert_eq!(value["layout"], json!("VERTICAL"));
    }
}
