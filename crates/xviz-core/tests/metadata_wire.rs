use hashbrown::HashMap;
use serde_json::json;
use xviz_core::{
    Category, MetadataBuilder, ObjectStyle, PrimitiveType, StreamStyle, UiBuilder, UiElement,
};

#[test]
fn metadata_message_carries_streams_ui_and_log_info() {
    let mut panel = UiBuilder::new();
    panel.child(UiElement::Metric {
        streams: vec!["/vehicle/velocity".to_string()],
        title: Some("Velocity".to_string()),
        description: None,
    });
    let mut panels = HashMap::new();
    panels.insert("Vehicle".to_string(), panel);

    let mut b = MetadataBuilder::new();
    b.stream("/vehicle_pose").category(Category::Pose);
    b.start_time(1000.0).end_time(1060.0).ui(panels);

    let object = b.get_message().to_object().unwrap();
    assert_eq!(object["type"], "xviz/metadata");

    let data = &object["data"];
    assert_eq!(data["version"], "2.0.0");
    assert_eq!(data["streams"]["/vehicle_pose"]["category"], "POSE");
    assert_eq!(data["log_info"]["start_time"], json!(1000.0));
    assert_eq!(data["log_info"]["end_time"], json!(1060.0));

    let panel = &data["ui_config"]["Vehicle"];
    assert_eq!(panel["name"], "Vehicle");
    assert_eq!(panel["type"], "panel");
    assert_eq!(panel["children"][0]["type"], "metric");
    assert_eq!(panel["children"][0]["streams"], json!(["/vehicle/velocity"]));
}

#[test]
fn stream_styles_unravel_to_numeric_arrays() {
    let style = StreamStyle::from_json(&json!({
        "fill_color": [200, 0, 0, 128],
        "stroked": false
    }));
    let class = ObjectStyle::from_json(&json!({"fill_color": "#fa0"}));

    let mut b = MetadataBuilder::new();
    b.stream("/object/shape")
        .category(Category::Primitive)
        .primitive_type(PrimitiveType::Polygon)
        .stream_style(style)
        .style_class("strong", class);

    let object = b.get_message().to_object().unwrap();
    let entry = &object["data"]["streams"]["/object/shape"];
    assert_eq!(entry["stream_style"]["fill_color"], json!([200, 0, 0, 128]));
    assert_eq!(entry["stream_style"]["stroked"], json!(false));
    assert_eq!(entry["style_classes"][0]["name"], "strong");
    // "#fa0" as raw bytes.
    assert_eq!(
        entry["style_classes"][0]["style"]["fill_color"],
        json!([0x23, 0x66, 0x61, 0x30])
    );
}

#[test]
fn transform_matrix_serializes_flat() {
    let matrix: Vec<f64> = (0..16).map(f64::from).collect();
    let mut b = MetadataBuilder::new();
    b.stream("/lidar").category(Category::Primitive)
        .primitive_type(PrimitiveType::Point)
        .transform_matrix(&matrix);

    let object = b.get_message().to_object().unwrap();
    let transform = &object["data"]["streams"]["/lidar"]["transform"];
    assert_eq!(transform.as_array().map(Vec::len), Some(16));
    assert_eq!(transform[5], json!(5.0));
}
