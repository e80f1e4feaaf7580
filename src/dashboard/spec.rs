//! Declarative chart specs handed to the rendering layer.
//!
//! A spec is a plain JSON object. The pipeline only ever touches three
//! places in it: `data`, `title.subtext` and `color.specified`. Layout and
//! style stay whatever the chart spec was created with.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::color::ModelColorMap;

pub const PIE_DATA_ID: &str = "id0";
pub const STACKED_BAR_DATA_ID: &str = "barData";
pub const MODEL_LINE_DATA_ID: &str = "lineData";
pub const RANK_BAR_DATA_ID: &str = "rankData";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartSpec(pub Value);

impl ChartSpec {
    pub fn title_subtext(&self) -> Option<&str> {
        self.0.get("title")?.get("subtext")?.as_str()
    }

    /// Values of the first data block.
    pub fn values(&self) -> Option<&Vec<Value>> {
        self.0.get("data")?.get(0)?.get("values")?.as_array()
    }
}

/// Return a copy of `spec` with new data, subtitle and color mapping.
///
/// A spec that is not a JSON object is replaced by an object holding just
/// the three merged fields.
pub fn update_chart_spec(
    spec: &ChartSpec,
    data_id: &str,
    values: Value,
    subtext: &str,
    colors: &ModelColorMap,
) -> ChartSpec {
    let mut obj = match &spec.0 {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    obj.insert("data".to_string(), json!([{ "id": data_id, "values": values }]));

    let title = obj
        .entry("title")
        .or_insert_with(|| Value::Object(Map::new()));
    match title {
        Value::Object(t) => {
            t.insert("subtext".to_string(), Value::String(subtext.to_string()));
        }
        other => *other = json!({ "subtext": subtext }),
    }

    let color = obj
        .entry("color")
        .or_insert_with(|| Value::Object(Map::new()));
    match color {
        Value::Object(c) => {
            c.insert("specified".to_string(), json!(colors));
        }
        other => *other = json!({ "specified": colors }),
    }

    ChartSpec(Value::Object(obj))
}

// ── Initial specs ────────────────────────────────────────────

/// Model call-share donut.
pub fn pie_spec(title: &str, subtext: &str) -> ChartSpec {
    ChartSpec(json!({
        "type": "pie",
        "data": [{ "id": PIE_DATA_ID, "values": [{ "type": "null", "value": "0" }] }],
        "outerRadius": 0.8,
        "innerRadius": 0.5,
        "padAngle": 0.6,
        "valueField": "value",
        "categoryField": "type",
        "pie": {
            "style": { "cornerRadius": 10 },
            "state": {
                "hover": { "outerRadius": 0.85, "stroke": "#000", "lineWidth": 1 },
                "selected": { "outerRadius": 0.85, "stroke": "#000", "lineWidth": 1 }
            }
        },
        "title": { "visible": true, "text": title, "subtext": subtext },
        "legends": { "visible": true, "orient": "left" },
        "label": { "visible": true },
        "color": { "specified": {} }
    }))
}

/// Quota consumption stacked by model per bucket.
pub fn stacked_bar_spec(title: &str, subtext: &str) -> ChartSpec {
    ChartSpec(json!({
        "type": "bar",
        "data": [{ "id": STACKED_BAR_DATA_ID, "values": [] }],
        "xField": "Time",
        "yField": "Usage",
        "seriesField": "Model",
        "stack": true,
        "legends": { "visible": true, "selectMode": "single" },
        "title": { "visible": true, "text": title, "subtext": subtext },
        "bar": { "state": { "hover": { "stroke": "#000", "lineWidth": 1 } } },
        "color": { "specified": {} }
    }))
}

/// Call count per model over time.
pub fn model_line_spec(title: &str, subtext: &str) -> ChartSpec {
    ChartSpec(json!({
        "type": "line",
        "data": [{ "id": MODEL_LINE_DATA_ID, "values": [] }],
        "xField": "Time",
        "yField": "Count",
        "seriesField": "Model",
        "legends": { "visible": true, "selectMode": "single" },
        "title": { "visible": true, "text": title, "subtext": subtext },
        "color": { "specified": {} }
    }))
}

/// Models ranked by call count.
pub fn rank_bar_spec(title: &str, subtext: &str) -> ChartSpec {
    ChartSpec(json!({
        "type": "bar",
        "data": [{ "id": RANK_BAR_DATA_ID, "values": [] }],
        "xField": "Model",
        "yField": "Count",
        "seriesField": "Model",
        "legends": { "visible": true, "selectMode": "single" },
        "title": { "visible": true, "text": title, "subtext": subtext },
        "bar": { "state": { "hover": { "stroke": "#000", "lineWidth": 1 } } },
        "color": { "specified": {} }
    }))
}
