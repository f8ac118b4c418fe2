use semgraph_layout::{LayoutConfig, LayoutMode, layout_json};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphLayoutOptions {
    mode: Option<LayoutMode>,
    node_width: Option<f32>,
    node_height: Option<f32>,
    inter_level_spacing: Option<f32>,
    intra_level_spacing: Option<f32>,
    token_level_spacing: Option<f32>,
}

fn build_layout_config(options: &GraphLayoutOptions) -> LayoutConfig {
    let mut config = LayoutConfig::default();
    if let Some(value) = options.node_width {
        config.node_width = value;
    }
    if let Some(value) = options.node_height {
        config.node_height = value;
    }
    if let Some(value) = options.inter_level_spacing {
        config.inter_level_spacing = value;
    }
    if let Some(value) = options.intra_level_spacing {
        config.intra_level_spacing = value;
    }
    if let Some(value) = options.token_level_spacing {
        config.token_level_spacing = value;
    }
    config
}

fn layout_with_options(json: &str, options: GraphLayoutOptions) -> Result<String, String> {
    let config = build_layout_config(&options);
    layout_json(json, options.mode.unwrap_or_default(), &config).map_err(|error| format!("{error:#}"))
}

#[wasm_bindgen]
pub fn layout_graph(json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<GraphLayoutOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        GraphLayoutOptions::default()
    };

    layout_with_options(json, options).map_err(|error| JsValue::from_str(&error))
}
