use crate::theme::{Style, Theme};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Primary axis along which the graph layout arranges ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "TB", alias = "TD", alias = "down")]
    TopBottom,
    #[serde(rename = "BT", alias = "up")]
    BottomTop,
    #[serde(rename = "LR", alias = "right")]
    LeftRight,
    #[serde(rename = "RL", alias = "left")]
    RightLeft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub padding: f32,
    pub spacing: f32,
    pub gutter: f32,
    pub edge_margin: f32,
    pub font: String,
    pub font_size: f32,
    pub leading: f32,
    pub line_width: f32,
    pub direction: Direction,
    /// Minimum edge length multiplier; 1 leaves edge lengths to the ranker.
    pub gravity: f32,
    pub acyclicer: String,
    pub ranker: String,
    pub zoom: f32,
    /// Marker the parser uses for qualified names; carried for the renderer.
    pub qualifier_marker: Option<String>,
    /// Run the tree relayout pass after graph layout.
    pub align_top: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            padding: 8.0,
            spacing: 40.0,
            gutter: 5.0,
            edge_margin: 0.0,
            font: "Helvetica".to_string(),
            font_size: 12.0,
            leading: 1.25,
            line_width: 3.0,
            direction: Direction::TopBottom,
            gravity: 1.0,
            acyclicer: "greedy".to_string(),
            ranker: "network-simplex".to_string(),
            zoom: 1.0,
            qualifier_marker: None,
            align_top: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub layout: LayoutConfig,
    pub theme: Theme,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    padding: Option<f32>,
    spacing: Option<f32>,
    gutter: Option<f32>,
    edge_margin: Option<f32>,
    font: Option<String>,
    font_size: Option<f32>,
    leading: Option<f32>,
    line_width: Option<f32>,
    direction: Option<Direction>,
    gravity: Option<f32>,
    acyclicer: Option<String>,
    ranker: Option<String>,
    zoom: Option<f32>,
    qualifier_marker: Option<String>,
    align_top: Option<bool>,
    styles: Option<HashMap<String, Style>>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses a JSON or JSON5 document and overlays it on the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let value: serde_json::Value = match serde_json::from_str(contents) {
        Ok(value) => value,
        Err(_) => json5::from_str(contents)?,
    };
    let parsed: ConfigFile = serde_json::from_value(value)?;
    Ok(apply_config_file(Config::default(), parsed))
}

fn apply_config_file(mut config: Config, parsed: ConfigFile) -> Config {
    let layout = &mut config.layout;
    if let Some(v) = parsed.padding {
        layout.padding = v;
    }
    if let Some(v) = parsed.spacing {
        layout.spacing = v;
    }
    if let Some(v) = parsed.gutter {
        layout.gutter = v;
    }
    if let Some(v) = parsed.edge_margin {
        layout.edge_margin = v;
    }
    if let Some(v) = parsed.font {
        layout.font = v;
    }
    if let Some(v) = parsed.font_size {
        layout.font_size = v;
    }
    if let Some(v) = parsed.leading {
        layout.leading = v;
    }
    if let Some(v) = parsed.line_width {
        layout.line_width = v;
    }
    if let Some(v) = parsed.direction {
        layout.direction = v;
    }
    if let Some(v) = parsed.gravity {
        layout.gravity = v;
    }
    if let Some(v) = parsed.acyclicer {
        layout.acyclicer = v;
    }
    if let Some(v) = parsed.ranker {
        layout.ranker = v;
    }
    if let Some(v) = parsed.zoom {
        layout.zoom = v;
    }
    if parsed.qualifier_marker.is_some() {
        layout.qualifier_marker = parsed.qualifier_marker;
    }
    if let Some(v) = parsed.align_top {
        layout.align_top = v;
    }
    if let Some(styles) = parsed.styles {
        for (kind, style) in styles {
            config.theme = config.theme.with_style(&kind, style);
        }
    }
    config
}
