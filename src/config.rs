use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;

/// Strategy used to assign nodes to levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Levels by anchor span width.
    #[default]
    Hierarchical,
    /// Levels by number of reachable descendants.
    Tree,
    /// A single row of nodes above the token row.
    Flat,
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hierarchical => "hierarchical",
            Self::Tree => "tree",
            Self::Flat => "flat",
        })
    }
}

impl FromStr for LayoutMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hierarchical" | "1" => Ok(Self::Hierarchical),
            "tree" | "tree-like" | "2" => Ok(Self::Tree),
            "flat" | "3" => Ok(Self::Flat),
            other => Err(anyhow::anyhow!("unknown layout mode `{other}`")),
        }
    }
}

/// Geometry constants for one layout run, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub node_height: f32,
    pub node_width: f32,
    /// Vertical gap between two node levels.
    pub inter_level_spacing: f32,
    /// Horizontal gap between two columns.
    pub intra_level_spacing: f32,
    /// Distance from the lowest level to the token row.
    pub token_level_spacing: f32,
    /// How far inside the neighbouring column a curved edge may bend.
    pub curve_clamp_inset: f32,
    pub same_row_degree: f32,
    pub default_degree: f32,
    /// Curvature used to route around nodes stacked in the same column.
    pub detour_degree: f32,
    /// Upper bound on tokens synthesised for anchors past the token list.
    pub max_missing_tokens: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_height: 40.0,
            node_width: 80.0,
            inter_level_spacing: 80.0,
            intra_level_spacing: 50.0,
            token_level_spacing: 140.0,
            curve_clamp_inset: 25.0,
            same_row_degree: 0.25,
            default_degree: 0.2,
            detour_degree: 0.4,
            max_missing_tokens: 1024,
        }
    }
}

impl LayoutConfig {
    /// Horizontal distance between the origins of two adjacent columns.
    pub fn column_width(&self) -> f32 {
        self.intra_level_spacing + self.node_width
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub layout: LayoutConfig,
    pub mode: LayoutMode,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    mode: Option<String>,
    layout: Option<LayoutConfig>,
}

/// Loads a JSON5 config file, falling back to defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let parsed = parse_config(&contents)
        .with_context(|| format!("invalid config file {}", path.display()))?;

    if let Some(mode) = parsed.mode.as_deref() {
        config.mode = mode.parse()?;
    }
    if let Some(layout) = parsed.layout {
        config.layout = layout;
    }
    Ok(config)
}

fn parse_config(contents: &str) -> anyhow::Result<ConfigFile> {
    if contents.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    Ok(json5::from_str(contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json5_with_partial_layout() {
        let parsed = parse_config(
            r#"{
                // tighter columns
                mode: "tree",
                layout: { nodeWidth: 60, intraLevelSpacing: 20, },
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.mode.as_deref(), Some("tree"));
        let layout = parsed.layout.unwrap();
        assert_eq!(layout.node_width, 60.0);
        assert_eq!(layout.intra_level_spacing, 20.0);
        assert_eq!(layout.node_height, 40.0);
        assert_eq!(layout.column_width(), 80.0);
    }

    #[test]
    fn mode_accepts_visualisation_format_numbers() {
        assert_eq!("2".parse::<LayoutMode>().unwrap(), LayoutMode::Tree);
        assert_eq!("Flat".parse::<LayoutMode>().unwrap(), LayoutMode::Flat);
        assert!("radial".parse::<LayoutMode>().is_err());
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.mode, LayoutMode::Hierarchical);
    }
}
