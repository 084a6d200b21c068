//! Calculator configuration, loadable from TOML

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::layout::Size;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalcConfig {
    pub resolver: ResolverConfig,
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Deepest recursion level expanded before a branch is cut.
    pub max_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig { max_depth: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Horizontal gap between nodes of one rank.
    pub node_sep: f64,
    /// Vertical gap between ranks.
    pub rank_sep: f64,
    /// Size assumed for nodes the UI has not measured yet.
    pub default_node_size: Size,
    /// Margin added around the graph bounds when fitting the viewport.
    pub padding: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            node_sep: 50.0,
            rank_sep: 80.0,
            default_node_size: Size { width: 180.0, height: 60.0 },
            padding: 40.0,
        }
    }
}

impl CalcConfig {
    pub fn from_toml_str(s: &str) -> Result<CalcConfig> {
        toml::from_str(s).context("invalid calculator config")
    }

    pub fn load(path: &Path) -> Result<CalcConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = CalcConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, CalcConfig::default());
        assert_eq!(cfg.resolver.max_depth, 50);
    }

    #[test]
    fn partial_tables_override_fields() {
        let cfg = CalcConfig::from_toml_str(
            r#"
            [resolver]
            max_depth = 8

            [layout]
            rank_sep = 120.0
            default_node_size = { width = 100.0, height = 40.0 }
            "#,
        )
        .unwrap();
        assert_eq!(cfg.resolver.max_depth, 8);
        assert_eq!(cfg.layout.rank_sep, 120.0);
        assert_eq!(cfg.layout.node_sep, 50.0);
        assert_eq!(cfg.layout.default_node_size.width, 100.0);
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(CalcConfig::from_toml_str("[resolver]\nmax_depth = \"deep\"").is_err());
    }
}
