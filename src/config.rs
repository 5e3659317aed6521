//! Run configuration.
//!
//! The page may carry a TOML block:
//!
//! ```html
//! <script type="text/toml" id="viz-config">
//! nodes = 5000
//! cluster = "square"
//! </script>
//! ```
//!
//! Anything left out falls back to its default.

use serde::Deserialize;

use crate::error::{Result, VizError};
use crate::layout::Cluster;

/// Id of the element holding the TOML config.
pub const CONFIG_ELEMENT_ID: &str = "viz-config";

/// Most nodes a scene may hold.
pub const MAX_NODES: usize = u16::MAX as usize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VizConfig {
    /// Total node count, central cluster included.
    #[serde(default = "default_nodes")]
    pub nodes: usize,

    #[serde(default)]
    pub cluster: Cluster,

    /// Seed for node colours.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Keep redrawing with the camera circling the scene.
    #[serde(default)]
    pub spin: bool,

    #[serde(default = "default_atlas_url")]
    pub atlas_url: String,

    #[serde(default = "default_canvas_id")]
    pub canvas_id: String,

    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 4],
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
            cluster: Cluster::default(),
            seed: default_seed(),
            spin: false,
            atlas_url: default_atlas_url(),
            canvas_id: default_canvas_id(),
            clear_color: default_clear_color(),
        }
    }
}

fn default_nodes() -> usize {
    2000
}

fn default_seed() -> u64 {
    0x5eed
}

fn default_atlas_url() -> String {
    "icons/_atlas.png".to_string()
}

fn default_canvas_id() -> String {
    "c".to_string()
}

fn default_clear_color() -> [f32; 4] {
    [0.1, 0.1, 0.1, 1.0]
}

impl VizConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: VizConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.nodes < self.cluster.node_count() {
            return Err(VizError::InvalidConfig(format!(
                "nodes = {} is smaller than the {} node cluster",
                self.nodes,
                self.cluster.node_count()
            )));
        }
        if self.nodes > MAX_NODES {
            return Err(VizError::InvalidConfig(format!(
                "nodes = {} exceeds the limit of {MAX_NODES}",
                self.nodes
            )));
        }
        if self.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(VizError::InvalidConfig(
                "clear_color components must be within 0..=1".to_string(),
            ));
        }
        Ok(())
    }
}
