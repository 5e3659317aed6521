#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

//! Renders a synthetic 3D graph in WebGL2: nodes as billboarded icon
//! sprites, transactions as camera-facing lines with arrowheads.
//!
//! Scene construction, attribute packing and the line geometry are plain
//! Rust and build on any target. The browser side lives in the `wasm`
//! module and only builds for `wasm32`.

pub mod atlas;
#[cfg(not(target_arch = "wasm32"))]
pub mod atlas_image;
pub mod camera;
pub mod config;
pub mod error;
pub mod layout;
pub mod nodes;
pub mod shader;
pub mod transactions;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use config::VizConfig;
use layout::Graph;

/// The scene described by `config`.
pub fn build_graph(config: &VizConfig) -> Graph {
    let mut rng = SmallRng::seed_from_u64(config.seed);
    layout::sphere_builder(config.nodes, config.cluster, &mut rng)
}

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
mod wasm {
    use wasm_bindgen::prelude::*;

    use crate::config::{VizConfig, CONFIG_ELEMENT_ID};
    use crate::error::VizError;

    mod gl;
    mod input;
    mod line_renderer;
    mod node_renderer;
    mod render;

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();

        let window = web_sys::window().ok_or(VizError::MissingElement("window".into()))?;
        let document = window
            .document()
            .ok_or(VizError::MissingElement("document".into()))?;

        let config = match document
            .get_element_by_id(CONFIG_ELEMENT_ID)
            .and_then(|element| element.text_content())
        {
            Some(source) => VizConfig::from_toml_str(&source)?,
            None => VizConfig::default(),
        };

        if document.get_element_by_id(&config.canvas_id).is_none() {
            log::warn!("no #{} canvas on the page; call render_into to draw", config.canvas_id);
            return Ok(());
        }
        start_with(&config)
    }

    /// Draw into the canvas named by `config_toml` (a TOML document in the
    /// same format as the page's config block).
    #[wasm_bindgen]
    pub fn render_into(config_toml: &str) -> Result<(), JsValue> {
        let config = VizConfig::from_toml_str(config_toml)?;
        start_with(&config)
    }

    fn start_with(config: &VizConfig) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or(VizError::MissingElement("window".into()))?;
        let document = window
            .document()
            .ok_or(VizError::MissingElement("document".into()))?;
        let canvas = document
            .get_element_by_id(&config.canvas_id)
            .ok_or_else(|| VizError::MissingElement(format!("#{}", config.canvas_id)))?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;

        let graph = crate::build_graph(config);
        log::info!(
            "nodes: {}, transactions: {}",
            graph.nodes.len(),
            graph.transactions.len()
        );

        render::start(canvas, config, &graph)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::render_into;
