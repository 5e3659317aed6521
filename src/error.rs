use thiserror::Error;

/// Everything that can go wrong while setting up or drawing the scene.
#[derive(Debug, Error)]
pub enum VizError {
    #[error("WebGL2 not available")]
    WebGl2Unavailable,

    #[error("element not found: {0}")]
    MissingElement(String),

    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: &'static str, log: String },

    #[error("program failed to link: {0}")]
    ProgramLink(String),

    #[error("attribute missing from program: {0}")]
    MissingAttribute(String),

    #[error("uniform missing from program: {0}")]
    MissingUniform(String),

    #[error("failed to create {0}")]
    ResourceCreation(&'static str),

    #[error("bad config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, VizError>;

impl From<VizError> for wasm_bindgen::JsValue {
    fn from(err: VizError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}
