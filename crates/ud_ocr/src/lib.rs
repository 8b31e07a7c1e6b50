pub mod engine;
pub mod source;
pub mod types;

pub use engine::*;
pub use source::PaddleOcrSource;
pub use types::*;

/// Default directory (relative to the working directory) holding the model files.
pub const DEFAULT_MODELS_DIR: &str = "models";
