pub mod assets;
pub mod details;
pub mod format;
pub mod models;

pub use assets::{CaptureAssets, ViewerVars};
pub use details::{CaptureDetails, WeatherPanel};
pub use models::*;
