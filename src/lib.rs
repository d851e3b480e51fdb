//! anchorkit - scene loading and configuration for the layout engine CLI.

pub mod config;
pub mod scene;

pub use config::AppConfig;
pub use scene::{SceneNode, StackSpec};
