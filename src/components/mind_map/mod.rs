//! Dual-layer mind map visualization.
//!
//! The outer layer shows group roots with aggregated connections; the inner
//! layer shows the descendants of one active parent. Layer changes cross-fade
//! through ghost nodes while a force simulation settles the result.

mod component;
pub mod config;
pub mod document;
pub mod error;
pub mod interaction;
mod render;
pub mod renderer;
pub mod resolver;
pub mod session;
pub mod store;
pub mod tags;
pub mod transition;
pub mod types;

pub use component::MindMapCanvas;
pub use config::VisualizationConfig;
pub use error::{Error, Result};
pub use session::VisualizationSession;
pub use types::{ConnectionMode, Edge, Layer, LayerViewState, MindMap, Node};
