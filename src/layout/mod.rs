pub mod client;
pub mod document;
pub mod encoding;
pub mod error;
pub mod presentation;
pub mod registry;
pub mod service;
pub mod types;
pub mod visual;

pub use client::{HttpLayoutApi, LayoutApi};
pub use document::{LayoutDocument, MoveDirection};
pub use error::LayoutError;
pub use presentation::PresentationState;
pub use registry::{shape, ShapeContext, TrendFallback};
pub use service::LayoutService;
pub use types::*;
pub use visual::Visual;
