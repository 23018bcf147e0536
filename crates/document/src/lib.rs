//! Artifact compositor: title, optional image, and story text as one A4 PDF.

pub mod compositor;
pub mod layout;
pub mod metrics;

pub use compositor::Compositor;
pub use layout::{plan_layout, ImagePlacement, PageLayout, PlacedLine};
