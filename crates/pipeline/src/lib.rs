//! Pipeline orchestrator.
//!
//! Three independent stage operations (story, image, document), each taking
//! the authenticated caller. No stage calls another; callers compose them.

pub mod orchestrator;
pub mod timeouts;

pub use orchestrator::{StoryOutcome, StoryPipeline};
pub use timeouts::{StageTimeouts, IMAGE_STAGE_GRACE_SECS};
