//! Business logic for scheduling reviews.
//!
//! Each stage is a plain function or small trait so it can be tested in
//! isolation; `pipeline` strings them together.

pub mod composer;
pub mod notifier;
pub mod pipeline;
pub mod reviewer;
pub mod window;

pub use notifier::{ChatNotifier, Notifier};
pub use pipeline::{PipelineOutcome, PipelineSettings, PipelineStage, SchedulingPipeline};
