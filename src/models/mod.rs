mod project;
mod stats;

pub use project::{Project, ProjectType, Quality};
pub use stats::Stats;
