pub mod pipeline;
pub mod router;

pub use pipeline::IngestPipeline;
pub use router::{IngestHandle, IngestRouter};
