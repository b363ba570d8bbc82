pub mod error;
pub mod intake;
pub mod models;
pub mod pipeline;

pub use error::CheckError;
pub use pipeline::CheckPipeline;
