pub mod classify;
pub mod prompt;

pub use classify::classify;
pub use prompt::synthesize;
