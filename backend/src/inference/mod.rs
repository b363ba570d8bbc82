pub mod client;

pub use client::{LocalInferenceClient, LocalInferenceError};
