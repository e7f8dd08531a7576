pub mod annotator;
pub mod error;
pub mod image_codec;
pub mod tracing_observer;
