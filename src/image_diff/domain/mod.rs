pub mod annotator_trait;
pub mod color;
pub mod diff_engine;
pub mod diff_observer_trait;
pub mod error;
pub mod image;
pub mod image_codec_trait;
pub mod region;
pub mod region_extractor;
