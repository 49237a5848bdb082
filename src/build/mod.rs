pub mod cache;
pub mod layer_builder;
pub mod plan;
