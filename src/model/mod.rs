pub mod instrument;
pub mod layer;
pub mod request;
pub mod selection;
