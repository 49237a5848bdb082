pub mod mapper;
pub mod padding;
pub mod roi;
