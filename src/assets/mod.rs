pub mod color_table;
pub mod logo;
pub mod mask;
pub mod svg;
