pub mod naming;
pub mod render;
