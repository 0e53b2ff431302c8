pub mod cli;
pub mod input;
pub mod logging;
pub mod render;
