pub mod commentary;
pub mod config;
pub mod images;
pub mod input;
pub mod tui;
