pub mod editor;
pub mod handlers;
pub mod picture;
pub mod types;
