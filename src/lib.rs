pub mod app;
pub mod config;
pub mod staging;
pub mod upload;
pub mod utils;
