pub mod config;
pub mod keywords;
