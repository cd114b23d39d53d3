pub mod cache;
pub mod error;
pub mod table;
pub mod utils;
