pub mod catalog;
pub mod cli;
pub mod error;
pub mod github;
pub mod models;
pub mod sync;
pub mod types;
