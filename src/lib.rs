pub mod agent;
pub mod api;
pub mod config;
pub mod constants;
pub mod data;
pub mod env;
pub mod error;
pub mod gym;
pub mod history;
pub mod pipeline;
pub mod types;
pub mod utils;
