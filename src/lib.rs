pub mod app;
pub mod cli;
pub mod config;
pub mod decode;
pub mod errors;
pub mod export;
pub mod gmail;
pub mod oauth;
pub mod types;
