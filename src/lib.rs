pub mod ai;
pub mod api;
pub mod backend;
pub mod config;
pub mod domain;
pub mod server;
pub mod upload;

pub use self::config::Config;
