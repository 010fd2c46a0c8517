pub mod access;
pub mod analytics;
pub mod board;
pub mod filter;
