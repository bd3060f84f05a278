pub mod api;
pub mod archive;
pub mod config;
pub mod connection;
pub mod errors;
pub mod paths;
pub mod storage;
pub mod transactions;
