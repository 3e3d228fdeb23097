pub mod batch;
pub mod config;
pub mod engine;
pub mod models;
pub mod provisioning;
pub mod rates;
pub mod storage;
pub mod types;
