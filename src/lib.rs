// Library for tests and binaries to access modules

pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod record_repo;
pub mod retention_worker;
pub mod routes;
pub mod stats;
pub mod version;
