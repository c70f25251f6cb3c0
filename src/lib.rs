// Library for tests to access modules

pub mod aggregation;
pub mod aggregation_worker;
pub mod artifact_repo;
pub mod config;
pub mod error;
pub mod files;
pub mod forwarder;
pub mod models;
pub mod report;
pub mod retention;
pub mod routes;
pub mod snapshot_repo;
