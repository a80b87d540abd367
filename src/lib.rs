// Library for tests to access modules

pub mod aggregator;
pub mod commands;
pub mod config;
pub mod correlate;
pub mod device_repo;
pub mod error;
pub mod hub;
pub mod models;
pub mod normalize;
pub mod query;
pub mod routes;
pub mod worker;
