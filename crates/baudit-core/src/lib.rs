pub mod config;
pub mod logging;

pub mod audit;
pub mod bucket;
pub mod checksum;
pub mod planner;
pub mod record_db;
pub mod retry;
pub mod verifier;
