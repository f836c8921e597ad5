pub mod config_gen;
pub mod defaults;
pub mod error;
pub mod generation;
pub mod import;
pub mod models;
pub mod mods;
pub mod plan;
pub mod ports;
pub mod progress;
pub mod storage;
pub mod validation;
pub mod wizard;
