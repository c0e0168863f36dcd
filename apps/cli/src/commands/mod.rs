//! Command implementations for the mlserve CLI.

pub mod models;
mod output;
pub mod service;
