//! Shared primitives for the ledger: persistence, the database broker,
//! configuration, events, time and errors.

pub mod broker;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod output;
pub mod schemas;
pub mod store;
pub mod time;
