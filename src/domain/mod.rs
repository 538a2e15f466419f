//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod week;
pub mod position;
pub mod trade;
pub mod portfolio;
pub mod catalog;
pub mod snapshot;
pub mod engine;
pub mod game;
pub mod session;
pub mod auth;
pub mod config_validation;
pub mod error;
