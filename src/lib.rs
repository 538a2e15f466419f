//! tradebuddy: a paper-trading game that recommends RSI-driven buys and sells.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command line glue in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
