//! Port traits for the game's external collaborators.

pub mod config_port;
pub mod market_data_port;
pub mod portfolio_port;
