//! Portfolio persistence port trait.

use crate::domain::error::TradeBuddyError;
use crate::domain::portfolio::Portfolio;

/// Whole-record key/value store for portfolios, keyed by user id.
///
/// Implementations must round-trip every [`Portfolio`] field, timestamps
/// included. Concurrent writers to one user are last-write-wins.
pub trait PortfolioStore {
    /// `Ok(None)` when the user has no saved portfolio yet.
    /// Unreadable records are `TradeBuddyError::MalformedPortfolio`.
    fn load(&self, user: &str) -> Result<Option<Portfolio>, TradeBuddyError>;

    fn save(&self, user: &str, portfolio: &Portfolio) -> Result<(), TradeBuddyError>;
}
