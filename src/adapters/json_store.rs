//! File-per-user JSON portfolio store.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::error::TradeBuddyError;
use crate::domain::portfolio::Portfolio;
use crate::ports::portfolio_port::PortfolioStore;

/// Stores each portfolio as `<dir>/<user>_portfolio.json`.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, user: &str) -> Result<PathBuf, TradeBuddyError> {
        let valid = !user.is_empty()
            && user
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(TradeBuddyError::MalformedPortfolio {
                user: user.to_string(),
                reason: "user id must be alphanumeric, '_' or '-'".into(),
            });
        }
        Ok(self.dir.join(format!("{}_portfolio.json", user)))
    }
}

impl PortfolioStore for JsonFileStore {
    fn load(&self, user: &str) -> Result<Option<Portfolio>, TradeBuddyError> {
        let path = self.path_for(user)?;
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| TradeBuddyError::MalformedPortfolio {
                user: user.to_string(),
                reason: e.to_string(),
            })
    }

    /// Writes to a sibling temp file then renames, so a crash never leaves half a record.
    fn save(&self, user: &str, portfolio: &Portfolio) -> Result<(), TradeBuddyError> {
        let path = self.path_for(user)?;
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(portfolio)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
