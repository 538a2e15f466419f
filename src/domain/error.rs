//! Domain error types.

/// Top-level error type for tradebuddy.
#[derive(Debug, thiserror::Error)]
pub enum TradeBuddyError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no market data for {asset}: {reason}")]
    DataUnavailable { asset: String, reason: String },

    #[error("insufficient data for {asset}: have {bars} bars, need {minimum}")]
    InsufficientData {
        asset: String,
        bars: usize,
        minimum: usize,
    },

    #[error("malformed portfolio for {user}: {reason}")]
    MalformedPortfolio { user: String, reason: String },

    #[error("invalid login for {user}")]
    AuthFailed { user: String },

    #[error("password hashing failed: {reason}")]
    PasswordHash { reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradeBuddyError> for std::process::ExitCode {
    fn from(err: &TradeBuddyError) -> Self {
        let code: u8 = match err {
            TradeBuddyError::Io(_) | TradeBuddyError::Serialization(_) => 1,
            TradeBuddyError::ConfigParse { .. }
            | TradeBuddyError::ConfigMissing { .. }
            | TradeBuddyError::ConfigInvalid { .. } => 2,
            TradeBuddyError::Database { .. } | TradeBuddyError::DatabaseQuery { .. } => 3,
            TradeBuddyError::AuthFailed { .. } | TradeBuddyError::PasswordHash { .. } => 4,
            TradeBuddyError::DataUnavailable { .. } | TradeBuddyError::InsufficientData { .. } => 5,
            TradeBuddyError::MalformedPortfolio { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
