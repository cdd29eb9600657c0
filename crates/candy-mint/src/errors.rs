use thiserror::Error;

/// Every failure the sale reader, evaluator and purchase flow can surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MintError {
    // Configuration errors
    #[error("No candy machine ID found. Set CANDY_MACHINE_ID or pass --candy-machine.")]
    ConfigNotFound,
    #[error("Invalid configuration: {0}")]
    Config(String),

    // Read-path errors
    #[error("Failed to read {context}: {reason}")]
    ChainRead { context: String, reason: String },
    #[error("Failed to fetch descriptor {uri}: {reason}")]
    DescriptorFetch { uri: String, reason: String },

    // Eligibility blocks
    #[error("Connect your wallet!")]
    NotConnected,
    #[error("Sold out.")]
    SoldOut,
    #[error("Add more SOL to your wallet (balance {balance} lamports, price {price} lamports).")]
    InsufficientFunds { balance: u64, price: u64 },

    // Purchase-path errors
    #[error("Error fetching Candy Machine ({0}). Refresh and try again.")]
    StaleState(String),
    #[error("A mint is already in progress.")]
    AttemptInFlight,
    #[error("Transaction failed: {0}")]
    Submission(String),
    #[error("Transaction {signature} was not finalized within {waited_secs}s")]
    ConfirmationTimeout { signature: String, waited_secs: u64 },
}

impl MintError {
    pub fn chain_read(context: impl Into<String>, reason: impl ToString) -> Self {
        MintError::ChainRead {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    pub fn descriptor(uri: impl Into<String>, reason: impl ToString) -> Self {
        MintError::DescriptorFetch {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MintError>;
