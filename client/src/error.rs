use reqwest::StatusCode;
use rust_decimal::Decimal;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP status {status} from {url}")]
    Status { url: Url, status: StatusCode },

    #[error("request to the rollup API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),

    #[error("malformed response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rejected by the rollup API: {0}")]
    Rejected(String),

    #[error("block listing limit {limit} exceeds {max}")]
    LimitTooLarge { limit: u32, max: u32 },

    #[error("failed to write the response: {0}")]
    Output(#[from] std::io::Error),
}

impl ClientError {
    /// The HTTP status, if the server answered with a non-success code.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("block {block_number} is not a commit")]
    NotACommit { block_number: u32 },

    #[error("account {account} was touched by the block but is missing from accounts_updated")]
    MissingAccount { account: u32 },

    #[error("balance of account {account} overflows")]
    Overflow { account: u32 },

    #[error("account {account}: expected balance {expected}, committed {committed}")]
    BalanceMismatch {
        account: u32,
        expected: Decimal,
        committed: Decimal,
    },
}
