use crate::common::DepositTransaction;
use rust_decimal::Decimal;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000";
pub const API_PREFIX: &str = "api/v0.1/";

pub const DEFAULT_DEPOSIT_ACCOUNT: u32 = 1;
pub const DEFAULT_DEPOSIT_AMOUNT: u64 = 100;

/// Where the rollup API is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    endpoint: Url,
}

impl ApiConfig {
    /// `endpoint` is the server root; `/api/v0.1` is appended per request.
    pub fn new(mut endpoint: Url) -> Self {
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        Self { endpoint }
    }

    pub fn parse(endpoint: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(endpoint)?))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn route(&self, path: &str) -> Result<Url, url::ParseError> {
        self.endpoint.join(API_PREFIX)?.join(path)
    }
}

/// The deposit the runner sends when nothing else is asked for.
pub fn default_deposit() -> DepositTransaction {
    DepositTransaction {
        account: DEFAULT_DEPOSIT_ACCOUNT,
        amount: Decimal::from(DEFAULT_DEPOSIT_AMOUNT),
    }
}
