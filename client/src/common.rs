use ethers_core::types::Address;
use ethers_signers::{LocalWallet, Signer, WalletError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// `good_until_block` value meaning the transfer never expires.
pub const NO_EXPIRY: u32 = i32::MAX as u32;

/// Body of `POST /deposit`, also the entry type of a deposit block.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct DepositTransaction {
    pub account: u32,
    #[serde(with = "request_amount")]
    pub amount: Decimal,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct TxSignature {
    pub r_x: String,
    pub r_y: String,
    pub s: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct TransferTransaction {
    pub from: u32,
    pub to: u32,
    #[serde(with = "request_amount")]
    pub amount: Decimal,
    #[serde(with = "request_amount")]
    pub fee: Decimal,
    pub nonce: u32,
    #[serde(default = "no_expiry")]
    pub good_until_block: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<TxSignature>,
}

impl TransferTransaction {
    pub fn new(from: u32, to: u32, amount: Decimal, fee: Decimal, nonce: u32) -> Self {
        Self {
            from,
            to,
            amount,
            fee,
            nonce,
            good_until_block: NO_EXPIRY,
            signature: None,
        }
    }

    pub fn with_signature(mut self, signature: TxSignature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn expires(&self) -> bool {
        self.good_until_block != NO_EXPIRY
    }
}

fn no_expiry() -> u32 {
    NO_EXPIRY
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct ExitTransaction {
    pub account: u32,
    pub amount: Decimal,
}

/// Body of `POST /depositreq`: a deposit bound to a plasma public key.
/// The node names the account field `address`.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct DepositRequest {
    #[serde(rename = "address", alias = "account")]
    pub account: Address,
    /// `(x, y)` of the curve point, hex without a `0x` prefix.
    pub public_key: [String; 2],
    pub deposit_amount: Decimal,
}

impl DepositRequest {
    pub fn public_key_bytes(&self) -> Result<[[u8; 32]; 2], hex::FromHexError> {
        let mut coordinates = [[0u8; 32]; 2];
        for (decoded, encoded) in coordinates.iter_mut().zip(self.public_key.iter()) {
            hex::decode_to_slice(encoded.trim_start_matches("0x"), decoded)?;
        }
        Ok(coordinates)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct EchoRequest {
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct AccountState {
    pub nonce: u32,
    pub balance: Decimal,
    pub public_key_x: String,
    pub public_key_y: String,
}

/// Reply of `GET /account/{id}`.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
pub struct AccountDetails {
    #[serde(default)]
    pub pending: Option<AccountState>,
    #[serde(default)]
    pub verified: Option<AccountState>,
    #[serde(default)]
    pub committed: Option<AccountState>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
pub struct NetworkStatus {
    pub next_block_at_max: Option<u64>,
    pub last_committed: u32,
    pub last_verified: u32,
    pub total_transactions: u32,
    pub outstanding_txs: u32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct TransferTxConfirmation {
    pub block_number: u32,
    pub signature: String,
}

/// Reply of `POST /submit_tx`.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct TransactionResponse {
    pub accepted: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub confirmation: Option<TransferTxConfirmation>,
}

/// Summary of a committed block as listed by `/blocks` and `/search`.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct BlockDetails {
    pub block_number: i32,
    pub new_state_root: String,
    #[serde(default)]
    pub commit_tx_hash: Option<String>,
    #[serde(default)]
    pub verify_tx_hash: Option<String>,
    pub committed_at: String,
    #[serde(default)]
    pub verified_at: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct AddressResponse {
    pub account_id: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(tag = "type")]
pub enum BlockData {
    Deposit {
        batch_number: u32,
        transactions: Vec<DepositTransaction>,
    },
    Transfer {
        total_fees: Decimal,
        transactions: Vec<TransferTransaction>,
    },
    Exit {
        batch_number: u32,
        transactions: Vec<ExitTransaction>,
    },
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct Block {
    pub block_data: BlockData,
    pub block_number: u32,
    pub new_root_hash: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(tag = "type")]
pub enum Action {
    Commit,
    Verify,
}

/// A committed (or verified) block together with the account states it produced.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct BlockNotification {
    pub id: Option<i64>,
    pub block: Block,
    pub action: Action,
    pub accounts_updated: BTreeMap<u32, AccountState>,
}

/// A funded keypair of the local development chain.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct DevAccount {
    pub address: Address,
    pub private_key: String,
}

impl DevAccount {
    pub fn wallet(&self) -> Result<LocalWallet, WalletError> {
        LocalWallet::from_str(&self.private_key)
    }

    /// Whether the private key actually controls `address`.
    pub fn check(&self) -> Result<bool, WalletError> {
        Ok(self.wallet()?.address() == self.address)
    }
}

/// The service's error envelope, sent with HTTP 200.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct ApiErrorBody {
    pub error: String,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum ApiReply<T> {
    Rejected(ApiErrorBody),
    Accepted(T),
}

/// Whole amounts go on the wire as JSON integers, anything else as a decimal string.
mod request_amount {
    use rust_decimal::{prelude::ToPrimitive, Decimal};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        let whole = if value.fract().is_zero() {
            value.to_u64()
        } else {
            None
        };
        match whole {
            Some(units) => serializer.serialize_u64(units),
            None => serializer.serialize_str(&value.normalize().to_string()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer)
    }
}
