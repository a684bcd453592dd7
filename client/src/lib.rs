pub mod cli;
pub mod common;
pub mod config;
pub mod decode;
pub mod error;
pub mod ledger;
pub mod runner;

use async_trait::async_trait;
use common::*;
use config::ApiConfig;
use error::ClientError;
use ethers_core::types::Address;
use reqwest::{header, Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

/// Largest `limit` the node accepts on `GET /blocks`.
pub const MAX_BLOCKS_LIMIT: u32 = 100;

/// The HTTP surface of a plasma rollup node.
///
/// Methods that return `String` hand back the decoded response body untouched;
/// the typed ones parse it and turn the node's `{"error": ..}` envelope into
/// [`ClientError::Rejected`]. Any non-success status is [`ClientError::Status`].
#[async_trait]
pub trait RollupApi {
    async fn deposit(&self, deposit: &DepositTransaction) -> Result<String, ClientError>;

    /// Fails with [`ClientError::Rejected`] when the node does not accept the transfer.
    async fn submit_tx(&self, tx: &TransferTransaction)
        -> Result<TransactionResponse, ClientError>;

    async fn echo(&self, request: &EchoRequest) -> Result<String, ClientError>;

    /// Deposit bound to a plasma public key (`/depositreq`).
    async fn request_deposit(&self, request: &DepositRequest) -> Result<String, ClientError>;

    async fn get_status(&self) -> Result<NetworkStatus, ClientError>;

    async fn get_account(&self, account: u32) -> Result<AccountDetails, ClientError>;

    /// The node only answers a placeholder here, so the body stays raw.
    async fn get_account_transactions(&self, account: u32) -> Result<String, ClientError>;

    /// Account id the node assigned to an ethereum address, if it has deposited.
    async fn get_account_id(&self, address: &Address) -> Result<Option<u32>, ClientError>;

    async fn request_exit(&self, address: &Address) -> Result<String, ClientError>;

    /// Commit summary of one block. The block's operations and account
    /// updates are not part of this reply; see [`BlockNotification`].
    async fn get_block(&self, block_number: u32) -> Result<BlockDetails, ClientError>;

    /// Up to `limit` blocks (node default 20, at most [`MAX_BLOCKS_LIMIT`])
    /// numbered at or below `max_block`.
    async fn get_blocks(
        &self,
        max_block: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Vec<BlockDetails>, ClientError>;

    /// Stored transactions of a block, as the node's storage rows.
    async fn get_block_transactions(
        &self,
        block_number: u32,
    ) -> Result<Vec<serde_json::Value>, ClientError>;

    /// A stored transaction by id, `None` when the node has no such row.
    async fn get_transaction(&self, tx_id: u32) -> Result<Option<serde_json::Value>, ClientError>;

    /// Block lookup by number, root hash or transaction hash.
    async fn search(&self, query: &str) -> Result<BlockDetails, ClientError>;
}

pub struct PlasmaApi {
    client: Client,
    config: ApiConfig,
}

impl PlasmaApi {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    async fn post<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<String, ClientError> {
        let url = self.config.route(path)?;
        log::debug!("POST {url}");
        let response = self.client.post(url.clone()).json(body).send().await?;
        read_text(url, response).await
    }

    async fn get(&self, path: &str) -> Result<String, ClientError> {
        self.get_url(self.config.route(path)?).await
    }

    async fn get_url(&self, url: Url) -> Result<String, ClientError> {
        log::debug!("GET {url}");
        let response = self.client.get(url.clone()).send().await?;
        read_text(url, response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let text = self.get(path).await?;
        parse_reply(path, &text)
    }
}

fn parse_reply<T: DeserializeOwned>(path: &str, text: &str) -> Result<T, ClientError> {
    match serde_json::from_str::<ApiReply<T>>(text)? {
        ApiReply::Accepted(reply) => Ok(reply),
        ApiReply::Rejected(ApiErrorBody { error }) => {
            log::warn!("{path} rejected: {error}");
            Err(ClientError::Rejected(error))
        }
    }
}

async fn read_text(url: Url, response: Response) -> Result<String, ClientError> {
    let status = response.status();
    if !status.is_success() {
        log::error!("{url} answered {status}");
        return Err(ClientError::Status { url, status });
    }
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let body = response.bytes().await?;
    Ok(decode::decode_body(content_type.as_deref(), &body))
}

fn address_segment(address: &Address) -> String {
    format!("{address:#x}")
}

#[async_trait]
impl RollupApi for PlasmaApi {
    async fn deposit(&self, deposit: &DepositTransaction) -> Result<String, ClientError> {
        self.post("deposit", deposit).await
    }

    async fn submit_tx(
        &self,
        tx: &TransferTransaction,
    ) -> Result<TransactionResponse, ClientError> {
        let text = self.post("submit_tx", tx).await?;
        let response: TransactionResponse = parse_reply("submit_tx", &text)?;
        if !response.accepted {
            let error = response
                .error
                .unwrap_or_else(|| "transaction not accepted".to_owned());
            return Err(ClientError::Rejected(error));
        }
        Ok(response)
    }

    async fn echo(&self, request: &EchoRequest) -> Result<String, ClientError> {
        self.post("mytest", request).await
    }

    async fn request_deposit(&self, request: &DepositRequest) -> Result<String, ClientError> {
        self.post("depositreq", request).await
    }

    async fn get_status(&self) -> Result<NetworkStatus, ClientError> {
        self.get_json("status").await
    }

    async fn get_account(&self, account: u32) -> Result<AccountDetails, ClientError> {
        self.get_json(&format!("account/{account}")).await
    }

    async fn get_account_transactions(&self, account: u32) -> Result<String, ClientError> {
        self.get(&format!("account/{account}/transactions")).await
    }

    async fn get_account_id(&self, address: &Address) -> Result<Option<u32>, ClientError> {
        let reply: AddressResponse = self
            .get_json(&format!("address/{}", address_segment(address)))
            .await?;
        Ok(reply.account_id)
    }

    async fn request_exit(&self, address: &Address) -> Result<String, ClientError> {
        self.get(&format!("exit/{}", address_segment(address))).await
    }

    async fn get_block(&self, block_number: u32) -> Result<BlockDetails, ClientError> {
        self.get_json(&format!("blocks/{block_number}")).await
    }

    async fn get_blocks(
        &self,
        max_block: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Vec<BlockDetails>, ClientError> {
        if let Some(limit) = limit.filter(|&limit| limit > MAX_BLOCKS_LIMIT) {
            return Err(ClientError::LimitTooLarge {
                limit,
                max: MAX_BLOCKS_LIMIT,
            });
        }
        let mut url = self.config.route("blocks")?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(max_block) = max_block {
                query.append_pair("max_block", &max_block.to_string());
            }
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        let text = self.get_url(url).await?;
        parse_reply("blocks", &text)
    }

    async fn get_block_transactions(
        &self,
        block_number: u32,
    ) -> Result<Vec<serde_json::Value>, ClientError> {
        self.get_json(&format!("blocks/{block_number}/transactions"))
            .await
    }

    async fn get_transaction(&self, tx_id: u32) -> Result<Option<serde_json::Value>, ClientError> {
        self.get_json(&format!("blocks/transactions/{tx_id}")).await
    }

    async fn search(&self, query: &str) -> Result<BlockDetails, ClientError> {
        let mut url = self.config.route("search")?;
        url.query_pairs_mut().append_pair("query", query);
        let text = self.get_url(url).await?;
        parse_reply("search", &text)
    }
}
