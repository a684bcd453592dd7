use crate::{
    common::{
        DepositRequest, DepositTransaction, DevAccount, EchoRequest, TransferTransaction,
        NO_EXPIRY,
    },
    config::{default_deposit, DEFAULT_DEPOSIT_ACCOUNT, DEFAULT_ENDPOINT},
    ledger::{self, Balances},
    runner::{print_response, run_deposit},
    RollupApi,
};
use clap::{Parser, Subcommand};
use ethers_core::types::Address;
use eyre::WrapErr;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};
use url::Url;

#[derive(Parser, Debug)]
#[clap(version, about = "Smoke-test client for a plasma rollup node")]
pub struct CliArgs {
    /// Root of the node's HTTP server.
    #[clap(short = 'e', long, env = "PLASMA_API_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: Url,
    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// POST /deposit (the default: account 1, amount 100)
    Deposit {
        #[clap(long, default_value_t = DEFAULT_DEPOSIT_ACCOUNT)]
        account: u32,
        #[clap(long, default_value = "100")]
        amount: Decimal,
    },
    /// POST /submit_tx with an unsigned transfer
    SubmitTx {
        #[clap(long)]
        from: u32,
        #[clap(long)]
        to: u32,
        #[clap(long)]
        amount: Decimal,
        #[clap(long, default_value = "0")]
        fee: Decimal,
        #[clap(long, default_value_t = 0)]
        nonce: u32,
        #[clap(long, default_value_t = NO_EXPIRY)]
        good_until_block: u32,
    },
    /// GET /status
    Status,
    /// POST /mytest
    Echo {
        #[clap(long, default_value = "myname")]
        name: String,
    },
    /// GET /account/{id}
    Account { id: u32 },
    /// GET /account/{id}/transactions
    AccountTransactions { id: u32 },
    /// GET /address/{address}
    AccountId {
        #[clap(value_parser = parse_address)]
        address: Address,
    },
    /// POST /depositreq with a request read from a JSON file
    RequestDeposit { file: PathBuf },
    /// GET /exit/{address}
    Exit {
        #[clap(value_parser = parse_address)]
        address: Address,
    },
    /// GET /blocks/{number}
    Block { number: u32 },
    /// GET /blocks
    Blocks {
        #[clap(long)]
        max_block: Option<u32>,
        #[clap(long)]
        limit: Option<u32>,
    },
    /// GET /blocks/{number}/transactions
    BlockTransactions { number: u32 },
    /// GET /blocks/transactions/{id}
    Transaction { id: u32 },
    /// GET /search
    Search { query: String },
    /// Check a block notification file against prior balances, offline
    CheckCommit {
        notification: PathBuf,
        /// Prior balance as ACCOUNT=AMOUNT, repeatable
        #[clap(long = "balance", value_parser = parse_balance)]
        balances: Vec<(u32, Decimal)>,
    },
    /// Check that each development keypair controls its address, offline
    DevAccounts { file: PathBuf },
}

pub fn parse_address(value: &str) -> Result<Address, String> {
    Address::from_str(value).map_err(|e| format!("invalid address {value}: {e}"))
}

pub fn parse_balance(value: &str) -> Result<(u32, Decimal), String> {
    let (account, amount) = value
        .split_once('=')
        .ok_or_else(|| format!("expected ACCOUNT=AMOUNT, got {value}"))?;
    let account = account
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid account {account}: {e}"))?;
    let amount = Decimal::from_str(amount.trim())
        .map_err(|e| format!("invalid amount {amount}: {e}"))?;
    Ok((account, amount))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> eyre::Result<T> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).wrap_err_with(|| format!("failed to parse {}", path.display()))
}

fn print_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> eyre::Result<()> {
    print_response(out, &serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Runs one command against `api`, writing what it prints to `out`.
///
/// `None` is the plain invocation: the default deposit.
pub async fn execute<A, W>(api: &A, command: Option<Command>, out: &mut W) -> eyre::Result<()>
where
    A: RollupApi + ?Sized,
    W: Write,
{
    let Some(command) = command else {
        run_deposit(api, &default_deposit(), out).await?;
        return Ok(());
    };
    match command {
        Command::Deposit { account, amount } => {
            run_deposit(api, &DepositTransaction { account, amount }, out).await?
        }
        Command::SubmitTx {
            from,
            to,
            amount,
            fee,
            nonce,
            good_until_block,
        } => {
            let tx = TransferTransaction {
                good_until_block,
                ..TransferTransaction::new(from, to, amount, fee, nonce)
            };
            print_json(out, &api.submit_tx(&tx).await?)?
        }
        Command::Status => print_json(out, &api.get_status().await?)?,
        Command::Echo { name } => print_response(out, &api.echo(&EchoRequest { name }).await?)?,
        Command::Account { id } => print_json(out, &api.get_account(id).await?)?,
        Command::AccountTransactions { id } => {
            print_response(out, &api.get_account_transactions(id).await?)?
        }
        Command::AccountId { address } => match api.get_account_id(&address).await? {
            Some(id) => print_response(out, &id.to_string())?,
            None => log::warn!("{address:#x} has not deposited"),
        },
        Command::RequestDeposit { file } => {
            let request: DepositRequest = read_json(&file)?;
            request
                .public_key_bytes()
                .wrap_err("public key coordinates must be 32-byte hex")?;
            print_response(out, &api.request_deposit(&request).await?)?
        }
        Command::Exit { address } => print_response(out, &api.request_exit(&address).await?)?,
        Command::Block { number } => print_json(out, &api.get_block(number).await?)?,
        Command::Blocks { max_block, limit } => {
            print_json(out, &api.get_blocks(max_block, limit).await?)?
        }
        Command::BlockTransactions { number } => {
            print_json(out, &api.get_block_transactions(number).await?)?
        }
        Command::Transaction { id } => match api.get_transaction(id).await? {
            Some(tx) => print_json(out, &tx)?,
            None => log::warn!("no transaction {id}"),
        },
        Command::Search { query } => print_json(out, &api.search(&query).await?)?,
        Command::CheckCommit {
            notification,
            balances,
        } => {
            let notification = read_json(&notification)?;
            let prior: Balances = balances.into_iter().collect();
            let committed = ledger::check_commit(&prior, &notification)?;
            for (account, balance) in committed {
                writeln!(out, "{account}: {balance}")?;
            }
        }
        Command::DevAccounts { file } => {
            let accounts: Vec<DevAccount> = read_json(&file)?;
            for account in &accounts {
                let controls = account
                    .check()
                    .map_err(|e| eyre::eyre!("{:#x}: {e}", account.address))?;
                if controls {
                    writeln!(out, "{:#x}: ok", account.address)?;
                } else {
                    log::warn!("{:#x}: key controls a different address", account.address);
                    writeln!(out, "{:#x}: mismatch", account.address)?;
                }
            }
        }
    }
    Ok(())
}
