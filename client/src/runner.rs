use crate::common::DepositTransaction;
use crate::error::ClientError;
use crate::RollupApi;
use std::io::Write;

/// Sends one deposit and writes the decoded reply to `out`.
///
/// Nothing is written when the node answers with a non-success status.
pub async fn run_deposit<A, W>(
    api: &A,
    deposit: &DepositTransaction,
    out: &mut W,
) -> Result<(), ClientError>
where
    A: RollupApi + ?Sized,
    W: Write,
{
    log::info!(
        "depositing {} into account {}",
        deposit.amount,
        deposit.account
    );
    let text = api.deposit(deposit).await?;
    print_response(out, &text)
}

pub fn print_response<W: Write>(out: &mut W, text: &str) -> Result<(), ClientError> {
    writeln!(out, "{text}")?;
    out.flush()?;
    Ok(())
}
