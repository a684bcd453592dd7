//! Offline check of the balance invariant of a block commit: every account the
//! block touches ends at its prior balance plus the block's net effect on it.

use crate::common::{Action, BlockData, BlockNotification};
use crate::error::LedgerError;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

pub type Balances = BTreeMap<u32, Decimal>;

/// Balances of the accounts `block_data` touches once it is applied on top of `prior`.
/// Accounts absent from `prior` start at zero.
pub fn expected_balances(
    prior: &Balances,
    block_data: &BlockData,
) -> Result<Balances, LedgerError> {
    let mut touched = Balances::new();
    let balance_of = |account: u32, touched: &mut Balances| -> Decimal {
        *touched
            .entry(account)
            .or_insert_with(|| prior.get(&account).copied().unwrap_or_default())
    };
    match block_data {
        BlockData::Deposit { transactions, .. } => {
            for tx in transactions {
                let balance = balance_of(tx.account, &mut touched)
                    .checked_add(tx.amount)
                    .ok_or(LedgerError::Overflow { account: tx.account })?;
                touched.insert(tx.account, balance);
            }
        }
        BlockData::Transfer { transactions, .. } => {
            for tx in transactions {
                let sender = balance_of(tx.from, &mut touched)
                    .checked_sub(tx.amount)
                    .and_then(|balance| balance.checked_sub(tx.fee))
                    .ok_or(LedgerError::Overflow { account: tx.from })?;
                touched.insert(tx.from, sender);
                let receiver = balance_of(tx.to, &mut touched)
                    .checked_add(tx.amount)
                    .ok_or(LedgerError::Overflow { account: tx.to })?;
                touched.insert(tx.to, receiver);
            }
        }
        BlockData::Exit { transactions, .. } => {
            for tx in transactions {
                touched.insert(tx.account, Decimal::ZERO);
            }
        }
    }
    Ok(touched)
}

/// Checks `notification` against `prior` and returns the committed balances of the touched accounts.
pub fn check_commit(
    prior: &Balances,
    notification: &BlockNotification,
) -> Result<Balances, LedgerError> {
    let block = &notification.block;
    if notification.action != Action::Commit {
        return Err(LedgerError::NotACommit {
            block_number: block.block_number,
        });
    }
    let expected = expected_balances(prior, &block.block_data)?;
    for (&account, &balance) in &expected {
        let committed = notification
            .accounts_updated
            .get(&account)
            .ok_or(LedgerError::MissingAccount { account })?
            .balance;
        if committed != balance {
            return Err(LedgerError::BalanceMismatch {
                account,
                expected: balance,
                committed,
            });
        }
    }
    log::debug!(
        "block {} commits {} account(s) consistently",
        block.block_number,
        expected.len()
    );
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Block, DepositTransaction, ExitTransaction, TransferTransaction};

    fn fixture(json: &str) -> BlockNotification {
        serde_json::from_str(json).unwrap()
    }

    fn balances(entries: &[(u32, i64)]) -> Balances {
        entries
            .iter()
            .map(|&(account, balance)| (account, Decimal::from(balance)))
            .collect()
    }

    #[test]
    fn deposit_commit_adds_to_prior_balance() {
        let notification = fixture(include_str!("../fixtures/deposit_commit.json"));
        let committed = check_commit(&balances(&[(2, 10)]), &notification).unwrap();
        assert_eq!(committed, balances(&[(2, 20)]));
    }

    #[test]
    fn transfer_commit_moves_balance() {
        let notification = fixture(include_str!("../fixtures/transfer_commit.json"));
        let committed = check_commit(&balances(&[(1, 100), (2, 20)]), &notification).unwrap();
        assert_eq!(committed, balances(&[(1, 92), (2, 28)]));
    }

    #[test]
    fn wrong_prior_balance_is_reported() {
        let notification = fixture(include_str!("../fixtures/transfer_commit.json"));
        assert_eq!(
            check_commit(&balances(&[(1, 100), (2, 10)]), &notification),
            Err(LedgerError::BalanceMismatch {
                account: 2,
                expected: Decimal::from(18),
                committed: Decimal::from(28),
            })
        );
    }

    #[test]
    fn missing_account_is_reported() {
        let mut notification = fixture(include_str!("../fixtures/transfer_commit.json"));
        notification.accounts_updated.remove(&1);
        assert_eq!(
            check_commit(&balances(&[(1, 100), (2, 20)]), &notification),
            Err(LedgerError::MissingAccount { account: 1 })
        );
    }

    #[test]
    fn verify_is_not_checked() {
        let mut notification = fixture(include_str!("../fixtures/deposit_commit.json"));
        notification.action = Action::Verify;
        assert_eq!(
            check_commit(&Balances::new(), &notification),
            Err(LedgerError::NotACommit { block_number: 3 })
        );
    }

    #[test]
    fn fees_leave_the_sender() {
        let notification = fixture(include_str!("../fixtures/transfer_commit.json"));
        let Block { block_data, .. } = notification.block;
        let BlockData::Transfer { mut transactions, .. } = block_data else {
            panic!("transfer fixture holds a transfer block");
        };
        transactions.truncate(1);
        transactions[0].fee = Decimal::from(2);
        let expected = expected_balances(
            &balances(&[(1, 10)]),
            &BlockData::Transfer {
                total_fees: Decimal::from(2),
                transactions,
            },
        )
        .unwrap();
        assert_eq!(expected, balances(&[(1, 7), (2, 1)]));
    }

    #[test]
    fn exit_empties_the_account() {
        let expected = expected_balances(
            &balances(&[(5, 42)]),
            &BlockData::Exit {
                batch_number: 0,
                transactions: vec![ExitTransaction {
                    account: 5,
                    amount: Decimal::ZERO,
                }],
            },
        )
        .unwrap();
        assert_eq!(expected, balances(&[(5, 0)]));
    }

    #[test]
    fn huge_deposit_overflows_instead_of_panicking() {
        let prior = Balances::from([(1, Decimal::MAX)]);
        let deposit = BlockData::Deposit {
            batch_number: 0,
            transactions: vec![DepositTransaction {
                account: 1,
                amount: Decimal::MAX,
            }],
        };
        assert_eq!(
            expected_balances(&prior, &deposit),
            Err(LedgerError::Overflow { account: 1 })
        );
    }

    #[test]
    fn huge_transfer_overflows_the_sender() {
        let prior = Balances::from([(1, Decimal::MIN)]);
        let transfer = BlockData::Transfer {
            total_fees: Decimal::ZERO,
            transactions: vec![TransferTransaction::new(
                1,
                2,
                Decimal::MAX,
                Decimal::ZERO,
                0,
            )],
        };
        assert_eq!(
            expected_balances(&prior, &transfer),
            Err(LedgerError::Overflow { account: 1 })
        );
    }

    #[test]
    fn overflowing_commit_is_an_error() {
        let mut notification = fixture(include_str!("../fixtures/deposit_commit.json"));
        notification.block.block_data = BlockData::Deposit {
            batch_number: 0,
            transactions: vec![DepositTransaction {
                account: 2,
                amount: Decimal::MAX,
            }],
        };
        assert_eq!(
            check_commit(&Balances::from([(2, Decimal::MAX)]), &notification),
            Err(LedgerError::Overflow { account: 2 })
        );
    }
}
