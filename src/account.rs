use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, prelude::Zero};
use thiserror::Error;

pub type CustomerId = String;
pub type AccountId = String;

/// Kind tag given at account opening. Free-form tags are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountKind {
    Checking,
    Savings,
    Other(String),
}

impl From<&str> for AccountKind {
    fn from(tag: &str) -> Self {
        match tag {
            "checking" => AccountKind::Checking,
            "savings" => AccountKind::Savings,
            other => AccountKind::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountKind::Checking => f.write_str("checking"),
            AccountKind::Savings => f.write_str("savings"),
            AccountKind::Other(tag) => f.write_str(tag),
        }
    }
}

/// For transfers the counterparty account travels with the kind, so a
/// record never carries a dangling "maybe counterparty" field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    TransferOut { to: AccountId },
    TransferIn { from: AccountId },
}

/// One entry of the append-only per-account log. Immutable once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub at: DateTime<Utc>,
    /// Balance immediately after this transaction, kept for statements.
    pub balance_after: Decimal,
}

/// A validated balance change. Only [`Account::apply`] turns it into state.
#[derive(Debug)]
pub struct AccountEvent {
    kind: TransactionKind,
    amount: Decimal,
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("amount must be positive, got {0}")]
    InvalidAmount(Decimal),
    #[error("insufficient funds: balance is {balance}, requested {requested}")]
    InsufficientFunds {
        balance: Decimal,
        requested: Decimal,
    },
}

#[derive(Debug)]
pub struct Account {
    customer_id: CustomerId,
    kind: AccountKind,
    balance: Decimal,
    created_at: DateTime<Utc>,
    transactions: Vec<TransactionRecord>,
}

impl Account {
    pub fn open(customer_id: CustomerId, kind: AccountKind, at: DateTime<Utc>) -> Self {
        Self {
            customer_id,
            kind,
            balance: Decimal::zero(),
            created_at: at,
            transactions: Vec::new(),
        }
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn kind(&self) -> &AccountKind {
        &self.kind
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }

    pub fn handle_deposit(&self, amount: Decimal) -> Result<AccountEvent, AccountError> {
        self.credit_event(amount, TransactionKind::Deposit)
    }

    pub fn handle_withdrawal(&self, amount: Decimal) -> Result<AccountEvent, AccountError> {
        self.debit_event(amount, TransactionKind::Withdrawal)
    }

    pub fn handle_transfer_out(
        &self,
        amount: Decimal,
        to: &str,
    ) -> Result<AccountEvent, AccountError> {
        self.debit_event(amount, TransactionKind::TransferOut { to: to.to_owned() })
    }

    pub fn handle_transfer_in(
        &self,
        amount: Decimal,
        from: &str,
    ) -> Result<AccountEvent, AccountError> {
        self.credit_event(
            amount,
            TransactionKind::TransferIn {
                from: from.to_owned(),
            },
        )
    }

    /// Applies a validated event: adjusts the balance and appends a record
    /// with the post-balance snapshot. The event is the source of truth,
    /// there's no more validation happening.
    pub fn apply(&mut self, event: &AccountEvent, at: DateTime<Utc>) {
        match event.kind {
            TransactionKind::Deposit | TransactionKind::TransferIn { .. } => {
                self.balance += event.amount;
            }
            TransactionKind::Withdrawal | TransactionKind::TransferOut { .. } => {
                self.balance -= event.amount;
            }
        }
        self.transactions.push(TransactionRecord {
            kind: event.kind.clone(),
            amount: event.amount,
            at,
            balance_after: self.balance,
        });
    }

    fn credit_event(
        &self,
        amount: Decimal,
        kind: TransactionKind,
    ) -> Result<AccountEvent, AccountError> {
        Self::check_amount(amount)?;
        Ok(AccountEvent { kind, amount })
    }

    fn debit_event(
        &self,
        amount: Decimal,
        kind: TransactionKind,
    ) -> Result<AccountEvent, AccountError> {
        Self::check_amount(amount)?;
        if amount > self.balance {
            return Err(AccountError::InsufficientFunds {
                balance: self.balance,
                requested: amount,
            });
        }
        Ok(AccountEvent { kind, amount })
    }

    fn check_amount(amount: Decimal) -> Result<(), AccountError> {
        if amount <= Decimal::zero() {
            Err(AccountError::InvalidAmount(amount))
        } else {
            Ok(())
        }
    }
}
