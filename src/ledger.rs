use std::collections::{HashMap, hash_map::Entry};

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::{
    account::{Account, AccountError, AccountId, AccountKind, CustomerId, TransactionRecord},
    statement::Statement,
};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("identifier `{0}` is already in use")]
    DuplicateKey(String),
    #[error("no record found for `{0}`")]
    NotFound(String),
    #[error("cannot transfer from an account to itself")]
    SameAccount,
    #[error(transparent)]
    Account(#[from] AccountError),
}

/// Registered customer. Accounts are referenced by id only; the ledger owns
/// the account records themselves.
#[derive(Debug)]
pub struct Customer {
    name: String,
    email: String,
    accounts: Vec<AccountId>,
}

impl Customer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Account ids in opening order.
    pub fn accounts(&self) -> &[AccountId] {
        &self.accounts
    }
}

/// The registry owning every customer and account record. All mutating
/// operations validate first and touch state only on success, so a failed
/// call never leaves a partial mutation behind.
#[derive(Debug, Default)]
pub struct Ledger {
    customers: HashMap<CustomerId, Customer>,
    accounts: HashMap<AccountId, Account>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_customer(
        &mut self,
        id: CustomerId,
        name: String,
        email: String,
    ) -> Result<(), LedgerError> {
        match self.customers.entry(id) {
            Entry::Occupied(entry) => Err(LedgerError::DuplicateKey(entry.key().clone())),
            Entry::Vacant(entry) => {
                debug!(customer = %entry.key(), "customer registered");
                entry.insert(Customer {
                    name,
                    email,
                    accounts: Vec::new(),
                });
                Ok(())
            }
        }
    }

    pub fn open_account(
        &mut self,
        id: AccountId,
        customer_id: CustomerId,
        kind: AccountKind,
    ) -> Result<(), LedgerError> {
        if self.accounts.contains_key(&id) {
            return Err(LedgerError::DuplicateKey(id));
        }
        let customer = self
            .customers
            .get_mut(&customer_id)
            .ok_or_else(|| LedgerError::NotFound(customer_id.clone()))?;
        customer.accounts.push(id.clone());
        debug!(account = %id, customer = %customer_id, %kind, "account opened");
        self.accounts
            .insert(id, Account::open(customer_id, kind, Utc::now()));
        Ok(())
    }

    /// Returns the new balance.
    pub fn deposit(&mut self, account_id: &str, amount: Decimal) -> Result<Decimal, LedgerError> {
        let account = self.account_mut(account_id)?;
        let event = account.handle_deposit(amount)?;
        account.apply(&event, Utc::now());
        let balance = account.balance();
        debug!(account = account_id, %amount, %balance, "deposit applied");
        Ok(balance)
    }

    /// Returns the new balance.
    pub fn withdraw(&mut self, account_id: &str, amount: Decimal) -> Result<Decimal, LedgerError> {
        let account = self.account_mut(account_id)?;
        let event = account.handle_withdrawal(amount)?;
        account.apply(&event, Utc::now());
        let balance = account.balance();
        debug!(account = account_id, %amount, %balance, "withdrawal applied");
        Ok(balance)
    }

    /// Moves `amount` between two accounts. Both legs are validated before
    /// either is applied, and the paired transfer-out/transfer-in records
    /// share one timestamp.
    pub fn transfer(&mut self, from: &str, to: &str, amount: Decimal) -> Result<(), LedgerError> {
        let source = self.account(from)?;
        let destination = self.account(to)?;
        if from == to {
            return Err(LedgerError::SameAccount);
        }
        let debit = source.handle_transfer_out(amount, to)?;
        let credit = destination.handle_transfer_in(amount, from)?;

        let at = Utc::now();
        self.account_mut(from)?.apply(&debit, at);
        self.account_mut(to)?.apply(&credit, at);
        debug!(%from, %to, %amount, "transfer applied");
        Ok(())
    }

    pub fn balance(&self, account_id: &str) -> Result<Decimal, LedgerError> {
        Ok(self.account(account_id)?.balance())
    }

    /// The most recent `limit` transactions, oldest of the window first.
    pub fn history(
        &self,
        account_id: &str,
        limit: usize,
    ) -> Result<&[TransactionRecord], LedgerError> {
        let transactions = self.account(account_id)?.transactions();
        Ok(&transactions[transactions.len().saturating_sub(limit)..])
    }

    /// A printable statement for one account, borrowing the underlying
    /// records. Render it with `to_string()` or any formatter.
    pub fn statement<'a>(&'a self, account_id: &'a str) -> Result<Statement<'a>, LedgerError> {
        let account = self.account(account_id)?;
        let customer = self
            .customers
            .get(account.customer_id())
            .ok_or_else(|| LedgerError::NotFound(account.customer_id().to_owned()))?;
        Ok(Statement::new(account_id, customer, account))
    }

    pub fn customer(&self, id: &str) -> Result<&Customer, LedgerError> {
        self.customers
            .get(id)
            .ok_or_else(|| LedgerError::NotFound(id.to_owned()))
    }

    pub fn account(&self, id: &str) -> Result<&Account, LedgerError> {
        self.accounts
            .get(id)
            .ok_or_else(|| LedgerError::NotFound(id.to_owned()))
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &Account)> {
        self.accounts.iter()
    }

    fn account_mut(&mut self, id: &str) -> Result<&mut Account, LedgerError> {
        self.accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound(id.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::prelude::{FromPrimitive, Zero};

    use crate::account::TransactionKind;

    use super::*;

    fn dec(value: u32) -> Decimal {
        Decimal::from_u32(value).unwrap()
    }

    /// Ledger with customer C1 owning account A1.
    fn single_account_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger
            .add_customer(
                "C1".to_owned(),
                "Fazal Ur Rehman".to_owned(),
                "fazal@example.com".to_owned(),
            )
            .unwrap();
        ledger
            .open_account("A1".to_owned(), "C1".to_owned(), AccountKind::Checking)
            .unwrap();
        ledger
    }

    #[test]
    fn register_customers_and_open_accounts() {
        let mut ledger = single_account_ledger();

        let err = ledger
            .add_customer("C1".to_owned(), "x".to_owned(), "x@example.com".to_owned())
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateKey(id) if id == "C1"));

        let err = ledger
            .open_account("A1".to_owned(), "C1".to_owned(), AccountKind::Savings)
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateKey(id) if id == "A1"));

        // no account for an unknown customer
        let err = ledger
            .open_account("A2".to_owned(), "C9".to_owned(), AccountKind::Savings)
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(id) if id == "C9"));
        assert!(matches!(ledger.balance("A2"), Err(LedgerError::NotFound(_))));

        let customer = ledger.customer("C1").unwrap();
        assert_eq!(customer.name(), "Fazal Ur Rehman");
        assert_eq!(customer.accounts(), ["A1".to_owned()]);

        let account = ledger.account("A1").unwrap();
        assert_eq!(account.customer_id(), "C1");
        assert_eq!(account.balance(), Decimal::zero());
    }

    #[test]
    fn rejected_operations_leave_state_untouched() {
        let mut ledger = single_account_ledger();
        assert_eq!(ledger.deposit("A1", dec(5000)).unwrap(), dec(5000));

        let err = ledger.withdraw("A1", dec(10000)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Account(AccountError::InsufficientFunds { .. })
        ));
        assert_eq!(ledger.balance("A1").unwrap(), dec(5000));

        let err = ledger.transfer("A1", "A2", dec(1000)).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(id) if id == "A2"));
        assert_eq!(ledger.balance("A1").unwrap(), dec(5000));

        // nothing of the above made it into the log
        assert_eq!(ledger.history("A1", 10).unwrap().len(), 1);
    }

    #[test]
    fn deposit_validation() {
        let mut ledger = single_account_ledger();
        assert!(matches!(
            ledger.deposit("A9", dec(10)),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            ledger.deposit("A1", Decimal::zero()),
            Err(LedgerError::Account(AccountError::InvalidAmount(_)))
        ));
        assert!(matches!(
            ledger.deposit("A1", Decimal::from_i32(-1).unwrap()),
            Err(LedgerError::Account(AccountError::InvalidAmount(_)))
        ));
        assert_eq!(ledger.balance("A1").unwrap(), Decimal::zero());
        assert!(ledger.history("A1", 10).unwrap().is_empty());
    }

    #[test]
    fn transfers_are_zero_sum() {
        let mut ledger = single_account_ledger();
        ledger
            .open_account("A2".to_owned(), "C1".to_owned(), AccountKind::Savings)
            .unwrap();
        ledger.deposit("A1", dec(5000)).unwrap();

        ledger.transfer("A1", "A2", dec(1000)).unwrap();
        assert_eq!(ledger.balance("A1").unwrap(), dec(4000));
        assert_eq!(ledger.balance("A2").unwrap(), dec(1000));

        let out = &ledger.history("A1", 1).unwrap()[0];
        let incoming = &ledger.history("A2", 1).unwrap()[0];
        assert_eq!(
            out.kind,
            TransactionKind::TransferOut {
                to: "A2".to_owned()
            }
        );
        assert_eq!(
            incoming.kind,
            TransactionKind::TransferIn {
                from: "A1".to_owned()
            }
        );
        assert_eq!(out.amount, incoming.amount);
        // both legs share one timestamp
        assert_eq!(out.at, incoming.at);
    }

    #[test]
    fn transfer_validation() {
        let mut ledger = single_account_ledger();
        ledger
            .open_account("A2".to_owned(), "C1".to_owned(), AccountKind::Savings)
            .unwrap();
        ledger.deposit("A1", dec(100)).unwrap();

        assert!(matches!(
            ledger.transfer("A1", "A1", dec(10)),
            Err(LedgerError::SameAccount)
        ));
        assert!(matches!(
            ledger.transfer("A9", "A1", dec(10)),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            ledger.transfer("A1", "A2", Decimal::zero()),
            Err(LedgerError::Account(AccountError::InvalidAmount(_)))
        ));
        assert!(matches!(
            ledger.transfer("A1", "A2", dec(101)),
            Err(LedgerError::Account(AccountError::InsufficientFunds { .. }))
        ));

        // neither side moved
        assert_eq!(ledger.balance("A1").unwrap(), dec(100));
        assert_eq!(ledger.balance("A2").unwrap(), Decimal::zero());
        assert!(ledger.history("A2", 10).unwrap().is_empty());
    }

    #[test]
    fn history_returns_most_recent_window_in_order() {
        let mut ledger = single_account_ledger();
        for amount in 1..=5 {
            ledger.deposit("A1", dec(amount)).unwrap();
        }

        let window = ledger.history("A1", 3).unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].amount, dec(3));
        assert_eq!(window[2].amount, dec(5));

        // a limit larger than the log returns everything
        assert_eq!(ledger.history("A1", 100).unwrap().len(), 5);
        assert!(ledger.history("A1", 0).unwrap().is_empty());
    }

    #[test]
    fn balance_is_reconstructable_from_the_log() {
        let mut ledger = single_account_ledger();
        ledger
            .open_account("A2".to_owned(), "C1".to_owned(), AccountKind::Savings)
            .unwrap();
        ledger.deposit("A1", dec(5000)).unwrap();
        ledger.withdraw("A1", dec(700)).unwrap();
        ledger.transfer("A1", "A2", dec(300)).unwrap();
        ledger.deposit("A1", dec(50)).unwrap();

        let mut running = Decimal::zero();
        for record in ledger.history("A1", usize::MAX).unwrap() {
            match record.kind {
                TransactionKind::Deposit | TransactionKind::TransferIn { .. } => {
                    running += record.amount;
                }
                TransactionKind::Withdrawal | TransactionKind::TransferOut { .. } => {
                    running -= record.amount;
                }
            }
            assert_eq!(record.balance_after, running);
        }
        assert_eq!(ledger.balance("A1").unwrap(), running);
    }
}
