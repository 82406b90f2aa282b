use std::fmt;

use crate::{
    account::{Account, TransactionKind},
    ledger::Customer,
};

/// Statements show the tail of the transaction log only.
const STATEMENT_ROWS: usize = 10;

/// Borrow-based view over one account and its owning customer, produced by
/// [`crate::ledger::Ledger::statement`]. The exact layout is presentation
/// only; nothing downstream parses it.
#[derive(Debug)]
pub struct Statement<'a> {
    account_id: &'a str,
    customer: &'a Customer,
    account: &'a Account,
}

impl<'a> Statement<'a> {
    pub(crate) fn new(account_id: &'a str, customer: &'a Customer, account: &'a Account) -> Self {
        Self {
            account_id,
            customer,
            account,
        }
    }
}

impl fmt::Display for Statement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:=<60}", "")?;
        writeln!(f, "ACCOUNT STATEMENT")?;
        writeln!(f, "{:=<60}", "")?;
        writeln!(
            f,
            "Customer: {} ({})",
            self.customer.name(),
            self.customer.email()
        )?;
        writeln!(f, "Account ID: {}", self.account_id)?;
        writeln!(f, "Account Type: {}", self.account.kind())?;
        writeln!(
            f,
            "Created: {}",
            self.account.created_at().format("%Y-%m-%d %H:%M")
        )?;
        writeln!(f, "Current Balance: ${:.2}", self.account.balance())?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<15} {:<15} {:<12} {:<12}",
            "TYPE", "FROM/TO", "AMOUNT", "BALANCE"
        )?;
        writeln!(f, "{:-<60}", "")?;

        let transactions = self.account.transactions();
        let tail = &transactions[transactions.len().saturating_sub(STATEMENT_ROWS)..];
        for record in tail {
            let (label, counterparty) = match &record.kind {
                TransactionKind::Deposit => ("Deposit", "-"),
                TransactionKind::Withdrawal => ("Withdrawal", "-"),
                TransactionKind::TransferOut { to } => ("Transfer Out", to.as_str()),
                TransactionKind::TransferIn { from } => ("Transfer In", from.as_str()),
            };
            writeln!(
                f,
                "{:<15} {:<15} {:<12} {:<12}",
                label,
                counterparty,
                format!("${:.2}", record.amount),
                format!("${:.2}", record.balance_after),
            )?;
        }
        write!(f, "{:=<60}", "")
    }
}
