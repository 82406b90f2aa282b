//! Bootstrap for the demo binary: script parsing, command dispatch and the
//! final account summary. Kept in the library rather than in the binary so
//! the integration tests can drive the whole pipeline through [`Service`].

use std::io::{Read, Write};

use anyhow::{Context, Result};
use csv_parser::{CommandParseError, CsvScriptParser, LedgerCommand};
use csv_printer::{AccountRow, print_accounts};
use thiserror::Error;

use crate::ledger::{Ledger, LedgerError};

pub mod csv_parser;
pub mod csv_printer;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error(transparent)]
    CommandErr(#[from] CommandParseError),
    #[error(transparent)]
    LedgerErr(#[from] LedgerError),
}

/// Runs a CSV ledger script from `input`: statements and the final account
/// summary go to `output`, rejected rows go to `error_printer` together
/// with their 1-based script line.
pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    pub error_printer: Box<dyn FnMut(u64, ScriptError)>,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    pub fn run(mut self) -> Result<()> {
        let parser = CsvScriptParser::new(self.input).context("Failed to read script")?;

        let mut ledger = Ledger::new();

        for (line, parsed) in parser {
            match parsed {
                Err(err) => (self.error_printer)(line, err.into()),
                Ok(LedgerCommand::Statement { account }) => match ledger.statement(&account) {
                    Ok(statement) => writeln!(self.output, "{statement}")
                        .context("Failed to write statement")?,
                    Err(err) => (self.error_printer)(line, err.into()),
                },
                Ok(command) => {
                    if let Err(err) = apply(&mut ledger, command) {
                        (self.error_printer)(line, err.into());
                    }
                }
            }
        }

        print_accounts(
            self.output,
            ledger.accounts().map(|(account_id, acc)| AccountRow {
                account: account_id.clone(),
                customer: acc.customer_id().to_owned(),
                kind: acc.kind().to_string(),
                balance: acc.balance(),
            }),
        )
    }
}

fn apply(ledger: &mut Ledger, command: LedgerCommand) -> Result<(), LedgerError> {
    match command {
        LedgerCommand::AddCustomer { id, name, email } => ledger.add_customer(id, name, email),
        LedgerCommand::OpenAccount { id, customer, kind } => {
            ledger.open_account(id, customer, kind)
        }
        LedgerCommand::Deposit { account, amount } => ledger.deposit(&account, amount).map(|_| ()),
        LedgerCommand::Withdraw { account, amount } => {
            ledger.withdraw(&account, amount).map(|_| ())
        }
        LedgerCommand::Transfer { from, to, amount } => ledger.transfer(&from, &to, amount),
        // queries are handled by the service loop itself
        LedgerCommand::Statement { .. } => Ok(()),
    }
}
