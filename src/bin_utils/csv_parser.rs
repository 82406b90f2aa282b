use std::io::{self, BufRead, BufReader, Cursor, Read};

use csv::{StringRecord, StringRecordsIntoIter, Trim};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::AccountKind;

/// One operation of a ledger script. Rows are `op,args...`; see
/// [`LedgerCommand::from_record`] for the accepted shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCommand {
    AddCustomer {
        id: String,
        name: String,
        email: String,
    },
    OpenAccount {
        id: String,
        customer: String,
        kind: AccountKind,
    },
    Deposit {
        account: String,
        amount: Decimal,
    },
    Withdraw {
        account: String,
        amount: Decimal,
    },
    Transfer {
        from: String,
        to: String,
        amount: Decimal,
    },
    Statement {
        account: String,
    },
}

#[derive(Debug, Error)]
pub enum CommandParseError {
    #[error("empty record, expected an operation name")]
    MissingOp,
    #[error("unknown operation `{0}`")]
    UnknownOp(String),
    #[error("`{op}` is missing the `{field}` field")]
    MissingField {
        op: &'static str,
        field: &'static str,
    },
    #[error("`{value}` is not a valid amount")]
    BadAmount { value: String },
}

impl LedgerCommand {
    /// Accepted rows:
    ///
    /// ```text
    /// customer,ID,NAME,EMAIL
    /// account,ID,CUSTOMER[,KIND]      (kind defaults to savings)
    /// deposit,ACCOUNT,AMOUNT
    /// withdraw,ACCOUNT,AMOUNT
    /// transfer,FROM,TO,AMOUNT
    /// statement,ACCOUNT
    /// ```
    pub fn from_record(record: &StringRecord) -> Result<Self, CommandParseError> {
        let op = record
            .get(0)
            .filter(|op| !op.is_empty())
            .ok_or(CommandParseError::MissingOp)?;
        match op {
            "customer" => Ok(Self::AddCustomer {
                id: require(record, 1, "customer", "id")?,
                name: require(record, 2, "customer", "name")?,
                email: require(record, 3, "customer", "email")?,
            }),
            "account" => Ok(Self::OpenAccount {
                id: require(record, 1, "account", "id")?,
                customer: require(record, 2, "account", "customer")?,
                kind: AccountKind::from(record.get(3).filter(|k| !k.is_empty()).unwrap_or("savings")),
            }),
            "deposit" => Ok(Self::Deposit {
                account: require(record, 1, "deposit", "account")?,
                amount: amount(record, 2, "deposit")?,
            }),
            "withdraw" => Ok(Self::Withdraw {
                account: require(record, 1, "withdraw", "account")?,
                amount: amount(record, 2, "withdraw")?,
            }),
            "transfer" => Ok(Self::Transfer {
                from: require(record, 1, "transfer", "from")?,
                to: require(record, 2, "transfer", "to")?,
                amount: amount(record, 3, "transfer")?,
            }),
            "statement" => Ok(Self::Statement {
                account: require(record, 1, "statement", "account")?,
            }),
            unknown => Err(CommandParseError::UnknownOp(unknown.to_owned())),
        }
    }
}

fn require(
    record: &StringRecord,
    index: usize,
    op: &'static str,
    field: &'static str,
) -> Result<String, CommandParseError> {
    record
        .get(index)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .ok_or(CommandParseError::MissingField { op, field })
}

fn amount(
    record: &StringRecord,
    index: usize,
    op: &'static str,
) -> Result<Decimal, CommandParseError> {
    let raw = require(record, index, op, "amount")?;
    raw.parse()
        .map_err(|_| CommandParseError::BadAmount { value: raw })
}

/// Parses a ledger script in CSV format: no header row, `#` comments,
/// rows of varying width. Comment lines are stripped before the CSV reader
/// ever sees them, because the reader's record positions don't account for
/// lines its own comment handling skips; every yielded row carries its
/// 1-based physical line in the script.
///
/// # Panics
///
/// If a row cannot be read as CSV
pub struct CsvScriptParser {
    iter: StringRecordsIntoIter<Cursor<Vec<u8>>>,
    /// Physical script line of each surviving row, indexed by filtered line.
    line_map: Vec<u64>,
}

impl CsvScriptParser {
    pub fn new(source: impl Read) -> io::Result<Self> {
        let mut filtered = String::new();
        let mut line_map = Vec::new();
        for (index, line) in BufReader::new(source).lines().enumerate() {
            let line = line?;
            if line.trim_start().starts_with('#') {
                continue;
            }
            line_map.push(index as u64 + 1);
            filtered.push_str(&line);
            filtered.push('\n');
        }

        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .has_headers(false)
            .from_reader(Cursor::new(filtered.into_bytes()));

        Ok(Self {
            iter: reader.into_records(),
            line_map,
        })
    }
}

impl Iterator for CsvScriptParser {
    type Item = (u64, Result<LedgerCommand, CommandParseError>);

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|row| {
            let row = row.unwrap();
            let filtered_line = row.position().map_or(0, |pos| pos.line());
            let line = self
                .line_map
                .get(filtered_line.saturating_sub(1) as usize)
                .copied()
                .unwrap_or(filtered_line);
            (line, LedgerCommand::from_record(&row))
        })
    }
}
