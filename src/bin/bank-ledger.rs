use std::fs::File;

use anyhow::{Context, Result};
use bank_ledger::bin_utils::{Service, ScriptError};

fn main() -> Result<()> {
    let filename = std::env::args()
        .nth(1)
        .context("Expected a script file name as the first argument")?;
    let file = File::open(&filename).with_context(|| format!("Failed to open `{filename}`"))?;

    let service = Service {
        input: file,
        output: &mut std::io::stdout(),
        error_printer: Box::new(|line, err| match err {
            ScriptError::CommandErr(err) => eprintln!("Error at line {line}: {err}"),
            // rejected operations are expected, report and carry on
            ScriptError::LedgerErr(err) => eprintln!("Rejected at line {line}: {err}"),
        }),
    };
    service.run()
}
