//! Document extraction commands
//!
//! Prints the validated extraction result as pretty JSON, suitable for
//! piping into other tools.

use std::path::Path;

use anyhow::{Context, Result};

use fisc_core::ai::AIClient;
use fisc_core::extract::Extractor;

fn read_document(file: &Path) -> Result<Vec<u8>> {
    std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))
}

pub async fn cmd_extract_payslip(client: &AIClient, file: &Path) -> Result<()> {
    let document = read_document(file)?;
    println!("📄 Extracting payslip data from {}...", file.display());

    let extractor = Extractor::new(client.clone());
    let data = extractor
        .extract_payslip(&document)
        .await
        .context("Payslip extraction failed")?;

    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

pub async fn cmd_extract_statement(client: &AIClient, file: &Path) -> Result<()> {
    let document = read_document(file)?;
    println!("📄 Extracting transactions from {}...", file.display());

    let extractor = Extractor::new(client.clone());
    let transactions = extractor
        .extract_statement(&document)
        .await
        .context("Statement extraction failed")?;

    println!("{}", serde_json::to_string_pretty(&transactions)?);
    println!();
    println!("   {} transaction(s) extracted", transactions.len());
    Ok(())
}
