//! Parse command implementation.

use lexbulk_feed::{ChangeRecord, ChangeSetParser};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Parse result.
#[derive(Debug, Serialize)]
pub struct ParseResult {
    /// Payload path.
    pub path: String,
    /// Parsed records.
    pub records: Vec<ChangeRecord>,
    /// Parser warnings.
    pub warnings: Vec<String>,
}

/// Runs the parse command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let payload = fs::read_to_string(path)?;
    let outcome = ChangeSetParser::new().parse(&payload)?;

    let result = ParseResult {
        path: path.display().to_string(),
        warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
        records: outcome.change_set.into_iter().collect(),
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        "text" => print_text(&result),
        other => return Err(format!("Unknown format: {other}").into()),
    }
    Ok(())
}

fn print_text(result: &ParseResult) {
    println!("Payload: {}", result.path);
    println!("Records: {}", result.records.len());
    for record in &result.records {
        let action = record
            .action_type
            .map_or("-", |action| action.as_str());
        let text_len = record.text.as_ref().map_or(0, String::len);
        println!(
            "  {:<40} {:<8} {:<24} {} bytes",
            record.content_id,
            action,
            record.subscription_id.as_deref().unwrap_or("-"),
            text_len
        );
    }
    if !result.warnings.is_empty() {
        println!("Warnings: {}", result.warnings.len());
        for warning in &result.warnings {
            println!("  {warning}");
        }
    }
}
