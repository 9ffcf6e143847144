//! Output formatting utilities

use console::style;
use serde::Serialize;

use super::OutputFormat;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("→").blue(), message);
}

/// Create a styled header
pub fn header(text: &str) -> String {
    style(text).bold().to_string()
}

/// Create a styled key-value line
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

/// Print a resource: pretty JSON for `--format json`, otherwise through `text`
pub fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce(&T),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}

/// Text rendering for pass-through resources with no dedicated layout
pub fn pretty(value: &impl Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(err) => error(&err.to_string()),
    }
}

/// Print a completion message, or `{"success": true, ..}` for JSON output
pub fn done(format: OutputFormat, message: &str) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "success": true, "message": message });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => success(message),
    }
    Ok(())
}
