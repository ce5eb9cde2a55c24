//! Output formatting for qka-cli (table, json, csv)

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print a summary line that only belongs in human-readable output
    pub fn note(&self, msg: &str) {
        if self.shows_notes() {
            println!("{}", msg.dimmed());
        }
    }

    fn shows_notes(&self) -> bool {
        !self.quiet && self.format == OutputFormat::Table
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print rows in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    println!("{}", Table::new(data));
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
                );
            }
            OutputFormat::Csv => {
                if let Err(e) = print_csv(data) {
                    self.error(&format!("Failed to write CSV: {}", e));
                }
            }
        }
    }

    /// Print a plain list of strings, one per line in table mode
    pub fn print_list(&self, items: &[String]) {
        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string())
                );
            }
            OutputFormat::Table | OutputFormat::Csv => {
                for item in items {
                    println!("{}", item);
                }
            }
        }
    }

    /// Print an arbitrary operation result
    pub fn print_value(&self, value: &Value) {
        match value {
            Value::String(s) if self.format != OutputFormat::Json => println!("{}", s),
            other => println!(
                "{}",
                serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string())
            ),
        }
    }
}

/// Print rows as CSV with a header taken from the field names
fn print_csv<T: Serialize>(data: &[T]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    for row in data {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// Operation display for the operations command
#[derive(Debug, Tabled, Serialize)]
pub struct OperationRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Parameters")]
    pub parameters: String,
    #[tabled(rename = "Serialized")]
    pub serialized: String,
    #[tabled(rename = "Description")]
    pub description: String,
}

/// Stock code with its board
#[derive(Debug, Tabled, Serialize)]
pub struct CodeRow {
    #[tabled(rename = "Code")]
    pub code: String,
    #[tabled(rename = "Board")]
    pub board: String,
}

/// One bar of one code
#[derive(Debug, Tabled, Serialize)]
pub struct BarRow {
    #[tabled(rename = "Code")]
    pub code: String,
    #[tabled(rename = "Time")]
    pub time: String,
    #[tabled(rename = "Open")]
    pub open: f64,
    #[tabled(rename = "High")]
    pub high: f64,
    #[tabled(rename = "Low")]
    pub low: f64,
    #[tabled(rename = "Close")]
    pub close: f64,
    #[tabled(rename = "Volume")]
    pub volume: f64,
    #[tabled(rename = "Amount")]
    pub amount: f64,
}
