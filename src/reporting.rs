// Result export for authprobe
//
// Results go out three ways: newline-delimited JSON for the external
// persistence/report collaborators, plus CSV and Markdown summaries for a
// quick human read. CSV fields are escaped against spreadsheet formula
// injection.

use crate::errors::PlanError;
use crate::models::{TestResult, TestStatus};
use chrono::Local;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Escape a CSV field to prevent formula injection. Cells starting with
/// =, +, -, @, or tab are prefixed with a single quote.
fn escape_csv_field(field: &str) -> String {
    if field.is_empty() {
        return String::new();
    }

    let first_char = field.chars().next().unwrap();
    let needs_escaping = matches!(first_char, '=' | '+' | '-' | '@' | '\t');

    if needs_escaping || field.contains(',') || field.contains('"') {
        if needs_escaping {
            format!("\"'{}\"", field.replace('"', "\"\""))
        } else {
            format!("\"{}\"", field.replace('"', "\"\""))
        }
    } else {
        field.to_string()
    }
}

/// Write results as newline-delimited JSON, one TestResult per line.
pub fn export_jsonl(results: &[TestResult], path: &Path) -> Result<(), PlanError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for result in results {
        serde_json::to_writer(&mut writer, result)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_csv(results: &[TestResult]) -> Result<String, std::io::Error> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let filename = format!("authprobe_report_{}.csv", timestamp);
    let mut file = File::create(&filename)?;

    writeln!(file, "TestType,TestName,Method,URL,Status,Severity")?;
    for result in results {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            escape_csv_field(&result.test_type.to_string()),
            escape_csv_field(&result.test_name),
            escape_csv_field(&result.request_data.method),
            escape_csv_field(&result.request_data.url),
            escape_csv_field(&format!("{:?}", result.status).to_lowercase()),
            escape_csv_field(&format!("{:?}", result.severity).to_lowercase()),
        )?;
    }

    Ok(filename)
}

pub fn export_markdown(results: &[TestResult]) -> Result<String, std::io::Error> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let filename = format!("authprobe_report_{}.md", timestamp);
    let mut file = File::create(&filename)?;

    let vulnerable = results
        .iter()
        .filter(|r| r.status == TestStatus::Vulnerable)
        .count();
    let errors = results
        .iter()
        .filter(|r| r.status == TestStatus::Error)
        .count();

    writeln!(file, "# authprobe Report\n")?;
    writeln!(
        file,
        "{} tests executed, {} vulnerable, {} errors.\n",
        results.len(),
        vulnerable,
        errors
    )?;
    for result in results {
        writeln!(
            file,
            "- **{}** [{:?}/{:?}] {} {}: {}",
            result.test_type,
            result.status,
            result.severity,
            result.request_data.method,
            result.request_data.url,
            result.test_name
        )?;
    }

    Ok(filename)
}
