//! Output formatting for binding reports.

use crate::config::FieldReport;
use crate::error::ConfigError;
use serde_json::{Value, json};

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Format field reports as an aligned text table.
pub fn format_reports_text(reports: &[FieldReport]) -> String {
    let width = reports
        .iter()
        .map(|r| r.directive.lookup_name.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for report in reports {
        let mut flags = Vec::new();
        if report.directive.required {
            flags.push("required".to_string());
        }
        if report.directive.is_array {
            flags.push(format!("array({})", report.directive.array_delimiter));
        }
        if report.directive.redacted {
            flags.push("redacted".to_string());
        }

        let value = match (&report.value, report.origin) {
            (Some(value), Some(origin)) => format!("{} [{}]", value, origin),
            _ => "<unset>".to_string(),
        };

        out.push_str(&format!(
            "{:width$} = {}",
            report.directive.lookup_name,
            value,
            width = width
        ));
        if !flags.is_empty() {
            out.push_str(&format!("  ({})", flags.join(", ")));
        }
        out.push('\n');
    }

    out
}

/// Format field reports as a JSON array.
pub fn format_reports_json(reports: &[FieldReport]) -> Value {
    serde_json::to_value(reports).unwrap_or_else(|_| json!([]))
}

/// Format a binding failure as JSON.
pub fn format_error_json(err: &ConfigError) -> Value {
    let mut value = json!({
        "code": err.code(),
        "message": err.to_string(),
    });
    if let Some(field) = err.field() {
        value["field"] = json!(field);
    }
    value
}
