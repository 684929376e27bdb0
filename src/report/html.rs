use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::MetricRecord;
use crate::util::ensure_directory;

const SUMMARY_HEADERS: [&str; 5] = [
    "Metric",
    "Description",
    "Safe Range",
    "Actual Value",
    "Status",
];

const STYLE: &str = "
        body {
            font-family: Arial, sans-serif;
        }
        h2 {
            color: #2E86C1;
        }
        table {
            border-collapse: collapse;
            width: 100%;
        }
        th, td {
            border: 1px solid #ccc;
            padding: 8px;
            text-align: left;
        }
        th {
            background-color: #f2f2f2;
        }
";

pub fn render_email_body(records: &[MetricRecord], generated_at: &str) -> String {
    let mut html = String::new();

    html.push_str("<html>\n<head>\n    <style>");
    html.push_str(STYLE);
    html.push_str("    </style>\n</head>\n<body>\n");
    html.push_str("    <h2>📊 SonarQube Analysis Summary</h2>\n");
    let _ = writeln!(
        html,
        "    <p><strong>Generated on:</strong> {}</p>",
        escape(generated_at)
    );
    html.push_str(&render_table(records));
    html.push_str("</body>\n</html>\n");

    html
}

fn render_table(records: &[MetricRecord]) -> String {
    let mut table = String::from("    <table>\n      <thead>\n        <tr>\n");
    for header in SUMMARY_HEADERS {
        let _ = writeln!(table, "          <th>{header}</th>");
    }
    table.push_str("        </tr>\n      </thead>\n      <tbody>\n");

    for record in records {
        table.push_str("        <tr>\n");
        for cell in [
            record.name.as_str(),
            record.description.as_str(),
            record.safe_range.as_str(),
            record.raw_value.as_str(),
            record.status.label(),
        ] {
            let _ = writeln!(table, "          <td>{}</td>", escape(cell));
        }
        table.push_str("        </tr>\n");
    }

    table.push_str("      </tbody>\n    </table>\n");
    table
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn write_email_body(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    fs::write(path, html)
        .with_context(|| format!("failed to write email body: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ParsedValue;
    use crate::model::MetricStatus;

    fn record(name: &str, raw: &str, safe_range: &str, status: MetricStatus) -> MetricRecord {
        MetricRecord {
            name: name.to_string(),
            raw_value: raw.to_string(),
            parsed_value: ParsedValue::Text(raw.to_string()),
            description: "desc".to_string(),
            safe_range: safe_range.to_string(),
            status,
        }
    }

    #[test]
    fn renders_one_row_per_record_with_status_labels() {
        let html = render_email_body(
            &[
                record("Coverage", "85.0", ">= 80%", MetricStatus::Ok),
                record("Bugs", "2", "= 0", MetricStatus::NeedsReview),
            ],
            "2026-10-15 09:30:00",
        );

        assert_eq!(html.matches("<tr>").count(), 3);
        assert!(html.contains("<td>✅ Fine</td>"));
        assert!(html.contains("<td>⚠️ Needs Check</td>"));
        assert!(html.contains("<strong>Generated on:</strong> 2026-10-15 09:30:00"));
    }

    #[test]
    fn escapes_cell_text() {
        let html = render_email_body(
            &[record("Code Smells", "5", "<= 5", MetricStatus::Ok)],
            "now",
        );
        assert!(html.contains("<td>&lt;= 5</td>"));
        assert!(!html.contains("<td><= 5</td>"));
    }

    #[test]
    fn email_body_lands_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("email_body.html");
        write_email_body(&path, "<html></html>").expect("write email body");
        assert_eq!(
            fs::read_to_string(&path).expect("read back"),
            "<html></html>"
        );
    }
}
