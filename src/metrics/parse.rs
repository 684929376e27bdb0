use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Numeric,
    Text,
}

/// A raw measure value after typed parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedValue {
    Number(f64),
    Text(String),
    Invalid { raw: String, reason: String },
}

impl ParsedValue {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}

impl fmt::Display for ParsedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
            Self::Invalid { raw, .. } => f.write_str(raw),
        }
    }
}

/// Numeric values may carry a trailing `%`.
pub fn parse_value(raw: &str, kind: ValueKind) -> ParsedValue {
    match kind {
        ValueKind::Text => ParsedValue::Text(raw.trim().to_string()),
        ValueKind::Numeric => {
            let trimmed = raw.trim();
            let digits = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
            match digits.parse::<f64>() {
                Ok(value) if value.is_finite() => ParsedValue::Number(value),
                Ok(_) => ParsedValue::Invalid {
                    raw: raw.to_string(),
                    reason: "value is not finite".to_string(),
                },
                Err(err) => ParsedValue::Invalid {
                    raw: raw.to_string(),
                    reason: err.to_string(),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_values_accept_percent_suffix() {
        assert_eq!(parse_value("81.5%", ValueKind::Numeric), ParsedValue::Number(81.5));
        assert_eq!(parse_value(" 3 ", ValueKind::Numeric), ParsedValue::Number(3.0));
    }

    #[test]
    fn unparseable_numbers_are_invalid() {
        let parsed = parse_value("n/a", ValueKind::Numeric);
        assert!(parsed.is_invalid());
        assert_eq!(parsed.to_string(), "n/a");
        assert!(parse_value("NaN", ValueKind::Numeric).is_invalid());
    }

    #[test]
    fn text_values_are_kept() {
        assert_eq!(
            parse_value(" ERROR ", ValueKind::Text),
            ParsedValue::Text("ERROR".to_string())
        );
    }
}
