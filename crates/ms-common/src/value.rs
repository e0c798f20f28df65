//! Scalar metric values read out of a status snapshot.

use std::fmt;

/// A single scalar metric value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl MetricValue {
    /// Whether the rendered value can be written into an unquoted CSV cell.
    pub fn is_csv_safe(&self) -> bool {
        match self {
            MetricValue::Text(s) => !s.contains([',', '\n', '\r']),
            _ => true,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Int(v) => write!(f, "{}", v),
            // Debug keeps the fractional part of whole floats ("1.0", not "1").
            MetricValue::Float(v) => write!(f, "{:?}", v),
            MetricValue::Bool(true) => f.write_str("True"),
            MetricValue::Bool(false) => f.write_str("False"),
            MetricValue::Text(s) => f.write_str(s),
            MetricValue::Null => f.write_str("None"),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<bool> for MetricValue {
    fn from(v: bool) -> Self {
        MetricValue::Bool(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        MetricValue::Text(v.to_string())
    }
}

/// What a path lookup into a status document found.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(MetricValue),
    /// A nested document or array; only valid as a container, never as a cell.
    Document,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_like_the_csv_expects() {
        assert_eq!(MetricValue::Int(100).to_string(), "100");
        assert_eq!(MetricValue::Int(-3).to_string(), "-3");
        assert_eq!(MetricValue::Float(1.0).to_string(), "1.0");
        assert_eq!(MetricValue::Float(0.25).to_string(), "0.25");
        assert_eq!(MetricValue::Bool(true).to_string(), "True");
        assert_eq!(MetricValue::Null.to_string(), "None");
        assert_eq!(MetricValue::from("idle").to_string(), "idle");
    }

    #[test]
    fn text_with_separators_is_not_csv_safe() {
        assert!(MetricValue::Int(5).is_csv_safe());
        assert!(MetricValue::from("plain words").is_csv_safe());
        assert!(!MetricValue::from("a,b").is_csv_safe());
        assert!(!MetricValue::from("line\nbreak").is_csv_safe());
        assert!(!MetricValue::from("carriage\rreturn").is_csv_safe());
    }
}
