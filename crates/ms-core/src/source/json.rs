//! JSON status documents, used for fixtures and offline replays.

use ms_common::{FieldValue, MetricValue};
use serde_json::Value;

use super::StatusDocument;

impl StatusDocument for Value {
    fn lookup(&self, path: &[&str]) -> Option<FieldValue> {
        let mut current = self;
        for key in path {
            current = current.as_object()?.get(*key)?;
        }
        Some(match current {
            Value::Null => FieldValue::Scalar(MetricValue::Null),
            Value::Bool(b) => FieldValue::Scalar(MetricValue::Bool(*b)),
            Value::Number(n) => FieldValue::Scalar(match n.as_i64() {
                Some(i) => MetricValue::Int(i),
                None => match n.as_u64() {
                    Some(u) => MetricValue::Text(u.to_string()),
                    None => MetricValue::Float(n.as_f64().unwrap_or(f64::NAN)),
                },
            }),
            Value::String(s) => FieldValue::Scalar(MetricValue::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => FieldValue::Document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_nested_objects() {
        let doc = json!({"wiredTiger": {"cache": {"dirty bytes": 5}}});
        assert_eq!(
            doc.lookup(&["wiredTiger", "cache", "dirty bytes"]),
            Some(FieldValue::Scalar(MetricValue::Int(5)))
        );
        assert_eq!(doc.lookup(&["wiredTiger", "cache"]), Some(FieldValue::Document));
        assert_eq!(doc.lookup(&["wiredTiger", "capacity"]), None);
    }

    #[test]
    fn does_not_descend_through_scalars() {
        let doc = json!({"mem": 3});
        assert_eq!(doc.lookup(&["mem", "resident"]), None);
    }

    #[test]
    fn maps_scalar_kinds() {
        let doc = json!({"a": 1.5, "b": true, "c": "x", "d": null, "e": [1], "f": u64::MAX});
        assert_eq!(doc.lookup(&["a"]), Some(FieldValue::Scalar(MetricValue::Float(1.5))));
        assert_eq!(doc.lookup(&["b"]), Some(FieldValue::Scalar(MetricValue::Bool(true))));
        assert_eq!(doc.lookup(&["c"]), Some(FieldValue::Scalar(MetricValue::from("x"))));
        assert_eq!(doc.lookup(&["d"]), Some(FieldValue::Scalar(MetricValue::Null)));
        assert_eq!(doc.lookup(&["e"]), Some(FieldValue::Document));
        assert_eq!(
            doc.lookup(&["f"]),
            Some(FieldValue::Scalar(MetricValue::Text(u64::MAX.to_string())))
        );
    }
}
