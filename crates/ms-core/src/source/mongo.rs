//! Live snapshots from a MongoDB server via `serverStatus`.

use mongodb::bson::{doc, Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::sync::{Client, Database};
use ms_common::{Error, FieldValue, MetricValue, Result};
use tracing::{debug, info};

use super::{SnapshotSource, StatusDocument};

/// Database the administrative commands are sent to.
const ADMIN_DB: &str = "admin";

impl StatusDocument for Document {
    fn lookup(&self, path: &[&str]) -> Option<FieldValue> {
        let (first, rest) = path.split_first()?;
        let mut current = Document::get(self, first)?;
        for key in rest {
            match current {
                Bson::Document(inner) => current = inner.get(key)?,
                _ => return None,
            }
        }
        Some(bson_field(current))
    }
}

fn bson_field(value: &Bson) -> FieldValue {
    let scalar = match value {
        Bson::Document(_) | Bson::Array(_) => return FieldValue::Document,
        Bson::Int32(v) => MetricValue::Int(i64::from(*v)),
        Bson::Int64(v) => MetricValue::Int(*v),
        Bson::Double(v) => MetricValue::Float(*v),
        Bson::Boolean(v) => MetricValue::Bool(*v),
        Bson::String(s) => MetricValue::Text(s.clone()),
        Bson::Null | Bson::Undefined => MetricValue::Null,
        Bson::DateTime(dt) => MetricValue::Text(
            dt.try_to_rfc3339_string()
                .unwrap_or_else(|_| dt.timestamp_millis().to_string()),
        ),
        Bson::Timestamp(ts) => MetricValue::Int(i64::from(ts.time)),
        other => MetricValue::Text(other.to_string()),
    };
    FieldValue::Scalar(scalar)
}

fn driver_error(err: mongodb::error::Error) -> Error {
    match *err.kind {
        ErrorKind::InvalidArgument { ref message, .. } => {
            Error::Config(format!("invalid connection string: {}", message))
        }
        _ => Error::Connectivity(err.to_string()),
    }
}

/// Snapshot source backed by a synchronous driver session.
pub struct MongoStatusSource {
    db: Database,
}

impl MongoStatusSource {
    /// Open a session and confirm the server answers a `ping`.
    ///
    /// Connection options, including `serverSelectionTimeoutMS`, come from
    /// the URL.
    pub fn connect(url: &str) -> Result<Self> {
        let client = Client::with_uri_str(url).map_err(driver_error)?;
        let db = client.database(ADMIN_DB);
        db.run_command(doc! { "ping": 1 }).run().map_err(driver_error)?;
        info!("connected to server");
        Ok(Self { db })
    }
}

impl SnapshotSource for MongoStatusSource {
    type Document = Document;

    fn fetch(&mut self) -> Result<Document> {
        let status = self
            .db
            .run_command(doc! { "serverStatus": 1 })
            .run()
            .map_err(driver_error)?;
        debug!(keys = status.len(), "serverStatus received");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status() -> Document {
        doc! {
            "mem": { "resident": 100_i32, "virtual": 200_i64, "supported": true },
            "wiredTiger": {
                "cache": { "dirty bytes": 5.0_f64 },
                "list": [1, 2],
            },
            "host": "db-1",
        }
    }

    #[test]
    fn looks_up_nested_bson() {
        let doc = status();
        assert_eq!(
            doc.lookup(&["mem", "resident"]),
            Some(FieldValue::Scalar(MetricValue::Int(100)))
        );
        assert_eq!(
            doc.lookup(&["mem", "virtual"]),
            Some(FieldValue::Scalar(MetricValue::Int(200)))
        );
        assert_eq!(
            doc.lookup(&["wiredTiger", "cache", "dirty bytes"]),
            Some(FieldValue::Scalar(MetricValue::Float(5.0)))
        );
        assert_eq!(doc.lookup(&["wiredTiger", "list"]), Some(FieldValue::Document));
        assert_eq!(doc.lookup(&["wiredTiger"]), Some(FieldValue::Document));
    }

    #[test]
    fn absent_paths_are_none() {
        let doc = status();
        assert_eq!(doc.lookup(&["mem", "mapped"]), None);
        assert_eq!(doc.lookup(&["host", "name"]), None);
        assert_eq!(doc.lookup(&[]), None);
    }

    #[test]
    fn renders_bson_scalars() {
        let doc = status();
        let cell = |path: &[&str]| match doc.lookup(path) {
            Some(FieldValue::Scalar(v)) => v.to_string(),
            other => panic!("expected scalar, got {other:?}"),
        };
        assert_eq!(cell(&["mem", "supported"]), "True");
        assert_eq!(cell(&["wiredTiger", "cache", "dirty bytes"]), "5.0");
        assert_eq!(cell(&["host"]), "db-1");
    }
}
