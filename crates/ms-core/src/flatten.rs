//! Row flattening: project a status document through the schema.

use chrono::{DateTime, Utc};
use ms_common::{Error, FieldPath, FieldValue, Result, Schema};
use ms_telemetry::Row;

use crate::source::StatusDocument;

/// Build the row for one snapshot, one cell per schema field in column order.
///
/// Every field must be present and scalar; nothing is defaulted, because a
/// silently filled cell is indistinguishable from a real reading.
pub fn flatten<D: StatusDocument + ?Sized>(
    snapshot: &D,
    schema: &Schema,
    timestamp: DateTime<Utc>,
) -> Result<Row> {
    let values = schema
        .field_paths()
        .map(|path| cell(snapshot, &path))
        .collect::<Result<Vec<_>>>()?;
    Ok(Row::new(timestamp, values))
}

fn cell<D: StatusDocument + ?Sized>(snapshot: &D, path: &FieldPath<'_>) -> Result<String> {
    let owner = || (path.category.to_string(), path.field.to_string());
    match snapshot.lookup(&path.keys()) {
        Some(FieldValue::Scalar(value)) if value.is_csv_safe() => Ok(value.to_string()),
        Some(FieldValue::Scalar(_)) => {
            let (category, field) = owner();
            Err(Error::UnsafeValue { category, field })
        }
        Some(FieldValue::Document) => {
            let (category, field) = owner();
            Err(Error::NonScalarField { category, field })
        }
        None => Err(Error::missing_field(path.category, path.field)),
    }
}
