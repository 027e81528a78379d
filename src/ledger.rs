//! Bookkeeping for the server-reported total item count.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a delete adjusts the fetched total count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TotalCountDirective {
    /// Read the new absolute total from this field of the response.
    Field(String),
    /// Subtract a fixed amount.
    Amount(u64),
    /// Subtract one per deleted item.
    PerItem(bool),
}

impl From<&str> for TotalCountDirective {
    fn from(field: &str) -> Self {
        TotalCountDirective::Field(field.to_string())
    }
}

impl From<String> for TotalCountDirective {
    fn from(field: String) -> Self {
        TotalCountDirective::Field(field)
    }
}

impl From<u64> for TotalCountDirective {
    fn from(amount: u64) -> Self {
        TotalCountDirective::Amount(amount)
    }
}

impl From<bool> for TotalCountDirective {
    fn from(enabled: bool) -> Self {
        TotalCountDirective::PerItem(enabled)
    }
}

fn as_count(value: &Value) -> Option<u64> {
    if let Some(count) = value.as_u64() {
        return Some(count);
    }
    value
        .as_f64()
        .filter(|count| *count >= 0.0 && count.fract() == 0.0 && *count <= u64::MAX as f64)
        .map(|count| count as u64)
}

impl TotalCountDirective {
    /// Total after deleting `deleted` items, or a description of why the
    /// directive cannot be applied (the caller then keeps `previous`).
    ///
    /// `response` is the (first) delete response, already serialized.
    pub fn apply(
        &self,
        previous: Option<u64>,
        response: Option<&Value>,
        deleted: usize,
    ) -> Result<Option<u64>, String> {
        match self {
            TotalCountDirective::Field(field) => {
                let value = response
                    .and_then(|response| response.get(field))
                    .ok_or_else(|| format!("response has no field {:?}", field))?;
                as_count(value)
                    .map(Some)
                    .ok_or_else(|| format!("field {:?} is not a non-negative integer: {}", field, value))
            }
            TotalCountDirective::Amount(amount) => {
                let previous = previous.ok_or("no total count fetched yet")?;
                if *amount == 0 || *amount > previous {
                    return Err(format!(
                        "cannot subtract {} from total count {}",
                        amount, previous
                    ));
                }
                Ok(Some(previous - amount))
            }
            TotalCountDirective::PerItem(false) => Ok(previous),
            TotalCountDirective::PerItem(true) => {
                let previous = previous.ok_or("no total count fetched yet")?;
                let deleted = deleted as u64;
                if previous < deleted {
                    return Err(format!(
                        "cannot subtract {} deleted items from total count {}",
                        deleted, previous
                    ));
                }
                Ok(Some(previous - deleted))
            }
        }
    }
}
