use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One identity group: a single field, or several fields that must all match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldGroup {
    Single(String),
    All(Vec<String>),
}

impl FieldGroup {
    pub fn fields(&self) -> &[String] {
        match self {
            FieldGroup::Single(field) => std::slice::from_ref(field),
            FieldGroup::All(fields) => fields,
        }
    }
}

impl From<&str> for FieldGroup {
    fn from(field: &str) -> Self {
        FieldGroup::Single(field.to_string())
    }
}

impl From<String> for FieldGroup {
    fn from(field: String) -> Self {
        FieldGroup::Single(field)
    }
}

impl From<Vec<&str>> for FieldGroup {
    fn from(fields: Vec<&str>) -> Self {
        FieldGroup::All(fields.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FieldGroup {
    fn from(fields: [&str; N]) -> Self {
        FieldGroup::All(fields.iter().map(|f| f.to_string()).collect())
    }
}

/// Identity fields used when none are configured.
pub fn default_id_fields() -> Vec<FieldGroup> {
    vec![FieldGroup::from("uuId"), FieldGroup::from("id")]
}

/// `null`, `[]` and `[{}]` carry no identity.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(values) => match values.as_slice() {
            [] => true,
            [Value::Object(map)] => map.is_empty(),
            _ => false,
        },
        _ => false,
    }
}

fn is_meaningful(value: &Value) -> bool {
    if is_empty_value(value) {
        return false;
    }
    !matches!(value, Value::Object(map) if map.is_empty())
}

fn strictly_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        // Integers compare exactly; `f64` only when a float is involved.
        (Value::Number(x), Value::Number(y)) if x.is_f64() || y.is_f64() => {
            matches!((x.as_f64(), y.as_f64()), (Some(x), Some(y)) if x == y)
        }
        _ => a == b,
    }
}

fn owns_all(a: &Map<String, Value>, b: &Map<String, Value>, fields: &[String]) -> bool {
    !fields.is_empty()
        && fields
            .iter()
            .all(|field| a.contains_key(field) && b.contains_key(field))
}

/// Field-group identity over serialized items.
///
/// The first group whose fields are present on both sides decides the result
/// alone; later groups are never consulted. Non-objects never match.
pub fn equal_values(a: &Value, b: &Value, groups: &[FieldGroup]) -> bool {
    let (Value::Object(a), Value::Object(b)) = (a, b) else {
        return false;
    };

    for group in groups {
        let fields = group.fields();
        if !owns_all(a, b, fields) {
            continue;
        }
        return fields.iter().all(|field| {
            let (left, right) = (&a[field], &b[field]);
            is_meaningful(left) && is_meaningful(right) && strictly_equal(left, right)
        });
    }

    false
}
