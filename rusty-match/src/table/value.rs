use std::{collections::BTreeMap, fmt};

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Attribute value of an edge.
///
/// `Null` doubles as the explicit "none" category when attributes are
/// aggregated, it sorts before every other value.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    String(String),
    Number(OrderedFloat<f64>),
}

pub type Attributes = BTreeMap<String, Value>;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(OrderedFloat(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "none"),
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sorts_first() {
        let mut values = vec![Value::from(2.0), Value::from("cykelsti"), Value::Null];
        values.sort();
        assert_eq!(
            values,
            vec![Value::Null, Value::from("cykelsti"), Value::from(2.0)]
        );
    }

    #[test]
    fn deserializes_untagged() {
        let attrs: Attributes =
            serde_json::from_str(r#"{"vejklasse": "Lokalvej", "bredde": 6.5, "belaegning": null}"#)
                .expect("failed to parse attributes");
        assert_eq!(attrs["vejklasse"], Value::from("Lokalvej"));
        assert_eq!(attrs["bredde"], Value::from(6.5));
        assert!(attrs["belaegning"].is_null());
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::Null.to_string(), "none");
    }
}
