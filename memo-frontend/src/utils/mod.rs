pub mod validation;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Deserialize an upstream id that may arrive as a string or a number into
/// the opaque string form used everywhere downstream.
pub fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "unsupported id value: {other}"
        ))),
    }
}

/// Deserialize a form-field amount leniently: numbers and numeric strings
/// parse, anything else collapses to zero rather than failing the request.
pub fn lenient_decimal_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(lenient_decimal_value))
}

fn lenient_decimal_value(value: serde_json::Value) -> Decimal {
    match value {
        serde_json::Value::Number(n) => {
            Decimal::from_str(&n.to_string()).unwrap_or(Decimal::ZERO)
        }
        serde_json::Value::String(s) => {
            Decimal::from_str(s.trim()).unwrap_or(Decimal::ZERO)
        }
        _ => Decimal::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient_decimal_opt")]
        amount: Option<Decimal>,
    }

    #[test]
    fn test_lenient_decimal_parses_numbers_and_strings() {
        let probe: Probe = serde_json::from_value(serde_json::json!({ "amount": 12.5 })).unwrap();
        assert_eq!(probe.amount, Some(Decimal::from_str("12.5").unwrap()));

        let probe: Probe =
            serde_json::from_value(serde_json::json!({ "amount": " 7.25 " })).unwrap();
        assert_eq!(probe.amount, Some(Decimal::from_str("7.25").unwrap()));
    }

    #[test]
    fn test_lenient_decimal_collapses_garbage_to_zero() {
        let probe: Probe = serde_json::from_value(serde_json::json!({ "amount": "abc" })).unwrap();
        assert_eq!(probe.amount, Some(Decimal::ZERO));

        let probe: Probe = serde_json::from_value(serde_json::json!({ "amount": true })).unwrap();
        assert_eq!(probe.amount, Some(Decimal::ZERO));

        let probe: Probe = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(probe.amount, None);
    }
}
