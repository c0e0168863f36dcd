use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// A single hyperparameter value as it crosses a transport boundary.
///
/// JSON callers send native scalars; gRPC callers can only send strings, which
/// [`normalize_params`] turns back into numbers where possible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Str(String),
}

/// Hyperparameters keyed by name. Ordered so records render deterministically.
pub type HyperparameterMap = BTreeMap<String, ParamValue>;

impl ParamValue {
    /// Numeric view of the value, if it is an int or a float.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Str(_) => None,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            // Keep a trailing ".0" so a float re-normalizes as a float.
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Converts one string-encoded value: digits become an int, anything `f64`
/// accepts becomes a float, everything else stays a string.
#[must_use]
pub fn normalize_value(raw: &str) -> ParamValue {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(v) = raw.parse::<i64>() {
            return ParamValue::Int(v);
        }
    }
    match raw.parse::<f64>() {
        Ok(v) => ParamValue::Float(v),
        Err(_) => ParamValue::Str(raw.to_string()),
    }
}

/// Normalizes every string value in `params`. Non-string values pass through.
///
/// Total: the worst case is returning the original string.
#[must_use]
pub fn normalize_params(params: &HyperparameterMap) -> HyperparameterMap {
    let normalized: HyperparameterMap = params
        .iter()
        .map(|(key, value)| {
            let converted = match value {
                ParamValue::Str(raw) => normalize_value(raw),
                other => other.clone(),
            };
            debug!(param = %key, from = value.type_name(), to = converted.type_name(), "Normalized parameter");
            (key.clone(), converted)
        })
        .collect();
    debug!(count = normalized.len(), "Parameter normalization completed");
    normalized
}

/// Builds a map from string pairs, as received over gRPC.
pub fn from_string_pairs<I, K, V>(pairs: I) -> HyperparameterMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), ParamValue::Str(v.into()))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_string_becomes_int() {
        assert_eq!(normalize_value("100"), ParamValue::Int(100));
        assert_eq!(normalize_value("0"), ParamValue::Int(0));
    }

    #[test]
    fn test_decimal_string_becomes_float() {
        assert_eq!(normalize_value("1.5"), ParamValue::Float(1.5));
        assert_eq!(normalize_value("1e-3"), ParamValue::Float(0.001));
    }

    #[test]
    fn test_negative_number_is_float() {
        // Not digit-only, so it goes through the float parse.
        assert_eq!(normalize_value("-3"), ParamValue::Float(-3.0));
    }

    #[test]
    fn test_huge_digit_string_falls_back_to_float() {
        let value = normalize_value("99999999999999999999999");
        assert!(matches!(value, ParamValue::Float(v) if v > 9.0e22));
    }

    #[test]
    fn test_plain_string_is_unchanged() {
        assert_eq!(normalize_value("lbfgs"), ParamValue::Str("lbfgs".to_string()));
        assert_eq!(normalize_value(""), ParamValue::Str(String::new()));
        assert_eq!(normalize_value(" 12"), ParamValue::Str(" 12".to_string()));
    }

    #[test]
    fn test_normalize_params_passes_native_values_through() {
        let mut params = HyperparameterMap::new();
        params.insert("n_estimators".to_string(), ParamValue::Int(10));
        params.insert("C".to_string(), ParamValue::Float(0.5));
        params.insert("max_depth".to_string(), ParamValue::from("5"));
        params.insert("solver".to_string(), ParamValue::from("lbfgs"));

        let normalized = normalize_params(&params);
        assert_eq!(normalized.len(), 4);
        assert_eq!(normalized["n_estimators"], ParamValue::Int(10));
        assert_eq!(normalized["C"], ParamValue::Float(0.5));
        assert_eq!(normalized["max_depth"], ParamValue::Int(5));
        assert_eq!(normalized["solver"], ParamValue::Str("lbfgs".to_string()));
    }

    #[test]
    fn test_normalize_is_total_over_odd_strings() {
        for raw in ["", "-", ".", "1.2.3", "NaN", "inf", "١٢", "0x10", "1_000", "\u{0}"] {
            let params = from_string_pairs([("k", raw)]);
            let normalized = normalize_params(&params);
            assert_eq!(normalized.len(), 1, "lost key for {raw:?}");
        }
    }

    #[test]
    fn test_display_round_trips_through_normalizer() {
        for value in [ParamValue::Int(7), ParamValue::Float(1.0), ParamValue::Float(0.25), ParamValue::from("lbfgs")] {
            assert_eq!(normalize_value(&value.to_string()), value);
        }
    }

    #[test]
    fn test_json_scalars_deserialize_to_matching_variants() {
        let parsed: HyperparameterMap =
            serde_json::from_str(r#"{"a": 10, "b": 1.5, "c": "lbfgs", "d": 2.0}"#).unwrap();
        assert_eq!(parsed["a"], ParamValue::Int(10));
        assert_eq!(parsed["b"], ParamValue::Float(1.5));
        assert_eq!(parsed["c"], ParamValue::Str("lbfgs".to_string()));
        assert_eq!(parsed["d"], ParamValue::Float(2.0));
    }
}
