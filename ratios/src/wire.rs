//! Parsing ratio payloads returned by the remote service.

use indexswap_common::{RatioFields, RatioSet};
use serde_json::Value;

use crate::error::FetchError;

/// Parse a 200 response body into a validated [`RatioSet`].
///
/// The labelled ratio fields may sit at the top level of the object or inside
/// a nested `"ratios"` object. Any missing, null or non-positive ratio rejects
/// the whole body.
pub fn parse_ratio_body(body: &str) -> Result<RatioSet, FetchError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::MalformedBody(e.to_string()))?;

    let payload = match value {
        Value::Object(mut map) => match map.remove("ratios") {
            Some(Value::Object(nested)) => nested,
            _ => map,
        },
        other => {
            return Err(FetchError::MalformedBody(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    let fields: RatioFields = serde_json::from_value(Value::Object(payload))
        .map_err(|e| FetchError::MalformedBody(e.to_string()))?;

    Ok(RatioSet::try_from(fields)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexswap_common::{RatioKind, ValidationError};

    #[test]
    fn test_flat_body() {
        let body = r#"{"NDX/QQQ Ratio": 40.9, "NQ/QQQ Ratio": 41.2, "ES/SPY Ratio": 10.05}"#;
        let set = parse_ratio_body(body).unwrap();
        assert_eq!(set, RatioSet::new(40.9, 41.2, 10.05).unwrap());
    }

    #[test]
    fn test_nested_snapshot_body() {
        let body = r#"{
            "status": "ok",
            "timestamp": "2024-03-01T14:30:00",
            "ratios": {"NDX/QQQ Ratio": 40.9, "NQ/QQQ Ratio": 41.2, "ES/SPY Ratio": 10.05}
        }"#;
        let set = parse_ratio_body(body).unwrap();
        assert_eq!(set.es_per_spy(), 10.05);
    }

    #[test]
    fn test_index_document_is_missing_ratios() {
        let body = r#"{"status": "ok", "message": "API is running", "endpoints": ["/"]}"#;
        assert_eq!(
            parse_ratio_body(body),
            Err(FetchError::InvalidRatios(ValidationError::MissingRatio(RatioKind::NdxPerQqq)))
        );
    }

    #[test]
    fn test_non_positive_ratio_rejected() {
        let body = r#"{"NDX/QQQ Ratio": 40.9, "NQ/QQQ Ratio": 0, "ES/SPY Ratio": 10.05}"#;
        assert!(matches!(
            parse_ratio_body(body),
            Err(FetchError::InvalidRatios(ValidationError::NonPositiveRatio { .. }))
        ));
    }

    #[test]
    fn test_malformed_bodies() {
        assert!(matches!(parse_ratio_body("<html>"), Err(FetchError::MalformedBody(_))));
        assert!(matches!(parse_ratio_body("[1, 2]"), Err(FetchError::MalformedBody(_))));
        let stringly = r#"{"NDX/QQQ Ratio": "40.9", "NQ/QQQ Ratio": 41.2, "ES/SPY Ratio": 10.05}"#;
        assert!(matches!(parse_ratio_body(stringly), Err(FetchError::MalformedBody(_))));
    }
}
