//! Metric and summary payload types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A single ingested measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// When the measurement was taken (RFC 3339).
    pub timestamp: DateTime<Utc>,
    /// Measured value.
    pub value: f64,
    /// Metric type, e.g. `cpu_usage`.
    #[serde(rename = "type")]
    pub metric_type: String,
}

/// Acknowledgment returned by ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestAck {
    pub message: String,
}

impl IngestAck {
    pub fn received() -> Self {
        Self {
            message: "Metric received successfully".to_string(),
        }
    }
}

/// Aggregated view over metrics of one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "type")]
    pub metric_type: String,
    pub period: String,
    /// Mean value rounded to two decimals; 0.0 when `count` is 0.
    pub average_value: f64,
    pub count: u64,
    pub external_data: Option<Value>,
}

/// Cache key for a summary query.
pub fn summary_cache_key(metric_type: &str, period: &str) -> String {
    format!("summary:{}:{}", metric_type, period)
}

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        // Magnitudes this large carry no fractional digits.
        value
    }
}

/// External data used when the breaker rejects the call.
pub fn fallback_unavailable() -> Value {
    json!({
        "status": "fallback",
        "message": "External service temporarily unavailable",
    })
}

/// External data used when the dependency call itself fails.
pub fn fallback_error() -> Value {
    json!({
        "status": "error",
        "message": "External service failed",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_wire_format() {
        let metric: Metric = serde_json::from_value(json!({
            "timestamp": "2024-05-01T12:00:00Z",
            "value": 85.5,
            "type": "cpu_usage",
        }))
        .unwrap();

        assert_eq!(metric.metric_type, "cpu_usage");
        assert_eq!(metric.value, 85.5);

        let back = serde_json::to_value(&metric).unwrap();
        assert_eq!(back["type"], "cpu_usage");
        assert!(back.get("metric_type").is_none());
    }

    #[test]
    fn test_metric_requires_type() {
        let result = serde_json::from_value::<Metric>(json!({
            "timestamp": "2024-05-01T12:00:00Z",
            "value": 1.0,
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_summary_keeps_null_external_data() {
        let summary = Summary {
            metric_type: "mem".into(),
            period: "1h".into(),
            average_value: 0.0,
            count: 0,
            external_data: None,
        };
        let encoded = serde_json::to_string(&summary).unwrap();
        assert!(encoded.contains("\"external_data\":null"));
        assert_eq!(serde_json::from_str::<Summary>(&encoded).unwrap(), summary);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(85.5), 85.5);
        assert_eq!(round2(1.0 / 3.0), 0.33);
        assert_eq!(round2(2.0 / 3.0), 0.67);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(1e308), 1e308);
        assert_eq!(round2(-f64::MAX), -f64::MAX);
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(summary_cache_key("cpu_usage", "any"), "summary:cpu_usage:any");
    }
}
