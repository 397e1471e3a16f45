//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/click`.
///
/// Both fields are optional on the wire; the server substitutes defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClickRequest {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub clicks: Option<i64>,
}

/// Body of `POST /api/score`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub score: i64,
}

/// One row of `GET /api/leaderboard`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub country: String,
    pub clicks: u64,
    /// Clicks per second, present on the worldwide row only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kps: Option<f64>,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// `connected` or `disconnected`
    pub redis: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_only_serialized_when_present() {
        let country = LeaderboardEntry {
            country: "Japan".to_string(),
            clicks: 3,
            kps: None,
        };
        let worldwide = LeaderboardEntry {
            country: "Worldwide".to_string(),
            clicks: 3,
            kps: Some(0.0),
        };

        assert_eq!(
            serde_json::to_value(&country).unwrap(),
            serde_json::json!({"country": "Japan", "clicks": 3})
        );
        assert_eq!(
            serde_json::to_value(&worldwide).unwrap(),
            serde_json::json!({"country": "Worldwide", "clicks": 3, "kps": 0.0})
        );
    }

    #[test]
    fn test_click_request_fields_are_optional() {
        let req: ClickRequest = serde_json::from_str("{}").unwrap();
        assert!(req.country.is_none());
        assert!(req.clicks.is_none());
    }
}
