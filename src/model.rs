use serde::{Deserialize, Deserializer, Serialize};

/// Sentinel the service returns in `winner` when it predicts a draw.
pub const DRAW: &str = "draw";

/// Group key used for matches the service sent without a group.
pub const UNKNOWN_GROUP: &str = "Unknown";

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team: String,
    pub country_code: String,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize)]
pub struct PredictRequest {
    pub team1: String,
    pub team2: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tournament: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
pub struct PredictResponse {
    pub winner: String,
    pub prediction_score: f64,
    pub home_score: f64,
    pub away_score: f64,
}

impl PredictResponse {
    pub fn is_draw(&self) -> bool {
        self.winner == DRAW
    }
}

#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
pub struct MatchPrediction {
    pub home_team: String,
    pub away_team: String,
    pub winner: String,
    pub prediction_score: f64,
    pub home_score: f64,
    pub away_score: f64,
    #[serde(default, deserialize_with = "nullable_string")]
    pub group: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub city: String,
}

impl MatchPrediction {
    pub fn is_draw(&self) -> bool {
        self.winner == DRAW
    }

    pub fn group_key(&self) -> &str {
        if self.group.is_empty() {
            UNKNOWN_GROUP
        } else {
            &self.group
        }
    }
}

/// The precomputed list is exported from a dataframe, so missing cells show
/// up as `null`.
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Error body returned by the service on rejected requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_unset_context_fields() {
        let req = PredictRequest {
            team1: "France".to_string(),
            team2: "Brazil".to_string(),
            city: Some("Paris".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"team1": "France", "team2": "Brazil", "city": "Paris"})
        );
    }

    #[test]
    fn match_prediction_tolerates_null_and_missing_group() {
        let raw = r#"[
            {"home_team":"Germany","away_team":"Scotland","winner":"Germany","prediction_score":71.2,
             "home_score":2,"away_score":0,"group":null,"city":"Munich","tournament":"UEFA Euro"},
            {"home_team":"Spain","away_team":"Croatia","winner":"draw","prediction_score":30.5,
             "home_score":1,"away_score":1}
        ]"#;
        let matches: Vec<MatchPrediction> = serde_json::from_str(raw).unwrap();
        assert_eq!(matches[0].group_key(), UNKNOWN_GROUP);
        assert_eq!(matches[0].city, "Munich");
        assert_eq!(matches[1].group_key(), UNKNOWN_GROUP);
        assert!(matches[1].is_draw());
    }

    #[test]
    fn scores_accept_any_json_number() {
        let resp: PredictResponse = serde_json::from_str(
            r#"{"winner":"France","prediction_score":63.4,"home_score":2.0,"away_score":1}"#,
        )
        .unwrap();
        assert_eq!((resp.home_score, resp.away_score), (2.0, 1.0));
        assert_eq!(format!("{}", resp.home_score), "2");

        let matches: Vec<MatchPrediction> = serde_json::from_str(
            r#"[{"home_team":"Germany","away_team":"Scotland","winner":"Germany","prediction_score":71.2,
                 "home_score":2.0,"away_score":0.0,"group":"A","city":"Munich"}]"#,
        )
        .unwrap();
        assert_eq!(matches[0].home_score, 2.0);
        assert_eq!(matches[0].away_score, 0.0);
    }

    #[test]
    fn blank_group_is_kept_as_its_own_key() {
        let m = MatchPrediction {
            group: " ".to_string(),
            ..Default::default()
        };
        assert_eq!(m.group_key(), " ");
        assert_eq!(MatchPrediction::default().group_key(), UNKNOWN_GROUP);
    }

    #[test]
    fn draw_is_decided_by_winner_value() {
        let resp: PredictResponse = serde_json::from_str(
            r#"{"winner":"draw","prediction_score":28.7,"home_score":1,"away_score":1}"#,
        )
        .unwrap();
        assert!(resp.is_draw());

        let resp: PredictResponse = serde_json::from_str(
            r#"{"winner":"France","prediction_score":63.4,"home_score":2,"away_score":1}"#,
        )
        .unwrap();
        assert!(!resp.is_draw());
    }
}
