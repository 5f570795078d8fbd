//! LUIS-style HTTP classifier

use super::{Classifier, NluError};
use crate::matchers::{IntentScore, DEFAULT_THRESHOLD};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://westus.api.cognitive.microsoft.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Configuration for the NLU collaborator
#[derive(Debug, Clone)]
pub struct NluConfig {
    pub app_id: Option<String>,
    pub key: Option<String>,
    pub endpoint: String,
    /// Minimum confidence for an intent to count
    pub threshold: f64,
    /// How long a turn waits for the classifier
    pub timeout: Duration,
}

impl Default for NluConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            threshold: DEFAULT_THRESHOLD,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl NluConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            app_id: std::env::var("LUIS_APP_ID").ok(),
            key: std::env::var("LUIS_KEY").ok(),
            endpoint: std::env::var("LUIS_ENDPOINT").unwrap_or(defaults.endpoint),
            threshold: std::env::var("LUIS_THRESHOLD")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.threshold),
            timeout: std::env::var("LUIS_TIMEOUT_MS")
                .ok()
                .and_then(|t| t.parse().ok())
                .map_or(defaults.timeout, Duration::from_millis),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LuisResponse {
    #[serde(default)]
    top_scoring_intent: Option<LuisIntent>,
    #[serde(default)]
    intents: Vec<LuisIntent>,
    #[serde(default)]
    entities: Vec<LuisEntity>,
}

#[derive(Debug, Deserialize)]
struct LuisIntent {
    intent: String,
    #[serde(default)]
    score: f64,
}

#[derive(Debug, Deserialize)]
struct LuisEntity {
    entity: String,
    #[serde(rename = "type")]
    kind: String,
}

impl LuisResponse {
    fn into_scores(self) -> Vec<IntentScore> {
        // Entities are reported per utterance; the first of each type wins
        let mut entities: HashMap<String, String> = HashMap::new();
        for e in self.entities {
            entities.entry(e.kind).or_insert(e.entity);
        }

        let intents = if self.intents.is_empty() {
            self.top_scoring_intent.into_iter().collect()
        } else {
            self.intents
        };

        intents
            .into_iter()
            .map(|i| IntentScore {
                intent: i.intent,
                score: i.score,
                entities: entities.clone(),
            })
            .collect()
    }
}

/// Client for a LUIS v2 prediction endpoint
pub struct LuisClassifier {
    client: Client,
    url: String,
    key: String,
}

impl LuisClassifier {
    pub fn new(client: Client, endpoint: &str, app_id: &str, key: impl Into<String>) -> Self {
        Self {
            client,
            url: format!("{}/luis/v2.0/apps/{app_id}", endpoint.trim_end_matches('/')),
            key: key.into(),
        }
    }

    /// Build from configuration; `Ok(None)` unless both credentials are present
    pub fn from_config(config: &NluConfig) -> Result<Option<Self>, NluError> {
        let (Some(app_id), Some(key)) = (&config.app_id, &config.key) else {
            return Ok(None);
        };
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Some(Self::new(client, &config.endpoint, app_id, key.clone())))
    }
}

#[async_trait]
impl Classifier for LuisClassifier {
    async fn classify(&self, utterance: &str) -> Result<Vec<IntentScore>, NluError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("subscription-key", self.key.as_str()),
                ("verbose", "true"),
                ("q", utterance),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NluError::status(status.as_u16(), message));
        }

        let body = response.text().await?;
        parse_response(&body)
    }

    fn name(&self) -> &str {
        "luis"
    }
}

fn parse_response(body: &str) -> Result<Vec<IntentScore>, NluError> {
    let parsed: LuisResponse =
        serde_json::from_str(body).map_err(|e| NluError::malformed(e.to_string()))?;
    Ok(parsed.into_scores())
}
