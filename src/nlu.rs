//! Intent classification collaborator
//!
//! The bot never understands language itself; it asks an external
//! classifier for scored intents. Any failure, including a timeout, is
//! treated exactly like "no confident intent".

mod error;
mod luis;

pub use error::NluError;
pub use luis::{LuisClassifier, NluConfig};

use crate::matchers::IntentScore;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Common interface for intent classifiers
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Score the utterance against every known intent
    async fn classify(&self, utterance: &str) -> Result<Vec<IntentScore>, NluError>;

    /// Name used in logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Classifier + ?Sized> Classifier for Arc<T> {
    async fn classify(&self, utterance: &str) -> Result<Vec<IntentScore>, NluError> {
        (**self).classify(utterance).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Classifier used when no NLU service is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopClassifier;

#[async_trait]
impl Classifier for NoopClassifier {
    async fn classify(&self, _utterance: &str) -> Result<Vec<IntentScore>, NluError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// Classify with a deadline, folding every failure into "no intents".
pub async fn classify_within(
    classifier: &dyn Classifier,
    utterance: &str,
    limit: Duration,
) -> Vec<IntentScore> {
    let start = std::time::Instant::now();
    match timeout(limit, classifier.classify(utterance)).await {
        Ok(Ok(intents)) => {
            tracing::debug!(
                classifier = %classifier.name(),
                duration_ms = %start.elapsed().as_millis(),
                intents = intents.len(),
                "Classification completed"
            );
            intents
        }
        Ok(Err(e)) => {
            tracing::warn!(classifier = %classifier.name(), error = %e, "Classification failed");
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(
                classifier = %classifier.name(),
                timeout_ms = %limit.as_millis(),
                "Classification timed out"
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::testing::MockClassifier;

    #[tokio::test]
    async fn test_failure_is_no_intent() {
        let classifier = MockClassifier::new();
        classifier.queue_error(NluError::status(500, "boom"));
        let intents = classify_within(&classifier, "sing", Duration::from_secs(1)).await;
        assert!(intents.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_no_intent() {
        let classifier = MockClassifier::new().with_delay(Duration::from_secs(10));
        classifier.queue(vec![IntentScore::new("singASong", 0.9)]);
        let intents = classify_within(&classifier, "sing", Duration::from_secs(1)).await;
        assert!(intents.is_empty());
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let classifier = MockClassifier::new();
        classifier.queue(vec![IntentScore::new("singASong", 0.9)]);
        let intents = classify_within(&classifier, "sing", Duration::from_secs(1)).await;
        assert_eq!(intents.len(), 1);
        assert_eq!(classifier.recorded_utterances(), vec!["sing"]);
    }

    #[tokio::test]
    async fn test_noop_classifier() {
        let intents = NoopClassifier.classify("anything").await.unwrap();
        assert!(intents.is_empty());
    }
}
