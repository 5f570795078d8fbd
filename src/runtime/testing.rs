//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use super::{ConversationRuntime, OutgoingEvent, RuntimeError, TurnReply, TurnRequest};
use crate::bot::RecipeBot;
use crate::db::MessageRole;
use crate::matchers::IntentScore;
use crate::nlu::{Classifier, NluError};
use crate::reply::ReplySequencer;
use crate::state_machine::{ConversationState, ConversationStore};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Mock Classifier
// ============================================================================

/// Classifier that returns queued responses; an empty queue means no intents
#[allow(dead_code)]
pub struct MockClassifier {
    responses: Mutex<VecDeque<Result<Vec<IntentScore>, NluError>>>,
    delay: Option<Duration>,
    /// Record of every utterance classified
    pub utterances: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockClassifier {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            delay: None,
            utterances: Mutex::new(Vec::new()),
        }
    }

    /// Sleep this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful response
    pub fn queue(&self, intents: Vec<IntentScore>) {
        self.responses.lock().unwrap().push_back(Ok(intents));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: NluError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_utterances(&self) -> Vec<String> {
        self.utterances.lock().unwrap().clone()
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, utterance: &str) -> Result<Vec<IntentScore>, NluError> {
        self.utterances.lock().unwrap().push(utterance.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Recording Sink
// ============================================================================

/// Reply sink that remembers every delivery, optionally failing after a
/// number of successful ones
pub struct RecordingSink {
    deliveries: Mutex<Vec<(String, String)>>,
    fail_after: Option<usize>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self {
            deliveries: Mutex::new(Vec::new()),
            fail_after: None,
        }
    }

    /// Accept `n` deliveries, then fail every later one
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Messages delivered to one conversation, in order
    pub fn messages(&self, conv_id: &str) -> Vec<String> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == conv_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Every delivery across conversations, in order
    pub fn all(&self) -> Vec<(String, String)> {
        self.deliveries.lock().unwrap().clone()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn deliver(&self, conv_id: &str, message: &str) -> Result<(), DeliveryError> {
        let mut deliveries = self.deliveries.lock().unwrap();
        if self.fail_after.is_some_and(|n| deliveries.len() >= n) {
            return Err(DeliveryError::new(conv_id, "sink closed"));
        }
        deliveries.push((conv_id.to_string(), message.to_string()));
        Ok(())
    }
}

// ============================================================================
// In-Memory Storage
// ============================================================================

/// In-memory storage for testing
#[derive(Default)]
pub struct InMemoryStorage {
    states: Mutex<HashMap<String, ConversationState>>,
    transcript: Mutex<Vec<(String, MessageRole, String)>>,
    fail_saves: AtomicBool,
}

#[allow(dead_code)]
impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `save_state` fail
    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    pub fn current_state(&self, conv_id: &str) -> Option<ConversationState> {
        self.states.lock().unwrap().get(conv_id).cloned()
    }

    pub fn transcript(&self, conv_id: &str) -> Vec<(MessageRole, String)> {
        self.transcript
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _, _)| id == conv_id)
            .map(|(_, role, text)| (*role, text.clone()))
            .collect()
    }
}

#[async_trait]
impl StateStore for InMemoryStorage {
    async fn save_state(&self, conv_id: &str, state: &ConversationState) -> Result<(), String> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err("disk full".to_string());
        }
        self.states
            .lock()
            .unwrap()
            .insert(conv_id.to_string(), state.clone());
        Ok(())
    }
}

#[async_trait]
impl TranscriptStore for InMemoryStorage {
    async fn record(&self, conv_id: &str, role: MessageRole, text: &str) -> Result<(), String> {
        self.transcript
            .lock()
            .unwrap()
            .push((conv_id.to_string(), role, text.to_string()));
        Ok(())
    }
}

// ============================================================================
// Test Runtime
// ============================================================================

/// A conversation runtime wired to mocks and running in the background
pub struct TestRuntime {
    pub storage: Arc<InMemoryStorage>,
    pub sink: Arc<RecordingSink>,
    pub turn_tx: mpsc::Sender<TurnRequest>,
    pub broadcast_rx: broadcast::Receiver<OutgoingEvent>,
    pub cancel: CancellationToken,
    _runtime_handle: tokio::task::JoinHandle<()>,
}

pub struct TestRuntimeBuilder {
    bot: Option<RecipeBot>,
    state: ConversationState,
    sink: RecordingSink,
    sequencer: ReplySequencer,
}

#[allow(dead_code)]
impl TestRuntimeBuilder {
    pub fn new() -> Self {
        Self {
            bot: None,
            state: ConversationState::default(),
            sink: RecordingSink::new(),
            sequencer: ReplySequencer::default(),
        }
    }

    pub fn bot(mut self, bot: RecipeBot) -> Self {
        self.bot = Some(bot);
        self
    }

    pub fn state(mut self, state: ConversationState) -> Self {
        self.state = state;
        self
    }

    pub fn sink(mut self, sink: RecordingSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn reply_delay(mut self, delay: Duration) -> Self {
        self.sequencer = ReplySequencer::new(delay);
        self
    }

    pub fn build(self) -> TestRuntime {
        let bot = match self.bot {
            Some(bot) => bot,
            None => RecipeBot::with_catalog(Arc::new(crate::catalog::test_catalog()))
                .expect("test bot builds"),
        };
        let storage = Arc::new(InMemoryStorage::new());
        let sink = Arc::new(self.sink);
        let cancel = CancellationToken::new();
        let (turn_tx, turn_rx) = mpsc::channel(32);
        let (broadcast_tx, broadcast_rx) = broadcast::channel(128);

        let runtime = ConversationRuntime::new(
            "test-conv",
            Arc::new(bot),
            ConversationStore::new(self.state),
            storage.clone(),
            sink.clone(),
            self.sequencer,
            turn_rx,
            broadcast_tx,
        )
        .with_cancel(cancel.clone());

        let handle = tokio::spawn(async move {
            runtime.run().await;
        });

        TestRuntime {
            storage,
            sink,
            turn_tx,
            broadcast_rx,
            cancel,
            _runtime_handle: handle,
        }
    }
}

impl Default for TestRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl TestRuntime {
    pub fn builder() -> TestRuntimeBuilder {
        TestRuntimeBuilder::new()
    }

    /// Queue an utterance; the receiver resolves when its turn is done
    pub async fn enqueue(&self, text: &str) -> oneshot::Receiver<Result<TurnReply, RuntimeError>> {
        let (respond_to, response) = oneshot::channel();
        self.turn_tx
            .send(TurnRequest {
                utterance: text.to_string(),
                respond_to,
            })
            .await
            .expect("runtime is running");
        response
    }

    /// Send an utterance and wait for its turn
    pub async fn say(&self, text: &str) -> Result<TurnReply, RuntimeError> {
        self.enqueue(text).await.await.expect("runtime answered")
    }

    pub fn delivered(&self) -> Vec<String> {
        self.sink.messages("test-conv")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::{TurnError, TurnOutcome};
    use crate::catalog::test_catalog;
    use crate::prompts::PromptError;

    #[tokio::test]
    async fn test_mock_classifier_queue() {
        let mock = MockClassifier::new();
        mock.queue(vec![IntentScore::new("singASong", 0.7)]);

        let first = mock.classify("sing").await.unwrap();
        let second = mock.classify("again").await.unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(mock.recorded_utterances(), vec!["sing", "again"]);
    }

    #[tokio::test]
    async fn test_turn_round_trip() {
        let runtime = TestRuntime::builder().build();

        let reply = runtime.say("I want to make toast").await.unwrap();

        assert_eq!(reply.outcome, TurnOutcome::Rule { handler: "choose_recipe" });
        assert_eq!(runtime.delivered(), reply.replies);
        assert_eq!(
            runtime
                .storage
                .current_state("test-conv")
                .and_then(|s| s.recipe_name().map(String::from)),
            Some("Toast".to_string())
        );
        let transcript = runtime.storage.transcript("test-conv");
        assert_eq!(transcript[0], (MessageRole::User, "I want to make toast".to_string()));
        assert_eq!(transcript.len(), 1 + reply.replies.len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_turns_never_interleave() {
        let runtime = TestRuntime::builder()
            .reply_delay(Duration::from_secs(1))
            .build();

        let first = runtime.enqueue("I want to make toast").await;
        let second = runtime.enqueue("ready").await;
        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        let mut expected = first.replies.clone();
        expected.extend(second.replies.clone());
        assert_eq!(runtime.delivered(), expected);
        assert_eq!(second.replies, vec!["Toast the bread.", "That's it!"]);
    }

    #[tokio::test]
    async fn test_failed_turn_reports_and_keeps_state() {
        let state = ConversationState {
            prompt_key: Some("Retired_Prompt".to_string()),
            ..ConversationState::default()
        };
        let mut runtime = TestRuntime::builder().state(state).build();

        let result = runtime.say("hello").await;

        assert!(matches!(
            result,
            Err(RuntimeError::Turn(TurnError::Prompt(PromptError::Unregistered(_))))
        ));
        assert!(runtime.delivered().is_empty());
        assert!(runtime.storage.current_state("test-conv").is_none());
        assert!(matches!(
            runtime.broadcast_rx.recv().await.unwrap(),
            OutgoingEvent::Error { .. }
        ));
    }

    #[tokio::test]
    async fn test_storage_failure_rolls_back() {
        let runtime = TestRuntime::builder().build();
        runtime.storage.fail_saves();

        let result = runtime.say("toast").await;
        assert!(matches!(result, Err(RuntimeError::Storage(_))));
        assert!(runtime.delivered().is_empty());

        // Still recipeless, so no action and no save is needed
        let reply = runtime.say("ready").await.unwrap();
        assert_eq!(reply.replies, vec!["First please choose a recipe"]);
    }

    #[tokio::test]
    async fn test_delivery_failure_surfaces() {
        let runtime = TestRuntime::builder()
            .sink(RecordingSink::new().fail_after(1))
            .build();

        let result = runtime.say("yorn").await;

        assert!(matches!(result, Err(RuntimeError::Delivery(_))));
        assert_eq!(runtime.delivered(), vec!["Do you like cheese?"]);
        assert_eq!(
            runtime
                .storage
                .current_state("test-conv")
                .and_then(|s| s.prompt_key),
            Some("Like_Cheese".to_string())
        );
    }

    #[tokio::test]
    async fn test_cancel_stops_between_turns() {
        let runtime = TestRuntime::builder()
            .bot(RecipeBot::with_catalog(Arc::new(test_catalog())).unwrap())
            .build();
        runtime.say("toast").await.unwrap();

        runtime.cancel.cancel();
        runtime.turn_tx.closed().await;

        assert!(runtime.turn_tx.is_closed());
    }
}
