use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::gate::ActivationGate;
use super::intent::{IntentKind, IntentRouter};
use super::speech::phrases::{PhraseBook, HANDLER_TIMED_OUT};
use super::wake::is_wake_phrase;
use crate::audio::listener::{ListenPolicy, SpeechInput};
use crate::config::AssistantConfig;
use crate::error::RecognitionError;
use crate::handlers::Capabilities;
use crate::outputs::speech::SpeechOutput;

#[derive(Debug, Clone, Copy)]
pub struct DispatcherSettings {
    /// Pause after the acknowledgement so the mic does not pick up our own voice.
    pub wake_pause: Duration,
    pub query_timeout: Duration,
    /// `None` lets a hung handler stall the loop indefinitely.
    pub handler_timeout: Option<Duration>,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            wake_pause: Duration::from_secs(1),
            query_timeout: Duration::from_secs(8),
            handler_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl From<&AssistantConfig> for DispatcherSettings {
    fn from(cfg: &AssistantConfig) -> Self {
        Self {
            wake_pause: cfg.wake_pause,
            query_timeout: cfg.query_timeout,
            handler_timeout: cfg.handler_timeout,
        }
    }
}

/// What one listen cycle ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Recognition failed while waiting for the wake phrase.
    Misheard,
    /// Heard something, but not the wake phrase.
    Idle,
    /// Woken while another activation was still in flight.
    Rejected,
    /// Woken, but no query followed.
    NoQuery,
    Handled { intent: IntentKind, reply: String },
    /// The input source is gone.
    Closed,
}

/// The main control loop: wake phrase, query, route, handle, reply.
///
/// One query is handled at a time. Failures while listening are logged and
/// retried without a word; failures while handling are spoken as apologies by
/// the handlers themselves.
pub struct Dispatcher {
    input: Arc<dyn SpeechInput>,
    output: Arc<dyn SpeechOutput>,
    router: IntentRouter,
    capabilities: Capabilities,
    phrases: PhraseBook,
    gate: ActivationGate,
    settings: DispatcherSettings,
}

impl Dispatcher {
    pub fn new(
        input: Arc<dyn SpeechInput>,
        output: Arc<dyn SpeechOutput>,
        capabilities: Capabilities,
        settings: DispatcherSettings,
    ) -> Self {
        Self {
            input,
            output,
            router: IntentRouter::new(),
            capabilities,
            phrases: PhraseBook::default(),
            gate: ActivationGate::new(),
            settings,
        }
    }

    pub fn with_phrases(mut self, phrases: PhraseBook) -> Self {
        self.phrases = phrases;
        self
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Runs until `shutdown` fires or the input closes.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!("Dispatcher started. Say \"hey bob\" to begin.");
        loop {
            let outcome = tokio::select! {
                _ = shutdown.cancelled() => break,
                outcome = self.step() => outcome,
            };
            if outcome == CycleOutcome::Closed {
                info!("Input closed; dispatcher stopping");
                break;
            }
        }
        info!("Dispatcher stopped");
    }

    /// One full listen cycle.
    pub async fn step(&self) -> CycleOutcome {
        let heard = match self.input.listen(ListenPolicy::wake()).await {
            Ok(text) => text,
            Err(RecognitionError::Closed) => return CycleOutcome::Closed,
            Err(e) => {
                debug!("Listening for activation failed: {}", e);
                return CycleOutcome::Misheard;
            }
        };

        if !is_wake_phrase(&heard) {
            debug!("Not a wake phrase: '{}'", heard);
            return CycleOutcome::Idle;
        }

        let Some(_permit) = self.gate.try_acquire() else {
            warn!("Wake phrase ignored: a request is already in progress");
            return CycleOutcome::Rejected;
        };

        self.say(self.phrases.activation()).await;
        tokio::time::sleep(self.settings.wake_pause).await;

        let query = match self.input.listen(ListenPolicy::query(self.settings.query_timeout)).await {
            Ok(query) => query,
            Err(RecognitionError::Closed) => return CycleOutcome::Closed,
            Err(e) => {
                info!("No query captured: {}", e);
                return CycleOutcome::NoQuery;
            }
        };
        info!("Query: {}", query);

        let (intent, reply) = self.handle_query(&query).await;
        self.say(&reply).await;
        self.say(self.phrases.follow_up()).await;

        CycleOutcome::Handled { intent, reply }
    }

    /// Classifies and executes one query, bounded by the handler timeout.
    pub async fn handle_query(&self, query: &str) -> (IntentKind, String) {
        let intent = self.router.classify(query);
        let kind = intent.kind();
        debug!("Routed to {:?}: {:?}", kind, intent);

        let work = self.capabilities.execute(&intent);
        let reply = match self.settings.handler_timeout {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(reply) => reply,
                Err(_) => {
                    warn!("{:?} handler timed out after {:?}", kind, limit);
                    HANDLER_TIMED_OUT.to_string()
                }
            },
            None => work.await,
        };
        (kind, reply)
    }

    /// Speaks and logs a line. Engine failures are logged, never raised.
    async fn say(&self, text: &str) {
        info!("Bob: {}", text);
        if let Err(e) = self.output.speak(text).await {
            warn!("Error during speech generation: {}", e);
        }
    }
}
