//! Conversation pipeline.
//!
//! This module provides [`ConversationPipeline`], which mediates user
//! submissions against connectivity, owns the append-only message log, and
//! projects the view-ready entry sequence (log plus the transient typing
//! entry). Failed sends surface as exactly one synthetic assistant message
//! worded by failure category; raw transport errors never reach the log.

use std::sync::Arc;

use crate::config::ChatConfig;
use crate::observability;
use crate::session::SessionManager;
use crate::transport::ChatTransport;
use crate::types::{Connectivity, FailureKind, Message, MessageRole};

/// Why a submission was skipped without touching the log.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The text was empty or whitespace-only.
    Empty,

    /// The session is not connected.
    Disconnected,

    /// A previous submission has not resolved yet.
    Pending,
}

/// The result of one submission attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The service replied and the assistant message was appended.
    Delivered,

    /// The send failed; a synthetic error message was appended.
    Failed(FailureKind),

    /// The submission was rejected up front; the log is unchanged and the
    /// transport was never invoked.
    Rejected(SkipReason),
}

/// One entry in the projected view.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ViewEntry<'a> {
    /// A message from the log.
    Message(&'a Message),

    /// The transient typing indicator. Never part of the persisted log.
    Typing,
}

/// Owns the message log and in-flight request bookkeeping.
///
/// At most one request is pending at a time; submission while pending is
/// rejected, not queued. The log is append-only for the lifetime of the
/// pipeline, so log order is submission/arrival order.
pub struct ConversationPipeline<T: ChatTransport> {
    transport: Arc<T>,
    config: ChatConfig,
    messages: Vec<Message>,
    next_sequence: u64,
    pending: bool,
    last_request_time: Option<f64>,
}

impl<T: ChatTransport> ConversationPipeline<T> {
    /// Creates a new pipeline over the given transport.
    pub fn new(transport: Arc<T>, config: ChatConfig) -> Self {
        Self {
            transport,
            config,
            messages: Vec::new(),
            next_sequence: 0,
            pending: false,
            last_request_time: None,
        }
    }

    /// Submits one user message.
    ///
    /// Rejected silently when the session is not connected, the text is
    /// blank, or a request is already pending. Otherwise the user message is
    /// appended, the send runs against the configured deadline, and the
    /// outcome (reply or categorized error message) is appended behind it.
    pub async fn submit(&mut self, text: &str, session: &mut SessionManager<T>) -> SubmitOutcome {
        observability::PIPELINE_SUBMISSIONS.click();
        if text.trim().is_empty() {
            observability::PIPELINE_REJECTED.click();
            return SubmitOutcome::Rejected(SkipReason::Empty);
        }
        if session.connectivity() != Connectivity::Connected {
            observability::PIPELINE_REJECTED.click();
            return SubmitOutcome::Rejected(SkipReason::Disconnected);
        }
        if self.pending {
            observability::PIPELINE_REJECTED.click();
            return SubmitOutcome::Rejected(SkipReason::Pending);
        }

        self.append(MessageRole::User, text);
        self.pending = true;

        let send = self.transport.send_message(text, session.session_token());
        let result = tokio::time::timeout(self.config.send_timeout, send).await;

        let outcome = match result {
            Ok(Ok(reply)) if !reply.content.trim().is_empty() => {
                if let Some(token) = reply.session_id {
                    // Persistence is best effort; the in-memory token still
                    // advances on failure.
                    let _ = session.record_token(token);
                }
                if let Some(seconds) = reply.request_time {
                    observability::PIPELINE_REQUEST_TIME.add(seconds);
                }
                self.last_request_time = reply.request_time;
                self.append(MessageRole::Assistant, &reply.content);
                SubmitOutcome::Delivered
            }
            Ok(Ok(_)) => {
                session.note_send_failure(FailureKind::Send, false);
                let wording = self.config.error_messages.general.clone();
                self.inject_error(&wording);
                SubmitOutcome::Failed(FailureKind::Send)
            }
            Ok(Err(err)) => {
                let kind = if err.is_timeout() {
                    FailureKind::Timeout
                } else {
                    FailureKind::Send
                };
                let lost_connection = err.is_connection();
                let wording = if kind == FailureKind::Timeout {
                    self.config.error_messages.timeout.clone()
                } else if lost_connection {
                    self.config.error_messages.disconnected.clone()
                } else {
                    self.config.error_messages.general.clone()
                };
                session.note_send_failure(kind, lost_connection);
                self.inject_error(&wording);
                SubmitOutcome::Failed(kind)
            }
            Err(_elapsed) => {
                observability::PIPELINE_TIMEOUTS.click();
                session.note_send_failure(FailureKind::Timeout, false);
                let wording = self.config.error_messages.timeout.clone();
                self.inject_error(&wording);
                SubmitOutcome::Failed(FailureKind::Timeout)
            }
        };

        self.pending = false;
        outcome
    }

    /// Produces the view-ready sequence: the log in order, then one typing
    /// entry iff a request is pending and the session is not reconnecting.
    pub fn project_view(&self, session: &SessionManager<T>) -> Vec<ViewEntry<'_>> {
        let mut view: Vec<ViewEntry<'_>> = self.messages.iter().map(ViewEntry::Message).collect();
        if self.pending && session.connectivity() != Connectivity::Reconnecting {
            view.push(ViewEntry::Typing);
        }
        view
    }

    /// Selects the input placeholder for the current phase.
    pub fn placeholder(&self, session: &SessionManager<T>) -> &str {
        self.config
            .placeholders
            .for_phase(session.connectivity(), self.pending)
    }

    /// Returns the message log in append order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages in the log.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Returns true while a submission is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Server-side processing time of the most recent delivered reply, in
    /// seconds, when the service reported one.
    pub fn last_request_time(&self) -> Option<f64> {
        self.last_request_time
    }

    fn append(&mut self, role: MessageRole, content: &str) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.messages.push(Message::new(role, content, sequence));
    }

    /// Appends a synthetic assistant error message unless an identical one
    /// already trails the log. Dedup is last-entry-only.
    fn inject_error(&mut self, text: &str) {
        observability::PIPELINE_ERROR_MESSAGES.click();
        let duplicate = self
            .messages
            .last()
            .is_some_and(|m| m.is_assistant() && m.content == text);
        if !duplicate {
            self.append(MessageRole::Assistant, text);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::error::{Error, Result};
    use crate::store::MemoryTokenStore;
    use crate::types::{ChatReply, HealthStatus};

    /// Transport that replays scripted results and records send calls.
    struct ScriptedTransport {
        health: Mutex<VecDeque<Result<HealthStatus>>>,
        replies: Mutex<VecDeque<Result<ChatReply>>>,
        sends: Mutex<Vec<(String, Option<String>)>>,
        hang_sends: bool,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<ChatReply>>) -> Arc<Self> {
            Arc::new(Self {
                health: Mutex::new(VecDeque::from(vec![Ok(HealthStatus::ok())])),
                replies: Mutex::new(replies.into()),
                sends: Mutex::new(Vec::new()),
                hang_sends: false,
            })
        }

        fn unhealthy() -> Arc<Self> {
            Arc::new(Self {
                health: Mutex::new(VecDeque::from(vec![Ok(HealthStatus::error(None))])),
                replies: Mutex::new(VecDeque::new()),
                sends: Mutex::new(Vec::new()),
                hang_sends: false,
            })
        }

        fn hanging() -> Arc<Self> {
            Arc::new(Self {
                health: Mutex::new(VecDeque::from(vec![Ok(HealthStatus::ok())])),
                replies: Mutex::new(VecDeque::new()),
                sends: Mutex::new(Vec::new()),
                hang_sends: true,
            })
        }

        fn send_calls(&self) -> Vec<(String, Option<String>)> {
            self.sends.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn send_message(
            &self,
            message: &str,
            session_id: Option<&str>,
        ) -> Result<ChatReply> {
            self.sends
                .lock()
                .unwrap()
                .push((message.to_string(), session_id.map(String::from)));
            if self.hang_sends {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::connection("script exhausted", None)))
        }

        async fn check_health(&self) -> Result<HealthStatus> {
            self.health
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(HealthStatus::ok()))
        }
    }

    async fn connected_session(
        transport: Arc<ScriptedTransport>,
    ) -> SessionManager<ScriptedTransport> {
        let mut session = SessionManager::new(transport, Box::new(MemoryTokenStore::new()));
        session.initialize().await.unwrap();
        assert_eq!(session.connectivity(), Connectivity::Connected);
        session
    }

    #[tokio::test]
    async fn successful_send_appends_user_then_assistant() {
        let transport = ScriptedTransport::new(vec![Ok(
            ChatReply::new("Hello there!").with_session_id("tok-1")
        )]);
        let mut session = connected_session(transport.clone()).await;
        let mut pipeline = ConversationPipeline::new(transport.clone(), ChatConfig::new());

        let outcome = pipeline.submit("hi", &mut session).await;
        assert_eq!(outcome, SubmitOutcome::Delivered);

        let log = pipeline.messages();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].role, MessageRole::User);
        assert_eq!(log[0].content, "hi");
        assert_eq!(log[0].sequence, 0);
        assert_eq!(log[1].role, MessageRole::Assistant);
        assert_eq!(log[1].content, "Hello there!");
        assert_eq!(log[1].sequence, 1);

        assert!(!pipeline.is_pending());
        assert_eq!(session.session_token(), Some("tok-1"));
    }

    #[tokio::test]
    async fn request_time_is_surfaced_from_the_reply() {
        let transport = ScriptedTransport::new(vec![Ok(
            ChatReply::new("done").with_request_time(1.25)
        )]);
        let mut session = connected_session(transport.clone()).await;
        let mut pipeline = ConversationPipeline::new(transport.clone(), ChatConfig::new());

        assert_eq!(pipeline.last_request_time(), None);
        pipeline.submit("hi", &mut session).await;
        assert_eq!(pipeline.last_request_time(), Some(1.25));
    }

    #[tokio::test]
    async fn token_is_forwarded_on_subsequent_sends() {
        let transport = ScriptedTransport::new(vec![
            Ok(ChatReply::new("first").with_session_id("tok-1")),
            Ok(ChatReply::new("second").with_session_id("tok-1")),
        ]);
        let mut session = connected_session(transport.clone()).await;
        let mut pipeline = ConversationPipeline::new(transport.clone(), ChatConfig::new());

        pipeline.submit("one", &mut session).await;
        pipeline.submit("two", &mut session).await;

        let calls = transport.send_calls();
        assert_eq!(calls[0], ("one".to_string(), None));
        assert_eq!(calls[1], ("two".to_string(), Some("tok-1".to_string())));
    }

    #[tokio::test]
    async fn rejected_when_disconnected() {
        let transport = ScriptedTransport::unhealthy();
        let mut session = SessionManager::new(transport.clone(), Box::new(MemoryTokenStore::new()));
        session.initialize().await.unwrap();
        assert_eq!(session.connectivity(), Connectivity::Disconnected);

        let mut pipeline = ConversationPipeline::new(transport.clone(), ChatConfig::new());
        let outcome = pipeline.submit("hi", &mut session).await;

        assert_eq!(outcome, SubmitOutcome::Rejected(SkipReason::Disconnected));
        assert_eq!(pipeline.message_count(), 0);
        assert!(transport.send_calls().is_empty());
    }

    #[tokio::test]
    async fn rejected_when_blank() {
        let transport = ScriptedTransport::new(vec![]);
        let mut session = connected_session(transport.clone()).await;
        let mut pipeline = ConversationPipeline::new(transport.clone(), ChatConfig::new());

        assert_eq!(
            pipeline.submit("", &mut session).await,
            SubmitOutcome::Rejected(SkipReason::Empty)
        );
        assert_eq!(
            pipeline.submit("   \n\t", &mut session).await,
            SubmitOutcome::Rejected(SkipReason::Empty)
        );
        assert_eq!(pipeline.message_count(), 0);
        assert!(transport.send_calls().is_empty());
    }

    #[tokio::test]
    async fn rejected_while_pending() {
        let transport = ScriptedTransport::new(vec![]);
        let mut session = connected_session(transport.clone()).await;
        let mut pipeline = ConversationPipeline::new(transport.clone(), ChatConfig::new());

        pipeline.pending = true;
        let outcome = pipeline.submit("hi", &mut session).await;
        assert_eq!(outcome, SubmitOutcome::Rejected(SkipReason::Pending));
        assert_eq!(pipeline.message_count(), 0);
        assert!(transport.send_calls().is_empty());
    }

    #[tokio::test]
    async fn blank_reply_injects_general_error() {
        let transport = ScriptedTransport::new(vec![Ok(ChatReply::new("   "))]);
        let mut session = connected_session(transport.clone()).await;
        let config = ChatConfig::new();
        let general = config.error_messages.general.clone();
        let mut pipeline = ConversationPipeline::new(transport.clone(), config);

        let outcome = pipeline.submit("hi", &mut session).await;
        assert_eq!(outcome, SubmitOutcome::Failed(FailureKind::Send));

        let log = pipeline.messages();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].role, MessageRole::Assistant);
        assert_eq!(log[1].content, general);
        assert!(!pipeline.is_pending());
    }

    #[tokio::test]
    async fn connection_error_injects_disconnected_wording_and_flips_session() {
        let transport =
            ScriptedTransport::new(vec![Err(Error::connection("connection reset", None))]);
        let mut session = connected_session(transport.clone()).await;
        let config = ChatConfig::new();
        let disconnected = config.error_messages.disconnected.clone();
        let mut pipeline = ConversationPipeline::new(transport.clone(), config);

        let outcome = pipeline.submit("hi", &mut session).await;
        assert_eq!(outcome, SubmitOutcome::Failed(FailureKind::Send));

        let log = pipeline.messages();
        assert_eq!(log.last().unwrap().content, disconnected);
        assert_eq!(session.connectivity(), Connectivity::Disconnected);
        assert_eq!(session.last_error(), Some(FailureKind::Send));
    }

    #[tokio::test]
    async fn server_error_injects_general_wording() {
        let transport = ScriptedTransport::new(vec![Err(Error::internal_server("boom"))]);
        let mut session = connected_session(transport.clone()).await;
        let config = ChatConfig::new();
        let general = config.error_messages.general.clone();
        let mut pipeline = ConversationPipeline::new(transport.clone(), config);

        let outcome = pipeline.submit("hi", &mut session).await;
        assert_eq!(outcome, SubmitOutcome::Failed(FailureKind::Send));
        assert_eq!(pipeline.messages().last().unwrap().content, general);
        // A server-side failure is not a connection loss.
        assert_eq!(session.connectivity(), Connectivity::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_exceeded_injects_timeout_wording() {
        let transport = ScriptedTransport::hanging();
        let mut session = connected_session(transport.clone()).await;
        let config = ChatConfig::new().with_send_timeout(Duration::from_secs(60));
        let timeout_wording = config.error_messages.timeout.clone();
        let mut pipeline = ConversationPipeline::new(transport.clone(), config);

        let outcome = pipeline.submit("hi", &mut session).await;
        assert_eq!(outcome, SubmitOutcome::Failed(FailureKind::Timeout));

        let log = pipeline.messages();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].content, timeout_wording);
        assert!(!pipeline.is_pending());
        assert_eq!(session.last_error(), Some(FailureKind::Timeout));
    }

    #[tokio::test]
    async fn transport_timeout_error_maps_to_timeout_category() {
        let transport =
            ScriptedTransport::new(vec![Err(Error::timeout("deadline exceeded", Some(60.0)))]);
        let mut session = connected_session(transport.clone()).await;
        let config = ChatConfig::new();
        let timeout_wording = config.error_messages.timeout.clone();
        let mut pipeline = ConversationPipeline::new(transport.clone(), config);

        let outcome = pipeline.submit("hi", &mut session).await;
        assert_eq!(outcome, SubmitOutcome::Failed(FailureKind::Timeout));
        assert_eq!(pipeline.messages().last().unwrap().content, timeout_wording);
    }

    #[tokio::test]
    async fn error_injection_dedups_against_trailing_entry_only() {
        let transport = ScriptedTransport::new(vec![]);
        let session = connected_session(transport.clone()).await;
        let mut pipeline = ConversationPipeline::new(transport.clone(), ChatConfig::new());

        pipeline.inject_error("same error");
        pipeline.inject_error("same error");
        assert_eq!(pipeline.message_count(), 1);

        // A different trailing entry re-enables injection.
        pipeline.append(MessageRole::User, "another question");
        pipeline.inject_error("same error");
        assert_eq!(pipeline.message_count(), 3);

        drop(session);
    }

    #[tokio::test]
    async fn view_projects_typing_entry_while_pending() {
        let transport = ScriptedTransport::new(vec![]);
        let session = connected_session(transport.clone()).await;
        let mut pipeline = ConversationPipeline::new(transport.clone(), ChatConfig::new());

        pipeline.append(MessageRole::User, "hi");
        pipeline.pending = true;

        let view = pipeline.project_view(&session);
        assert_eq!(view.len(), 2);
        assert_eq!(view[1], ViewEntry::Typing);

        pipeline.pending = false;
        let view = pipeline.project_view(&session);
        assert_eq!(view.len(), 1);
        assert!(matches!(view[0], ViewEntry::Message(_)));
    }

    #[tokio::test]
    async fn no_typing_entry_while_reconnecting() {
        let transport = ScriptedTransport::new(vec![]);
        let session =
            SessionManager::new(transport.clone(), Box::new(MemoryTokenStore::new()));
        let mut pipeline = ConversationPipeline::new(transport.clone(), ChatConfig::new());

        pipeline.pending = true;
        assert_eq!(session.connectivity(), Connectivity::Reconnecting);
        assert!(pipeline.project_view(&session).is_empty());
    }

    #[tokio::test]
    async fn placeholder_tracks_phase_and_pending() {
        let transport = ScriptedTransport::new(vec![]);
        let session = connected_session(transport.clone()).await;
        let mut pipeline = ConversationPipeline::new(transport.clone(), ChatConfig::new());

        assert_eq!(pipeline.placeholder(&session), "Type a message");
        pipeline.pending = true;
        assert_eq!(pipeline.placeholder(&session), "Waiting for a reply...");
    }
}
