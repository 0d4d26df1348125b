//! Session and connectivity management.
//!
//! This module provides [`SessionManager`], the single source of truth for
//! whether the client may talk to the remote service and for the opaque
//! session token the service issues. Health probing is idempotent: repeated
//! probes with an unchanged status produce no transition and no event.

use std::sync::Arc;

use crate::error::Result;
use crate::observability;
use crate::store::TokenStore;
use crate::transport::ChatTransport;
use crate::types::{Connectivity, FailureKind};

/// Owns connectivity state, health probing, and the session token lifecycle.
///
/// The manager never treats a failed probe as fatal: failures only flip
/// connectivity, and the manager remains pollable for the process lifetime.
pub struct SessionManager<T: ChatTransport> {
    transport: Arc<T>,
    store: Box<dyn TokenStore>,
    connectivity: Connectivity,
    last_error: Option<FailureKind>,
    session_token: Option<String>,
}

impl<T: ChatTransport> SessionManager<T> {
    /// Creates a new manager. The session starts in `Reconnecting` until
    /// [`initialize`](Self::initialize) resolves the first probe.
    pub fn new(transport: Arc<T>, store: Box<dyn TokenStore>) -> Self {
        Self {
            transport,
            store,
            connectivity: Connectivity::Reconnecting,
            last_error: None,
            session_token: None,
        }
    }

    /// Loads any persisted token and resolves the first health probe.
    ///
    /// Returns the resulting connectivity. Submissions downstream are only
    /// enabled when this resolves to `Connected`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be read. Probe failures
    /// are not errors; they resolve the session to `Disconnected`.
    pub async fn initialize(&mut self) -> Result<Connectivity> {
        self.session_token = self.store.get()?;
        self.connectivity = Connectivity::Reconnecting;
        let healthy = self.probe().await;
        self.apply_probe(healthy);
        Ok(self.connectivity)
    }

    /// Runs one health probe and applies the status transition.
    ///
    /// Returns `Some(connectivity)` only when the status changed; identical
    /// consecutive statuses produce no observable event. Nothing runs until
    /// the first probe has resolved; overlapping probes are impossible
    /// because polling requires `&mut self`. The future is safe to abandon
    /// mid-probe: no state changes before the probe settles, so a dropped
    /// poll never blocks later ones.
    pub async fn poll_health(&mut self) -> Option<Connectivity> {
        if self.connectivity == Connectivity::Reconnecting {
            return None;
        }
        let healthy = self.probe().await;

        let previous = self.connectivity;
        self.apply_probe(healthy);
        if self.connectivity != previous {
            Some(self.connectivity)
        } else {
            None
        }
    }

    /// Records a token issued by the service and persists it.
    ///
    /// The in-memory token is updated even if persistence fails, so the
    /// conversation stays correlated for the rest of the process.
    pub fn record_token(&mut self, token: String) -> Result<()> {
        self.session_token = Some(token.clone());
        self.store.set(&token)
    }

    /// Clears the token from memory and from the persisted store.
    ///
    /// Connectivity is unaffected; the next send simply starts a fresh
    /// conversation on the server.
    pub fn reset(&mut self) -> Result<()> {
        self.session_token = None;
        self.store.remove()
    }

    /// Returns the current connectivity phase.
    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Returns the last classified failure, if any.
    pub fn last_error(&self) -> Option<FailureKind> {
        self.last_error
    }

    /// Returns the current session token, if the service issued one.
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    /// Records a failed send observed by the pipeline.
    ///
    /// Connection-class failures also flip a connected session to
    /// `Disconnected`; other failures leave connectivity for the next
    /// probe to settle.
    pub(crate) fn note_send_failure(&mut self, kind: FailureKind, lost_connection: bool) {
        self.last_error = Some(kind);
        if lost_connection && self.connectivity == Connectivity::Connected {
            self.connectivity = Connectivity::Disconnected;
            observability::SESSION_TRANSITIONS.click();
        }
    }

    /// A probe that returns an error is equivalent to a non-ok status.
    async fn probe(&self) -> bool {
        match self.transport.check_health().await {
            Ok(status) => status.is_ok(),
            Err(_) => false,
        }
    }

    fn apply_probe(&mut self, healthy: bool) {
        let previous = self.connectivity;
        if healthy {
            self.connectivity = Connectivity::Connected;
            self.last_error = None;
        } else {
            self.connectivity = Connectivity::Disconnected;
            self.last_error = Some(FailureKind::Health);
        }
        if self.connectivity != previous {
            observability::SESSION_TRANSITIONS.click();
        }
    }
}
