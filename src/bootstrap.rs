//! Startup restoration of the persisted session

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use qhse_session::{Session, SessionStore};

use crate::credentials::CredentialStore;

/// Decides the initial session from durable storage, once per instance
///
/// Nothing in here can fail the caller: unreadable or half-written
/// credentials leave the user signed out.
pub struct BootstrapSequencer {
    credentials: CredentialStore,
    session: Arc<SessionStore>,
    done: OnceCell<()>,
}

impl BootstrapSequencer {
    pub fn new(credentials: CredentialStore, session: Arc<SessionStore>) -> Self {
        Self {
            credentials,
            session,
            done: OnceCell::new(),
        }
    }

    /// Runs the sequence on first call; later and concurrent calls wait for
    /// that first run and return the current state.
    pub async fn run(&self) -> Session {
        self.done
            .get_or_init(|| async {
                self.restore().await;
            })
            .await;
        self.session.snapshot()
    }

    pub fn has_run(&self) -> bool {
        self.done.initialized()
    }

    async fn restore(&self) {
        match self.credentials.load().await {
            Ok(Some((user, token))) => {
                info!(user_id = user.id, "restored persisted session");
                self.session.login(user, token);
            }
            Ok(None) => {
                info!("no persisted session, starting signed out");
                self.session.set_loading(false);
            }
            Err(e) => {
                warn!(error = %e, "failed to restore persisted session, starting signed out");
                self.session.set_loading(false);
            }
        }
    }
}
