//! QHSE Rust Client Library
//!
//! Client core for the QHSE incident and safety reporting backend: session
//! state, startup restoration of a persisted sign-in, and typed endpoints that
//! share one bearer-token/401 contract.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fetch;
pub mod gateway;
pub mod media;
pub mod navigation;
pub mod pagination;
pub mod reports;
pub mod scope;
pub mod screens;

use reqwest::Client;
use std::sync::Arc;

use qhse_session::{Session, SessionStore};
use qhse_storage::KeyValueStore;

use crate::bootstrap::BootstrapSequencer;
use crate::config::ClientOptions;
use crate::credentials::CredentialStore;
use crate::error::Result;
use crate::gateway::AuthorizedClient;
use crate::navigation::{Alerts, Navigation};
use crate::reports::{
    IncidentFilter, Incidents, Icas, Permits, PersonnelRegister, Profile, SorKind, Sors, Tasks,
    Trainings,
};
use crate::screens::{DashboardScreen, ListScreen};

pub use qhse_session as session;
pub use qhse_storage as storage;

/// The main entry point for the QHSE client
pub struct Qhse {
    options: Arc<ClientOptions>,
    session: Arc<SessionStore>,
    bootstrap: BootstrapSequencer,
    gateway: AuthorizedClient,
    navigation: Arc<dyn Navigation>,
}

impl Qhse {
    /// Create a new client over the given durable store
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use qhse_client::{Qhse, config::ClientOptions, navigation::EventLog};
    /// use qhse_client::storage::MemoryStore;
    ///
    /// let ui = Arc::new(EventLog::new());
    /// let qhse = Qhse::new(
    ///     ClientOptions::default(),
    ///     Arc::new(MemoryStore::new()),
    ///     ui.clone(),
    ///     ui,
    /// )
    /// .unwrap();
    /// assert!(qhse.session().snapshot().is_loading);
    /// ```
    pub fn new(
        options: ClientOptions,
        store: Arc<dyn KeyValueStore>,
        navigation: Arc<dyn Navigation>,
        alerts: Arc<dyn Alerts>,
    ) -> Result<Self> {
        options.validate()?;
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        let options = Arc::new(options);
        let session = Arc::new(SessionStore::new());
        let credentials = CredentialStore::new(store);
        let bootstrap = BootstrapSequencer::new(credentials.clone(), session.clone());
        let gateway = AuthorizedClient::new(
            http,
            options.clone(),
            credentials,
            session.clone(),
            navigation.clone(),
            alerts,
        );

        Ok(Self {
            options,
            session,
            bootstrap,
            gateway,
            navigation,
        })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn gateway(&self) -> &AuthorizedClient {
        &self.gateway
    }

    /// Restores the persisted session; runs once per client
    pub async fn bootstrap(&self) -> Session {
        self.bootstrap.run().await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        auth::login(&self.gateway, self.navigation.as_ref(), email, password).await
    }

    pub async fn logout(&self) -> Result<Session> {
        auth::logout(&self.gateway).await
    }

    pub async fn profile(&self) -> Result<Profile> {
        reports::fetch_profile(&self.gateway).await
    }

    pub fn incidents(&self, filter: IncidentFilter) -> Incidents {
        Incidents::new(self.gateway.clone(), filter)
    }

    pub fn sors(&self, kind: SorKind) -> Sors {
        Sors::new(self.gateway.clone(), kind)
    }

    pub fn icas(&self) -> Icas {
        Icas::new(self.gateway.clone())
    }

    pub fn trainings(&self) -> Trainings {
        Trainings::new(self.gateway.clone())
    }

    pub fn tasks(&self) -> Tasks {
        Tasks::new(self.gateway.clone())
    }

    pub fn permits(&self) -> Permits {
        Permits::new(self.gateway.clone())
    }

    pub fn personnel(&self) -> PersonnelRegister {
        PersonnelRegister::new(self.gateway.clone())
    }

    /// A list screen paged with the configured page size
    pub fn list_screen<S: reports::ReportList>(&self, source: S) -> ListScreen<S> {
        ListScreen::new(source, self.options.page_size)
    }

    pub fn dashboard(&self) -> DashboardScreen {
        DashboardScreen::new(self.gateway.clone())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::ClientOptions;
    pub use crate::error::{Error, Result};
    pub use crate::navigation::{Alerts, EventLog, Navigation, Route};
    pub use crate::reports::{IncidentFilter, IncidentKind, ReportDelete, ReportList, SorKind};
    pub use crate::Qhse;
    pub use qhse_session::{Session, SessionStore, Stack};
    pub use qhse_storage::{FileStore, KeyValueStore, MemoryStore};
}
