//! Authorized calls against the QHSE backend
//!
//! Every screen talks to the backend through [`AuthorizedClient`], which owns
//! the session-ending rules for bearer-token calls:
//!
//! * the token is read from durable storage for every call,
//! * a 401 (or no stored token) purges the stored credentials, signs the
//!   session out, raises one alert and navigates to login once,
//! * any other failure raises one alert and leaves the session alone.

use reqwest::multipart::Form;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};
use url::Url;

use qhse_session::{SessionStore, UserProfile};

use crate::config::ClientOptions;
use crate::credentials::CredentialStore;
use crate::error::{Error, Result};
use crate::fetch::{Body, Fetch};
use crate::navigation::{Alerts, Navigation, Route};

const DEFAULT_FAILURE: &str = "Something went wrong, please try again";

/// One authorized request
pub struct Request {
    method: Method,
    url: Url,
    query: Vec<(String, String)>,
    body: Option<Body>,
    failure: String,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            query: Vec::new(),
            body: None,
            failure: DEFAULT_FAILURE.to_string(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn delete(url: Url) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(Body::Json(serde_json::to_vec(body)?));
        Ok(self)
    }

    pub fn multipart(mut self, form: Form) -> Self {
        self.body = Some(Body::Multipart(form));
        self
    }

    /// Alert text for failures other than 401
    pub fn on_failure(mut self, message: &str) -> Self {
        self.failure = message.to_string();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Typed client wrapping the bearer/401 contract
#[derive(Clone)]
pub struct AuthorizedClient {
    http: Client,
    options: Arc<ClientOptions>,
    credentials: CredentialStore,
    session: Arc<SessionStore>,
    navigation: Arc<dyn Navigation>,
    alerts: Arc<dyn Alerts>,
}

impl AuthorizedClient {
    pub fn new(
        http: Client,
        options: Arc<ClientOptions>,
        credentials: CredentialStore,
        session: Arc<SessionStore>,
        navigation: Arc<dyn Navigation>,
        alerts: Arc<dyn Alerts>,
    ) -> Self {
        Self {
            http,
            options,
            credentials,
            session,
            navigation,
            alerts,
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn api_url(&self, path: &str) -> Result<Url> {
        self.options.api_endpoint(path)
    }

    pub fn webapp_url(&self, path: &str) -> Result<Url> {
        self.options.webapp_endpoint(path)
    }

    /// Surfaces a message through the view layer's alert hook
    pub fn alert(&self, message: &str) {
        self.alerts.alert(message);
    }

    /// Sends the request and returns the successful response
    pub async fn send(&self, request: Request) -> Result<Response> {
        let Request {
            method,
            url,
            query,
            body,
            failure,
        } = request;

        let token = match self.credentials.token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!(%url, "no stored token, ending session");
                self.expire_session().await;
                return Err(Error::Unauthorized);
            }
            Err(e) => {
                warn!(error = %e, "could not read stored token");
                self.alerts.alert(&failure);
                return Err(e);
            }
        };

        let mut builder = Fetch::request(&self.http, method.clone(), url.clone()).bearer_auth(&token);
        for (key, value) in &query {
            builder = builder.query(key, value);
        }
        let builder = builder.body(body);

        debug!(%method, %url, "sending authorized request");
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(%method, %url, error = %e, "request failed");
                self.alerts.alert(&failure);
                return Err(e);
            }
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(%method, %url, "backend rejected token");
            self.expire_session().await;
            return Err(Error::Unauthorized);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%method, %url, status = status.as_u16(), "request returned an error status");
            self.alerts.alert(&failure);
            return Err(Error::api(status.as_u16(), text));
        }
        Ok(response)
    }

    /// Sends the request and parses a JSON body
    pub async fn fetch_json<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let failure = request.failure.clone();
        let url = request.url.clone();
        let response = self.send(request).await?;
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.alerts.alert(&failure);
                return Err(e.into());
            }
        };
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(%url, error = %e, "unexpected response body");
            self.alerts.alert(&failure);
            Error::from(e)
        })
    }

    /// Sends the request and ignores the body
    pub async fn execute(&self, request: Request) -> Result<()> {
        self.send(request).await.map(|_| ())
    }

    /// Stored user for requests that carry the submitter's id
    ///
    /// A missing or unreadable user ends the session like a 401.
    pub async fn require_user(&self) -> Result<UserProfile> {
        match self.credentials.user().await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => {
                debug!("no stored user, ending session");
                self.expire_session().await;
                Err(Error::Unauthorized)
            }
            Err(e) => {
                warn!(error = %e, "stored user is unreadable, ending session");
                self.expire_session().await;
                Err(Error::Unauthorized)
            }
        }
    }

    /// Purges stored credentials and sends the user back to login
    ///
    /// Only the call that actually ends the session raises the alert and the
    /// redirect; overlapping 401s after it just make sure storage is empty.
    async fn expire_session(&self) {
        let ended = self.session.end_session().is_some();
        if let Err(e) = self.credentials.clear().await {
            warn!(error = %e, "failed to clear stored credentials, retrying");
            if let Err(e) = self.credentials.clear().await {
                error!(error = %e, "stored credentials survive the purge and will be restored on next start");
            }
        }
        if ended {
            self.alerts.alert(&self.options.unauthorized_message);
            self.navigation.navigate(Route::Login);
        } else {
            debug!("session already ended, skipping redirect");
        }
    }
}
