//! Configuration options for the QHSE client

use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://staging.qhseapi.optitech.co.ke/api/v1/";
pub const DEFAULT_WEBAPP_URL: &str = "https://test.tokenlessreport.optitech.co.ke";
pub const DEFAULT_MEDIA_URL: &str = "https://staging.qhse.optitech.co.ke/public";
pub const DEFAULT_PAGE_SIZE: usize = 8;
pub const UNAUTHORIZED_MESSAGE: &str =
    "You are not authorized to view this page try logging in again";

/// Configuration options for the QHSE client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the JSON API (list, detail, delete, login)
    pub api_url: String,

    /// Base URL of the web app that accepts multipart report submissions
    pub webapp_url: String,

    /// Public media host that replaces development storage URLs
    pub media_url: String,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Rows per page on list screens
    pub page_size: usize,

    /// Alert shown once when a call comes back 401
    pub unauthorized_message: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            webapp_url: DEFAULT_WEBAPP_URL.to_string(),
            media_url: DEFAULT_MEDIA_URL.to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            page_size: DEFAULT_PAGE_SIZE,
            unauthorized_message: UNAUTHORIZED_MESSAGE.to_string(),
        }
    }
}

impl ClientOptions {
    /// Set the API base URL
    pub fn with_api_url(mut self, value: &str) -> Self {
        self.api_url = value.to_string();
        self
    }

    /// Set the web app base URL
    pub fn with_webapp_url(mut self, value: &str) -> Self {
        self.webapp_url = value.to_string();
        self
    }

    /// Set the public media base URL
    pub fn with_media_url(mut self, value: &str) -> Self {
        self.media_url = value.to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the page size for list screens
    pub fn with_page_size(mut self, value: usize) -> Self {
        self.page_size = value;
        self
    }

    pub fn with_unauthorized_message(mut self, value: &str) -> Self {
        self.unauthorized_message = value.to_string();
        self
    }

    /// Reads `QHSE_API_URL`, `QHSE_WEBAPP_URL`, `QHSE_MEDIA_URL` and
    /// `QHSE_TIMEOUT_SECS`, falling back to the defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        let mut options = Self::default();
        if let Ok(url) = std::env::var("QHSE_API_URL") {
            options.api_url = url;
        }
        if let Ok(url) = std::env::var("QHSE_WEBAPP_URL") {
            options.webapp_url = url;
        }
        if let Ok(url) = std::env::var("QHSE_MEDIA_URL") {
            options.media_url = url;
        }
        if let Ok(secs) = std::env::var("QHSE_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("QHSE_TIMEOUT_SECS is not a number: {}", secs)))?;
            options.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api_url)?;
        Url::parse(&self.webapp_url)?;
        Url::parse(&self.media_url)?;
        if self.page_size == 0 {
            return Err(Error::config("page_size must be at least 1"));
        }
        Ok(())
    }

    /// Resolves a path such as `incidents` or `sors/4` against the API base.
    pub fn api_endpoint(&self, path: &str) -> Result<Url> {
        join(&self.api_url, path)
    }

    /// Resolves a path such as `api/sor` against the web app base.
    pub fn webapp_endpoint(&self, path: &str) -> Result<Url> {
        join(&self.webapp_url, path)
    }
}

fn join(base: &str, path: &str) -> Result<Url> {
    let mut base = Url::parse(base)?;
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    Ok(base.join(path.trim_start_matches('/'))?)
}
