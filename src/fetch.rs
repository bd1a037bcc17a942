//! HTTP request builder shared by every endpoint

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Client, Method, Response};
use serde::Serialize;
use url::Url;

use crate::error::Error;

/// Request body encodings the backend accepts
pub enum Body {
    Json(Vec<u8>),
    Multipart(Form),
}

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: Url,
    method: Method,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
    body: Option<Body>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: Url, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Self {
            client,
            url,
            method,
            headers,
            query_params: Vec::new(),
            body: None,
        }
    }

    /// Add bearer token authentication to the request
    pub fn bearer_auth(mut self, token: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
            self.headers.insert(AUTHORIZATION, value);
        }
        self
    }

    /// Append a query parameter
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query_params.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(body)?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(Body::Json(json));
        Ok(self)
    }

    /// Add a multipart body; reqwest sets the boundary content type
    pub fn multipart(mut self, form: Form) -> Self {
        self.headers.remove(CONTENT_TYPE);
        self.body = Some(Body::Multipart(form));
        self
    }

    /// Attach a prepared body, setting the matching content type
    pub fn body(self, body: Option<Body>) -> Self {
        match body {
            None => self,
            Some(Body::Multipart(form)) => self.multipart(form),
            Some(Body::Json(bytes)) => {
                let mut this = self;
                this.headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                this.body = Some(Body::Json(bytes));
                this
            }
        }
    }

    /// Execute the request and return the raw response
    ///
    /// Status classification is left to the caller.
    pub async fn send(self) -> Result<Response, Error> {
        let mut url = self.url;
        if !self.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                pairs.append_pair(key, value);
            }
        }

        let mut req = self.client.request(self.method, url).headers(self.headers);
        req = match self.body {
            Some(Body::Json(bytes)) => req.body(bytes),
            Some(Body::Multipart(form)) => req.multipart(form),
            None => req,
        };

        Ok(req.send().await?)
    }
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get(client: &Client, url: Url) -> FetchBuilder<'_> {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a POST request
    pub fn post(client: &Client, url: Url) -> FetchBuilder<'_> {
        FetchBuilder::new(client, url, Method::POST)
    }

    pub fn request(client: &Client, method: Method, url: Url) -> FetchBuilder<'_> {
        FetchBuilder::new(client, url, method)
    }
}
