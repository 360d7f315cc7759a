//! The blocking HTTP seam used by collection, the OAuth handshake and the
//! transfer.  Everything above this module talks to [`HttpClient`]; the
//! `ureq` implementation is [`UreqClient`].

use crate::error::HttpError;
use std::io::Read;
use std::time::Duration;
use ureq::AgentBuilder;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// A request as the pipeline describes it.  `url` carries no query string;
/// query parameters are kept apart so they can be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> HttpRequest {
        HttpRequest {
            method,
            url: url.into(),
            query: vec![],
            headers: vec![],
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> HttpRequest {
        HttpRequest::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> HttpRequest {
        HttpRequest::new(Method::Post, url)
    }

    pub fn query(mut self, name: &str, value: &str) -> HttpRequest {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> HttpRequest {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> HttpRequest {
        self.body = Some(body.into());
        self
    }

    /// Attach `value` as a UTF-8 JSON body.
    pub fn json(self, value: &serde_json::Value) -> HttpRequest {
        self.header("Content-Type", "application/json; charset=utf-8")
            .body(value.to_string())
    }

    /// The value of the first header called `name` (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `url` with the query parameters form-encoded onto it.
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{}", self.url, query)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// The body decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Executes one request.  Any status code is a response; only transport
/// failures are errors.
pub trait HttpClient {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError>;
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        (**self).execute(request)
    }
}

/// [`HttpClient`] over a `ureq` agent with a request timeout.
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    pub fn new() -> UreqClient {
        UreqClient::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> UreqClient {
        UreqClient {
            agent: AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Default for UreqClient {
    fn default() -> UreqClient {
        UreqClient::new()
    }
}

impl HttpClient for UreqClient {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut call = self.agent.request(request.method.as_str(), &request.url);
        for (name, value) in &request.query {
            call = call.query(name, value);
        }
        for (name, value) in &request.headers {
            call = call.set(name, value);
        }

        let result = match &request.body {
            Some(body) => call.send_string(body),
            None => call.call(),
        };
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(e) => {
                return Err(HttpError::Transport {
                    method: request.method.as_str(),
                    url: request.full_url(),
                    message: e.to_string(),
                })
            }
        };

        let status = response.status();
        let mut body = vec![];
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|source| HttpError::Body {
                url: request.full_url(),
                source,
            })?;
        Ok(HttpResponse { status, body })
    }
}
