//! OAuth 1.0a request signing (HMAC-SHA1).
//!
//! A [`Signer`] combines a [`Credential`] with an [`OAuthEnvironment`] that
//! supplies timestamps and nonces.  Everything after parameter assembly is
//! the pure function [`sign_parameters`].
//!
//! ```rust
//! use s9y_migrate::oauth::{Credential, FixedEnvironment, Signer};
//!
//! let signer = Signer::with_environment(
//!     Credential::new("ck", "cs"),
//!     FixedEnvironment::new(1000000000, "12345678"),
//! );
//! let header = signer.authorization("GET", "http://example.com/r", &[("foo".to_string(), "bar".to_string())], &[]);
//! assert!(header.contains(r#"oauth_signature="9kpw08Toe4rBxM37uZiCzsLBY1I%3D""#));
//! ```

pub mod handshake;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::Rng;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Everything but `A-Z a-z 0-9 - . _ ~` is escaped.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const OAUTH_VERSION: &str = "1.0";
const NONCE_DIGITS: usize = 8;

/// A list of `(name, value)` pairs.  Order matters only as a tie breaker.
pub type Parameters = Vec<(String, String)>;

/// Percent-encode `value` with the OAuth unreserved set.
pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    Unauthenticated,
    Authenticated { token: String, token_secret: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub state: TokenState,
}

impl Credential {
    pub fn new(consumer_key: &str, consumer_secret: &str) -> Credential {
        Credential {
            consumer_key: consumer_key.to_string(),
            consumer_secret: consumer_secret.to_string(),
            state: TokenState::Unauthenticated,
        }
    }

    /// The same consumer, holding the given token.
    pub fn authenticated(&self, token: &str, token_secret: &str) -> Credential {
        Credential {
            state: TokenState::Authenticated {
                token: token.to_string(),
                token_secret: token_secret.to_string(),
            },
            ..self.clone()
        }
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            TokenState::Authenticated { token, .. } => Some(token),
            TokenState::Unauthenticated => None,
        }
    }

    pub fn token_secret(&self) -> Option<&str> {
        match &self.state {
            TokenState::Authenticated { token_secret, .. } => Some(token_secret),
            TokenState::Unauthenticated => None,
        }
    }
}

/// Source of the per-request timestamp and nonce.
pub trait OAuthEnvironment {
    /// Unix time in seconds.
    fn timestamp(&self) -> i64;
    fn nonce(&self) -> String;
}

/// Wall clock and thread-local randomness.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl OAuthEnvironment for SystemEnvironment {
    fn timestamp(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn nonce(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..NONCE_DIGITS)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }
}

/// Always the same timestamp and nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedEnvironment {
    pub timestamp: i64,
    pub nonce: String,
}

impl FixedEnvironment {
    pub fn new(timestamp: i64, nonce: &str) -> FixedEnvironment {
        FixedEnvironment {
            timestamp,
            nonce: nonce.to_string(),
        }
    }
}

impl OAuthEnvironment for FixedEnvironment {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn nonce(&self) -> String {
        self.nonce.clone()
    }
}

/// Signs requests for one credential.
#[derive(Debug, Clone)]
pub struct Signer<E: OAuthEnvironment = SystemEnvironment> {
    credential: Credential,
    environment: E,
}

impl Signer<SystemEnvironment> {
    pub fn new(credential: Credential) -> Signer<SystemEnvironment> {
        Signer::with_environment(credential, SystemEnvironment)
    }
}

impl<E: OAuthEnvironment> Signer<E> {
    pub fn with_environment(credential: Credential, environment: E) -> Signer<E> {
        Signer {
            credential,
            environment,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// A signer for `credential` sharing this signer's environment.
    pub fn with_credential(&self, credential: Credential) -> Signer<E>
    where
        E: Clone,
    {
        Signer::with_environment(credential, self.environment.clone())
    }

    /// The protocol parameters of one request, before any caller additions.
    pub fn oauth_parameters(&self) -> Parameters {
        let mut params = vec![
            (
                "oauth_consumer_key".to_string(),
                self.credential.consumer_key.clone(),
            ),
            (
                "oauth_signature_method".to_string(),
                SIGNATURE_METHOD.to_string(),
            ),
            ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
            (
                "oauth_timestamp".to_string(),
                self.environment.timestamp().to_string(),
            ),
            ("oauth_nonce".to_string(), self.environment.nonce()),
        ];
        if let Some(token) = self.credential.token() {
            params.push(("oauth_token".to_string(), token.to_string()));
        }
        params
    }

    /// The `Authorization` header value (`OAuth ...`) for one request.
    ///
    /// `params` are the request's query or form parameters; `additional`
    /// are extra protocol parameters such as `oauth_callback`.
    pub fn authorization(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        additional: &[(String, String)],
    ) -> String {
        let mut oauth_params = self.oauth_parameters();
        for (name, value) in additional {
            match oauth_params.iter_mut().find(|(n, _)| n == name) {
                Some(existing) => existing.1 = value.clone(),
                None => oauth_params.push((name.clone(), value.clone())),
            }
        }
        sign_parameters(
            method,
            url,
            oauth_params,
            params,
            &self.credential.consumer_secret,
            self.credential.token_secret(),
        )
    }

    /// The complete header line, `Authorization: OAuth ...`.
    pub fn header_line(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        additional: &[(String, String)],
    ) -> String {
        format!(
            "Authorization: {}",
            self.authorization(method, url, params, additional)
        )
    }
}

/// Stable sort on the concatenation of name and value.
pub fn sort_parameters(params: &mut [(String, String)]) {
    params.sort_by_key(|(name, value)| format!("{}{}", name, value));
}

/// `METHOD&enc(url)&enc(name=value&...)` over already sorted terms.
pub fn signature_base_string(method: &str, url: &str, terms: &[(String, String)]) -> String {
    let joined = terms
        .iter()
        .map(|(name, value)| format!("{}={}", percent_encode(name), percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        method,
        percent_encode(url),
        percent_encode(&joined)
    )
}

/// `enc(consumer_secret)&enc(token_secret)`; an absent token secret leaves
/// the part after `&` empty.
pub fn signing_key(consumer_secret: &str, token_secret: Option<&str>) -> String {
    format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret.unwrap_or(""))
    )
}

/// Base64 of HMAC-SHA1(`key`, `base_string`).
pub fn hmac_sha1_signature(key: &str, base_string: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(base_string.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Sign an explicit parameter set and render the header value.
///
/// `oauth_params` are the protocol parameters (any `oauth_signature` among
/// them is discarded); `request_params` are signed but not rendered.
pub fn sign_parameters(
    method: &str,
    url: &str,
    mut oauth_params: Parameters,
    request_params: &[(String, String)],
    consumer_secret: &str,
    token_secret: Option<&str>,
) -> String {
    oauth_params.retain(|(name, _)| name != "oauth_signature");

    let mut terms = oauth_params.clone();
    terms.extend(request_params.iter().cloned());
    sort_parameters(&mut terms);

    let base_string = signature_base_string(method, url, &terms);
    let key = signing_key(consumer_secret, token_secret);
    let signature = hmac_sha1_signature(&key, &base_string);

    oauth_params.push(("oauth_signature".to_string(), signature));
    render_header(oauth_params)
}

fn render_header(mut oauth_params: Parameters) -> String {
    sort_parameters(&mut oauth_params);
    let parts = oauth_params
        .iter()
        .map(|(name, value)| format!("{}=\"{}\"", percent_encode(name), percent_encode(value)))
        .collect::<Vec<_>>();
    format!("OAuth {}", parts.join(", "))
}
