//! The three-legged OAuth 1.0a handshake against the WordPress OAuth1
//! plugin: request token, operator authorization, access token.

use super::{Credential, OAuthEnvironment, Signer};
use crate::error::OAuthError;
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use std::io::{BufRead, Write};

/// The only callback the command-line flow can handle.
pub const OUT_OF_BAND: &str = "oob";

/// Endpoints of the handshake for one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub request: String,
    pub authorize: String,
    pub access: String,
}

impl Endpoints {
    pub fn for_site(site: &str) -> Endpoints {
        let site = site.trim_end_matches('/');
        Endpoints {
            request: format!("{}/oauth1/request", site),
            authorize: format!("{}/oauth1/authorize", site),
            access: format!("{}/oauth1/access", site),
        }
    }
}

/// Run the handshake and return the signer's consumer holding the access
/// token.
///
/// The authorization URL is written to `output`; the verifier is read as
/// one line from `input`.  An empty verifier aborts.
pub fn authorize<C, E, R, W>(
    client: &C,
    signer: &Signer<E>,
    site: &str,
    callback: &str,
    mut input: R,
    mut output: W,
) -> Result<Credential, OAuthError>
where
    C: HttpClient,
    E: OAuthEnvironment + Clone,
    R: BufRead,
    W: Write,
{
    if callback != OUT_OF_BAND {
        return Err(OAuthError::CallbackNotOob);
    }
    let endpoints = Endpoints::for_site(site);

    let callback_param = [("oauth_callback".to_string(), callback.to_string())];
    let response = signed_post(client, signer, &endpoints.request, &callback_param)?;
    let body = response.text();
    let (token, token_secret) = parse_token_response(&body)?;

    writeln!(
        output,
        "Please visit the following URL:\n\n{}?{}\n",
        endpoints.authorize, body
    )
    .map_err(OAuthError::Prompt)?;
    write!(output, "Please insert verifier (or nothing to cancel): ").map_err(OAuthError::Prompt)?;
    output.flush().map_err(OAuthError::Prompt)?;

    let mut verifier = String::new();
    input.read_line(&mut verifier).map_err(OAuthError::Prompt)?;
    let verifier = verifier.trim();
    if verifier.is_empty() {
        return Err(OAuthError::Aborted);
    }
    tracing::info!(verifier, "verifier received");

    let temporary = signer.with_credential(signer.credential().authenticated(&token, &token_secret));
    let access_params = [
        ("oauth_verifier".to_string(), verifier.to_string()),
        ("oauth_callback".to_string(), callback.to_string()),
    ];
    let response = signed_post(client, &temporary, &endpoints.access, &access_params)?;
    let (token, token_secret) = parse_token_response(&response.text())?;

    Ok(signer.credential().authenticated(&token, &token_secret))
}

fn signed_post<C: HttpClient, E: OAuthEnvironment>(
    client: &C,
    signer: &Signer<E>,
    url: &str,
    additional: &[(String, String)],
) -> Result<HttpResponse, OAuthError> {
    let header = signer.authorization("POST", url, &[], additional);
    let request = HttpRequest::post(url)
        .header("Authorization", &header)
        .body("");
    let response = client.execute(&request)?;
    if response.status != 200 {
        return Err(OAuthError::UnexpectedStatus {
            url: url.to_string(),
            status: response.status,
        });
    }
    Ok(response)
}

/// Read `oauth_token` and `oauth_token_secret` from a form-encoded body.
/// The last occurrence of a repeated key wins.
pub fn parse_token_response(body: &str) -> Result<(String, String), OAuthError> {
    let mut token = None;
    let mut secret = None;
    for (name, value) in url::form_urlencoded::parse(body.trim().as_bytes()) {
        match name.as_ref() {
            "oauth_token" => token = Some(value.into_owned()),
            "oauth_token_secret" => secret = Some(value.into_owned()),
            _ => {}
        }
    }
    match (token, secret) {
        (Some(token), Some(secret)) => Ok((token, secret)),
        _ => Err(OAuthError::MissingToken),
    }
}
