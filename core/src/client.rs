//! Authenticated request construction and response classification.
//!
//! # Design
//! `UptimeClient` holds only immutable configuration (base URL, subaccount,
//! token, build info) plus a `Transport`. Every primitive builds an
//! `HttpRequest`, hands it to the transport, and classifies the returned
//! `HttpResponse`. Nothing is cached between calls, so a client can be shared
//! across threads whenever its transport can.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::{status_line, HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::transport::UreqTransport;
use crate::version::BuildInfo;

const LOGIN_PATH: &str = "auth/login/";
const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Blocking client for the Uptime.com REST API.
pub struct UptimeClient<T = UreqTransport> {
    transport: T,
    base_url: Url,
    subaccount: Option<String>,
    token: String,
    build: BuildInfo,
}

impl UptimeClient<UreqTransport> {
    /// Builds a client on the default `ureq` transport.
    ///
    /// Performs one login round trip when `config` has no token but carries an
    /// email and password.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = UreqTransport::new(config.retry.clone(), config.timeout);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> UptimeClient<T> {
    /// Builds a client on a caller-supplied transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        let has_login = !config.email.is_empty() && !config.password.is_empty();
        if config.token.is_empty() && !has_login {
            return Err(ApiError::NoCredentials);
        }

        let base_url = parse_base_url(&config.base_url)?;
        let build = BuildInfo::current();
        let token = if config.token.is_empty() {
            exchange_credentials(&transport, &base_url, &build, &config.email, &config.password)?
        } else {
            config.token
        };

        Ok(Self {
            transport,
            base_url,
            subaccount: config.subaccount,
            token,
            build,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn subaccount(&self) -> Option<&str> {
        self.subaccount.as_deref()
    }

    pub fn build_info(&self) -> BuildInfo {
        self.build
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET `path` and return the raw body.
    pub fn get_raw(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<u8>> {
        let url = self.endpoint(path, params)?;
        self.execute(HttpMethod::Get, url, None)
    }

    /// GET `path` and decode the body as JSON.
    pub fn get<D: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<D> {
        let body = self.get_raw(path, params)?;
        decode(&body)
    }

    /// POST `payload` as JSON and return the raw response body.
    pub fn post<B: Serialize + ?Sized>(&self, path: &str, payload: &B) -> Result<Vec<u8>> {
        let body = encode(payload)?;
        let url = self.endpoint(path, &[])?;
        self.execute(HttpMethod::Post, url, Some(body))
    }

    /// PUT `payload` as JSON. The response body is discarded.
    pub fn put<B: Serialize + ?Sized>(&self, path: &str, payload: &B) -> Result<()> {
        let body = encode(payload)?;
        let url = self.endpoint(path, &[])?;
        self.execute(HttpMethod::Put, url, Some(body)).map(drop)
    }

    /// DELETE `path` without a body.
    pub fn delete(&self, path: &str) -> Result<()> {
        let url = self.endpoint(path, &[])?;
        self.execute(HttpMethod::Delete, url, None).map(drop)
    }

    /// DELETE `path` with a JSON body.
    pub fn delete_with_body<B: Serialize + ?Sized>(&self, path: &str, payload: &B) -> Result<()> {
        let body = encode(payload)?;
        let url = self.endpoint(path, &[])?;
        self.execute(HttpMethod::Delete, url, Some(body)).map(drop)
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    fn headers(&self, method: HttpMethod) -> Vec<(String, String)> {
        let mut headers = vec![("Authorization".to_string(), format!("Token {}", self.token))];
        if let Some(subaccount) = &self.subaccount {
            headers.push(("X-Subaccount".to_string(), subaccount.clone()));
        }
        headers.push(("User-Agent".to_string(), self.build.user_agent()));
        headers.push(("Accept".to_string(), JSON.to_string()));
        if method.sends_json() {
            headers.push(("Content-Type".to_string(), JSON.to_string()));
        }
        headers
    }

    fn execute(&self, method: HttpMethod, url: Url, body: Option<Vec<u8>>) -> Result<Vec<u8>> {
        let path = url.path().to_string();
        let request = HttpRequest {
            method,
            url: url.into(),
            headers: self.headers(method),
            body,
        };

        debug!(method = %method, url = %request.url, "sending request");
        let response = self.transport.execute(&request)?;
        debug!(method = %method, path = %path, status = response.status, "received response");

        check_status(method, &path, response)
    }
}

impl<T> fmt::Debug for UptimeClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UptimeClient")
            .field("base_url", &self.base_url.as_str())
            .field("subaccount", &self.subaccount)
            .field("token", &"[redacted]")
            .field("build", &self.build)
            .finish_non_exhaustive()
    }
}

/// Map 401/403 to `AuthenticationFailed` and any other status >= 400 to
/// `RequestFailed`; hand back the body otherwise.
fn check_status(method: HttpMethod, path: &str, response: HttpResponse) -> Result<Vec<u8>> {
    match response.status {
        401 | 403 => {
            warn!(method = %method, path = %path, status = response.status, "token rejected");
            Err(ApiError::AuthenticationFailed)
        }
        status if status >= 400 => Err(ApiError::RequestFailed {
            method,
            path: path.to_string(),
            status,
            status_line: status_line(status),
            body: (!response.body.is_empty())
                .then(|| String::from_utf8_lossy(&response.body).into_owned()),
        }),
        _ => Ok(response.body),
    }
}

/// Parse the base URL, appending a trailing slash so relative endpoints join
/// beneath it rather than replacing its last segment.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl(format!("{raw}: not a base url")));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
}

/// Exchange email and password for an access token via the login form.
fn exchange_credentials<T: Transport>(
    transport: &T,
    base_url: &Url,
    build: &BuildInfo,
    email: &str,
    password: &str,
) -> Result<String> {
    let url = base_url
        .join(LOGIN_PATH)
        .map_err(|e| ApiError::InvalidUrl(format!("{LOGIN_PATH}: {e}")))?;
    let form = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("email", email)
        .append_pair("password", password)
        .finish();
    let request = HttpRequest {
        method: HttpMethod::Post,
        url: url.into(),
        headers: vec![
            ("User-Agent".to_string(), build.user_agent()),
            ("Accept".to_string(), JSON.to_string()),
            ("Content-Type".to_string(), FORM.to_string()),
        ],
        body: Some(form.into_bytes()),
    };

    debug!(url = %request.url, "exchanging credentials for token");
    let response = transport
        .execute(&request)
        .map_err(|e| ApiError::CredentialExchangeFailed(e.to_string()))?;
    if response.status >= 400 {
        return Err(ApiError::CredentialExchangeFailed(format!(
            "login returned {}",
            status_line(response.status)
        )));
    }

    let login: LoginResponse = serde_json::from_slice(&response.body)
        .map_err(|e| ApiError::CredentialExchangeFailed(format!("invalid login response: {e}")))?;
    match login.access_token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(ApiError::CredentialExchangeFailed(
            "login response has no access_token".to_string(),
        )),
    }
}

fn encode<B: Serialize + ?Sized>(payload: &B) -> Result<Vec<u8>> {
    serde_json::to_vec(payload).map_err(|e| ApiError::Encode(e.to_string()))
}

pub(crate) fn decode<D: DeserializeOwned>(body: &[u8]) -> Result<D> {
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}
