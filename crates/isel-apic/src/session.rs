use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use crate::model::{envelope_error_text, ImData, LoginItem, LoginRequest, LoginUser, LoginUserAttributes};
use crate::ApicError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client settings shared by every call of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Bound on each individual request (login, query, every push).
    pub timeout: Duration,
    /// APIC ships with a self-signed certificate; most fabrics never replace it.
    pub accept_invalid_certs: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            accept_invalid_certs: true,
        }
    }
}

/// Operator credentials. **Password is redacted in `Debug` output.**
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// Accepts a bare host (`apic1`, `10.0.0.1:8443`) or a full base URL and
/// returns the base URL without a trailing slash. Bare hosts get `https://`.
pub fn normalize_base_url(host: &str) -> Result<String, ApicError> {
    let h = host.trim().trim_end_matches('/');
    if h.is_empty() {
        return Err(ApicError::Config("apic host is empty".to_string()));
    }
    let candidate = if h.contains("://") {
        h.to_string()
    } else {
        format!("https://{h}")
    };
    reqwest::Url::parse(&candidate)
        .map_err(|e| ApicError::Config(format!("invalid apic host '{host}': {e}")))?;
    Ok(candidate)
}

/// Unauthenticated handle on one controller.
#[derive(Debug, Clone)]
pub struct ApicClient {
    http: Client,
    base_url: String,
}

impl ApicClient {
    pub fn new(host: &str, opts: &ClientOptions) -> Result<Self, ApicError> {
        let base_url = normalize_base_url(host)?;
        if opts.accept_invalid_certs && base_url.starts_with("https://") {
            warn!(%base_url, "TLS certificate verification disabled");
        }
        let http = Client::builder()
            .timeout(opts.timeout)
            .danger_accept_invalid_certs(opts.accept_invalid_certs)
            .build()
            .map_err(|e| ApicError::Config(format!("http client build failed: {e}")))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /api/aaaLogin.json`. Any failure here is fatal to the run.
    pub fn login(&self, creds: &Credentials) -> Result<ApicSession, ApicError> {
        let url = self.url("/api/aaaLogin.json");
        debug!(%url, user = %creds.username, "apic login");

        let body = LoginRequest {
            aaa_user: LoginUser {
                attributes: LoginUserAttributes {
                    name: &creds.username,
                    pwd: &creds.password,
                },
            },
        };
        let resp = self.http.post(&url).json(&body).send()?;
        let status = resp.status();
        let text = resp.text()?;
        if !status.is_success() {
            return Err(http_error(status.as_u16(), &text));
        }

        let parsed: ImData<LoginItem> = serde_json::from_str(&text)
            .map_err(|e| ApicError::Decode(format!("login response: {e}")))?;
        let token = parsed
            .imdata
            .into_iter()
            .find_map(|i| i.aaa_login)
            .map(|a| a.attributes.token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApicError::Decode("login response carries no token".to_string()))?;

        info!(base_url = %self.base_url, user = %creds.username, "authenticated to apic");
        Ok(ApicSession {
            client: self.clone(),
            token,
        })
    }
}

/// Authenticated context for one run: base URL, HTTP client and token.
/// **Token is redacted in `Debug` output.**
#[derive(Clone)]
pub struct ApicSession {
    client: ApicClient,
    token: String,
}

impl ApicSession {
    /// Build a session around an already-issued token.
    pub fn with_token(client: ApicClient, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client.http
    }

    pub(crate) fn url(&self, path: &str) -> String {
        self.client.url(path)
    }

    pub(crate) fn cookie(&self) -> String {
        format!("APIC-cookie={}", self.token)
    }
}

impl fmt::Debug for ApicSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApicSession")
            .field("base_url", &self.client.base_url)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

pub(crate) fn http_error(status: u16, body: &str) -> ApicError {
    ApicError::Http {
        status,
        message: envelope_error_text(body).unwrap_or_else(|| body.trim().to_string()),
    }
}
