//! Wire shapes of the APIC REST API (JSON flavour).
//!
//! Every APIC response wraps its payload in `imdata`, a list of single-key
//! objects keyed by class name. Errors come back in the same envelope as an
//! `error` object.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ImData<T> {
    #[serde(default = "Vec::new")]
    pub imdata: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Attributes<T> {
    pub attributes: T,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorAttributes {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorItem {
    pub error: Option<Attributes<ErrorAttributes>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginItem {
    #[serde(rename = "aaaLogin")]
    pub aaa_login: Option<Attributes<LoginAttributes>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginAttributes {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HPortItem {
    #[serde(rename = "infraHPortS")]
    pub hport: Option<Attributes<HPortAttributes>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HPortAttributes {
    #[serde(default)]
    pub dn: String,
    #[serde(default)]
    pub name: String,
}

/// `{"aaaUser":{"attributes":{"name":..,"pwd":..}}}`
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    #[serde(rename = "aaaUser")]
    pub aaa_user: LoginUser<'a>,
}

#[derive(Serialize)]
pub(crate) struct LoginUser<'a> {
    pub attributes: LoginUserAttributes<'a>,
}

#[derive(Serialize)]
pub(crate) struct LoginUserAttributes<'a> {
    pub name: &'a str,
    pub pwd: &'a str,
}

/// First `error` in an envelope, rendered as `code N: text`, if the body is
/// one.
pub(crate) fn envelope_error_text(body: &str) -> Option<String> {
    let parsed: ImData<ErrorItem> = serde_json::from_str(body).ok()?;
    let err = parsed.imdata.into_iter().find_map(|i| i.error)?.attributes;
    if err.code.is_empty() {
        Some(err.text)
    } else {
        Some(format!("code {}: {}", err.code, err.text))
    }
}
