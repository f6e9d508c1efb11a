//! Command handler modules for the `isel` binary.
//!
//! Shared utilities used by multiple command paths live here.

pub mod sync;

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Input, Password};
use isel_apic::Credentials;
use isel_config::ResolvedCredentials;

/// Value from the command line, then config, then the operator.
pub fn value_or_prompt(flag: Option<String>, configured: &str, prompt: &str) -> Result<String> {
    if let Some(v) = flag.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
        return Ok(v);
    }
    let configured = configured.trim();
    if !configured.is_empty() {
        return Ok(configured.to_string());
    }
    let input: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact_text()
        .with_context(|| format!("no value given for '{prompt}'"))?;
    Ok(input.trim().to_string())
}

/// Fill whatever the environment did not provide from the terminal.
pub fn complete_credentials(resolved: ResolvedCredentials) -> Result<Credentials> {
    let theme = ColorfulTheme::default();
    let username = match resolved.username {
        Some(u) => u,
        None => {
            println!("Enter your APIC credentials:");
            let u: String = Input::with_theme(&theme)
                .with_prompt("Username")
                .interact_text()
                .context("no APIC username given")?;
            u.trim().to_string()
        }
    };
    let password = match resolved.password {
        Some(p) => p,
        None => Password::with_theme(&theme)
            .with_prompt("Password")
            .interact()
            .context("no APIC password given")?,
    };
    Ok(Credentials::new(username, password))
}
