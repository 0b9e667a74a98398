//! Application access resolution
//!
//! Decides, per catalog entry, how the user gets in: direct navigation
//! for native entries, a brokered access grant for portal entries. The
//! grant is handed to the target application through its launch URL and
//! is never logged or displayed.

use std::io;
use std::process::Command;

use thiserror::Error;
use url::Url;

use super::models::{AccessGrant, ApplicationDescriptor, Category};
use crate::gateway::{GatewayClient, GatewayError};

/// Seam for opening a URL in a top-level navigation context.
pub trait Navigator {
    fn open(&self, url: &Url) -> io::Result<()>;
}

/// Opens URLs with the platform opener.
pub struct SystemNavigator;

impl Navigator for SystemNavigator {
    fn open(&self, url: &Url) -> io::Result<()> {
        let status = opener_command(url.as_str()).status()?;
        if !status.success() {
            return Err(io::Error::other(format!("opener exited with {}", status)));
        }
        Ok(())
    }
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(url);
    command
}

#[cfg(windows)]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", "", url]);
    command
}

#[cfg(not(any(target_os = "macos", windows)))]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(url);
    command
}

/// Build the launch URL for a brokered application by appending the
/// access token as a query parameter.
pub fn build_launch_url(app_url: &str, access_token: &str) -> Result<Url, url::ParseError> {
    let separator = if app_url.contains('?') { '&' } else { '?' };
    let raw = format!(
        "{}{}access_token={}",
        app_url,
        separator,
        urlencoding::encode(access_token)
    );
    Url::parse(&raw)
}

/// Outcome of resolving access for one catalog entry.
#[derive(Debug)]
pub enum Resolution {
    /// Direct navigation opened for a native entry.
    Navigated { url: Url },
    /// Grant issued and handed off through the entry's launch URL.
    Brokered { url: Url, grant: AccessGrant },
    /// Grant issued; the entry has no launch URL, so delivery is the
    /// caller's responsibility.
    Granted { grant: AccessGrant },
    /// Native entry without a usable URL; the click is a no-op.
    NoTarget,
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("access grant request failed: {0}")]
    Grant(#[from] GatewayError),
    #[error("failed to open {url}: {source}")]
    Navigation { url: Url, source: io::Error },
}

impl AccessError {
    /// True when the failure means the whole session is invalid, not just
    /// this one entry.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, AccessError::Grant(GatewayError::Unauthorized))
    }
}

/// Grants access to catalog entries on behalf of the current session.
///
/// Failures are per-entry: an error resolving one descriptor never
/// affects any other catalog entry.
pub struct AccessResolver<'a, N: Navigator> {
    gateway: &'a GatewayClient,
    navigator: &'a N,
}

impl<'a, N: Navigator> AccessResolver<'a, N> {
    pub fn new(gateway: &'a GatewayClient, navigator: &'a N) -> Self {
        Self { gateway, navigator }
    }

    pub async fn resolve(
        &self,
        token: &str,
        descriptor: &ApplicationDescriptor,
    ) -> Result<Resolution, AccessError> {
        match descriptor.category {
            Category::Native => self.resolve_native(descriptor),
            Category::Portal => self.resolve_portal(token, descriptor).await,
        }
    }

    fn resolve_native(
        &self,
        descriptor: &ApplicationDescriptor,
    ) -> Result<Resolution, AccessError> {
        let Some(raw) = descriptor.url.as_deref() else {
            // Data-integrity condition: a native entry should always carry a URL
            tracing::warn!(
                application_id = %descriptor.id,
                "Native application has no URL; nothing to open"
            );
            return Ok(Resolution::NoTarget);
        };

        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(error) => {
                tracing::warn!(
                    application_id = %descriptor.id,
                    url = %raw,
                    error = %error,
                    "Native application URL is not parseable; nothing to open"
                );
                return Ok(Resolution::NoTarget);
            }
        };

        self.navigate(&url, &descriptor.id)?;
        tracing::info!(
            application_id = %descriptor.id,
            url = %url,
            "Opened native application"
        );
        Ok(Resolution::Navigated { url })
    }

    async fn resolve_portal(
        &self,
        token: &str,
        descriptor: &ApplicationDescriptor,
    ) -> Result<Resolution, AccessError> {
        let grant = self
            .gateway
            .request_access_token(token, &descriptor.id)
            .await
            .map_err(|error| {
                tracing::warn!(
                    application_id = %descriptor.id,
                    error = %error,
                    "Access grant request failed"
                );
                AccessError::Grant(error)
            })?;

        // Log the grant by length only; the raw token must never appear
        // in diagnostics
        tracing::info!(
            application_id = %descriptor.id,
            token_len = grant.access_token.len(),
            "Access grant issued"
        );

        let Some(raw) = descriptor.url.as_deref() else {
            return Ok(Resolution::Granted { grant });
        };

        match build_launch_url(raw, &grant.access_token) {
            Ok(url) => {
                self.navigate(&url, &descriptor.id)?;
                tracing::info!(
                    application_id = %descriptor.id,
                    "Opened portal application with fresh grant"
                );
                Ok(Resolution::Brokered { url, grant })
            }
            Err(error) => {
                tracing::warn!(
                    application_id = %descriptor.id,
                    url = %raw,
                    error = %error,
                    "Launch URL is not parseable; returning grant to caller"
                );
                Ok(Resolution::Granted { grant })
            }
        }
    }

    fn navigate(&self, url: &Url, application_id: &str) -> Result<(), AccessError> {
        self.navigator.open(url).map_err(|source| {
            tracing::warn!(
                application_id = %application_id,
                url = %url,
                error = %source,
                "Failed to open navigation target"
            );
            AccessError::Navigation {
                url: url.clone(),
                source,
            }
        })
    }
}
