//! Command-line surface for the portal client.
//!
//! Each subcommand runs one complete flow: restore the persisted
//! session, verify it, then perform the requested operation. A failed
//! authenticated call with an invalid token forces a logout.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use crate::catalog::{self, AccessResolver, Catalog, Resolution, SystemNavigator};
use crate::config::Config;
use crate::gateway::{GatewayClient, RegisterRequest};
use crate::session::{LoginOutcome, SessionFile, SessionStore};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "portal-client")]
#[command(version, about = "Client portal session and application access", long_about = None)]
pub struct Cli {
    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and persist the session token
    Login {
        username: String,

        /// Password (can also be set via PORTAL_PASSWORD)
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create a new account
    Register {
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        full_name: String,

        /// Password (can also be set via PORTAL_PASSWORD)
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show the signed-in user
    Whoami,

    /// List the application catalog
    Apps,

    /// Open an application from the catalog
    Open {
        /// Application id
        app_id: String,
    },

    /// Clear the local session
    Logout,
}

pub async fn run(command: Commands, config: &Config) -> Result<()> {
    let gateway = GatewayClient::new(
        &config.api_url,
        config.http_connect_timeout_secs,
        config.http_request_timeout_secs,
    )?;

    let session_file = match &config.session_file {
        Some(path) => SessionFile::new(path.clone()),
        None => SessionFile::default_location()?,
    };
    let mut store = SessionStore::new(session_file);

    match command {
        Commands::Login { username, password } => {
            match store.login(&gateway, &username, &password).await {
                LoginOutcome::Success => {
                    if let Some(user) = store.user() {
                        println!("Signed in as {} ({})", user.username, user.full_name);
                    }
                    Ok(())
                }
                LoginOutcome::Failed { message } => bail!("{message}"),
            }
        }

        Commands::Register {
            username,
            email,
            full_name,
            password,
        } => {
            let user = gateway
                .register(&RegisterRequest {
                    username,
                    email,
                    full_name,
                    password,
                })
                .await?;
            println!("Account created for {}", user.username);
            Ok(())
        }

        Commands::Whoami => {
            store.restore(&gateway).await;
            match store.user() {
                Some(user) => {
                    println!("{} ({})", user.username, user.full_name);
                    Ok(())
                }
                None => bail!("Not signed in"),
            }
        }

        Commands::Apps => {
            store.restore(&gateway).await;
            let Some(token) = store.token().map(str::to_owned) else {
                bail!("Not signed in");
            };

            let catalog = match catalog::fetch_or_empty(&gateway, &token, &config.catalog_retry)
                .await
            {
                Ok(catalog) => catalog,
                Err(_) => return Err(force_logout(&mut store)),
            };

            print_catalog(&catalog);
            Ok(())
        }

        Commands::Open { app_id } => {
            store.restore(&gateway).await;
            let Some(token) = store.token().map(str::to_owned) else {
                bail!("Not signed in");
            };

            let catalog = match catalog::fetch_or_empty(&gateway, &token, &config.catalog_retry)
                .await
            {
                Ok(catalog) => catalog,
                Err(_) => return Err(force_logout(&mut store)),
            };

            let Some(descriptor) = catalog.get(&app_id) else {
                bail!("Unknown application: {app_id}");
            };

            let navigator = SystemNavigator;
            let resolver = AccessResolver::new(&gateway, &navigator);
            match resolver.resolve(&token, descriptor).await {
                Ok(Resolution::Navigated { url }) => {
                    println!("Opened {}", url);
                    Ok(())
                }
                // Never print the launch URL or the grant: both carry
                // the raw access token
                Ok(Resolution::Brokered { .. }) => {
                    println!("Opened {} with a fresh access grant", descriptor.name);
                    Ok(())
                }
                Ok(Resolution::Granted { .. }) => {
                    println!(
                        "Access granted for {}; no launch URL is configured",
                        descriptor.name
                    );
                    Ok(())
                }
                Ok(Resolution::NoTarget) => {
                    println!("{} has no destination URL; nothing to open", descriptor.name);
                    Ok(())
                }
                Err(error) if error.is_session_expired() => Err(force_logout(&mut store)),
                Err(error) => Err(error.into()),
            }
        }

        Commands::Logout => {
            store.logout();
            println!("Signed out");
            Ok(())
        }
    }
}

/// An authenticated call failed on an invalid token: clear the session
/// and tell the user to sign in again.
fn force_logout(store: &mut SessionStore) -> anyhow::Error {
    store.logout();
    anyhow::anyhow!("Session expired, please sign in again")
}

fn print_catalog(catalog: &Catalog) {
    let native = catalog.native();
    let portal = catalog.portal();

    println!("Native applications ({}):", native.len());
    for app in &native {
        println!("  {:<12} {} - {}", app.id, app.name, app.description);
    }

    println!();
    println!("Portal applications ({}):", portal.len());
    for app in &portal {
        println!("  {:<12} {} - {}", app.id, app.name, app.description);
    }
}
