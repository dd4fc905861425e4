//! Keyring-based credential storage for the Spotify app

use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use keyring::Entry;
use tracing::{debug, info};

use crate::catalog::{ClientCredentials, SpotifyClient};
use crate::config::Settings;

const KEYRING_SERVICE: &str = "tunefetch";

/// Manages authentication credentials storage
pub struct AuthManager;

impl AuthManager {
    /// Obtain Spotify app credentials
    ///
    /// Uses the keyring unless values were given or `force` is set, prompts
    /// for anything missing, and verifies the pair before storing it.
    pub async fn authenticate(
        client_id: Option<String>,
        client_secret: Option<String>,
        force: bool,
    ) -> Result<ClientCredentials> {
        let explicit = client_id.is_some() || client_secret.is_some();
        if !force && !explicit {
            if let Ok(creds) = Self::load() {
                info!("Found existing credentials in keyring");
                return Ok(creds);
            }
        } else if force {
            debug!("Force flag set, ignoring stored credentials");
        }

        let client_id = match client_id {
            Some(id) => id,
            None => Input::<String>::new()
                .with_prompt("Spotify client ID")
                .interact_text()
                .context("Failed to read client ID")?,
        };

        let client_secret = match client_secret {
            Some(secret) => secret,
            None => Password::new()
                .with_prompt("Spotify client secret")
                .interact()
                .context("Failed to read client secret")?,
        };

        let creds = ClientCredentials::new(&client_id, &client_secret)
            .ok_or_else(|| anyhow::anyhow!("Client ID and client secret must both be non-empty"))?;

        Self::verify(&creds).await?;

        Self::store(&creds)?;
        info!("Credentials stored in keyring");

        Ok(creds)
    }

    /// Credentials for a run: the settings file first, then the keyring
    pub fn resolve(settings: &Settings) -> Option<ClientCredentials> {
        settings.credentials().or_else(|| Self::load().ok())
    }

    /// Load credentials from keyring
    pub fn load() -> Result<ClientCredentials> {
        let client_id = Self::get_entry("client_id")?
            .get_password()
            .context("No Spotify client ID in keyring")?;

        let client_secret = Self::get_entry("client_secret")?
            .get_password()
            .context("No Spotify client secret in keyring")?;

        ClientCredentials::new(&client_id, &client_secret)
            .ok_or_else(|| anyhow::anyhow!("Stored Spotify credentials are incomplete"))
    }

    /// Store credentials in keyring
    pub fn store(creds: &ClientCredentials) -> Result<()> {
        Self::get_entry("client_id")?
            .set_password(&creds.client_id)
            .context("Failed to store client ID in keyring")?;

        Self::get_entry("client_secret")?
            .set_password(&creds.client_secret)
            .context("Failed to store client secret in keyring")?;

        debug!("Credentials stored in keyring");
        Ok(())
    }

    /// Check if credentials exist in keyring
    pub fn exists() -> bool {
        Self::load().is_ok()
    }

    /// Verify credentials by requesting an access token
    pub async fn verify(creds: &ClientCredentials) -> Result<()> {
        debug!("Verifying Spotify credentials");

        let client = SpotifyClient::new(Some(creds.clone()))?;
        client.verify().await.context("Failed to verify credentials")?;

        info!("Credentials verified successfully");
        Ok(())
    }

    /// Get a keyring entry for a given key
    fn get_entry(key: &str) -> Result<Entry> {
        let entry_key = format!("spotify:{}", key);
        Entry::new(KEYRING_SERVICE, &entry_key).context("Failed to access keyring")
    }
}
