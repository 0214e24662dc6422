//! DNS-01 solver surface handed to the certificate issuance host.
//!
//! The host owns scheduling, retries and propagation checks; it calls
//! [`ChallengeSolver::present`] and [`ChallengeSolver::clean_up`] once per
//! domain per attempt, possibly for many domains at the same time.
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::{ClientConfig, Credentials, SecretRef, SolverConfig};
use crate::cpanel::{CpanelClient, ZoneLock};
use crate::error::{ConfigError, SolverError};

/// A single challenge as the issuance host describes it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    /// `_acme-challenge.www.example.com.`
    #[serde(rename = "resolvedFQDN")]
    pub resolved_fqdn: String,
    /// `example.com.`
    pub resolved_zone: String,
    /// The TXT value to publish.
    pub key: String,
    /// Raw per-issuer solver configuration.
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

#[async_trait]
pub trait ChallengeSolver: Send + Sync {
    /// Unique within one webhook deployment.
    fn name(&self) -> &'static str;

    /// Publish the challenge value. Must tolerate repeated calls.
    async fn present(&self, ch: &ChallengeRequest) -> Result<(), SolverError>;

    /// Remove only the record carrying this challenge's value.
    async fn clean_up(&self, ch: &ChallengeRequest) -> Result<(), SolverError>;
}

/// Where credentials named by a solver config's `secretRef` come from.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn credentials(&self, secret: SecretRef<'_>) -> Result<Credentials, ConfigError>;
}

/// Hands out the same credentials for every secret reference.
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub Credentials);

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn credentials(&self, _secret: SecretRef<'_>) -> Result<Credentials, ConfigError> {
        Ok(self.0.clone())
    }
}

/// Secrets mounted as `<root>/<namespace>/<name>/<key>` files.
#[derive(Debug, Clone)]
pub struct SecretDirCredentials {
    pub root: PathBuf,
}

#[async_trait]
impl CredentialSource for SecretDirCredentials {
    async fn credentials(&self, secret: SecretRef<'_>) -> Result<Credentials, ConfigError> {
        let dir = self.root.join(secret.namespace).join(secret.name);
        debug!("reading secret {}/{} from {}", secret.namespace, secret.name, dir.display());
        let creds = Credentials::from_secret_dir(&dir)?;
        info!("got credentials from secret");
        Ok(creds)
    }
}

pub struct CpanelSolver {
    credentials: Box<dyn CredentialSource>,
    lock: ZoneLock,
}

impl CpanelSolver {
    pub fn new(credentials: impl CredentialSource + 'static) -> Self {
        Self {
            credentials: Box::new(credentials),
            lock: ZoneLock::default(),
        }
    }

    /// The lock every client built by this solver shares.
    pub fn lock(&self) -> &ZoneLock {
        &self.lock
    }

    /// Decode the request's config, look up its secret and build a client
    /// that shares this solver's lock.
    pub async fn client_for(&self, ch: &ChallengeRequest) -> Result<CpanelClient, SolverError> {
        let cfg = SolverConfig::from_json(ch.config.as_ref())?;
        info!("decoded solver configuration {cfg:?}");
        cfg.validate()?;

        let secret = cfg.secret_ref()?;
        let credentials = self.credentials.credentials(secret).await?;
        let config = ClientConfig::new(cfg.cpanel_url.clone(), ch.resolved_zone.clone(), credentials)?;
        Ok(CpanelClient::with_lock(config, self.lock.clone()))
    }
}

#[async_trait]
impl ChallengeSolver for CpanelSolver {
    fn name(&self) -> &'static str {
        "cpanel-solver"
    }

    async fn present(&self, ch: &ChallengeRequest) -> Result<(), SolverError> {
        info!("got request to present '{}'", ch.resolved_fqdn);
        let client = self.client_for(ch).await?;
        client.present(&ch.resolved_fqdn, &ch.key).await?;
        debug!("present complete for '{}'", ch.resolved_fqdn);
        Ok(())
    }

    async fn clean_up(&self, ch: &ChallengeRequest) -> Result<(), SolverError> {
        info!("got request to clean up '{}'", ch.resolved_fqdn);
        let client = self.client_for(ch).await?;
        client.clean_up(&ch.resolved_fqdn, &ch.key).await?;
        debug!("clean up complete for '{}'", ch.resolved_fqdn);
        Ok(())
    }
}
