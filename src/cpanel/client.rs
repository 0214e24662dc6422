use std::sync::Arc;

use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::cpanel::types::*;
use crate::error::CpanelError;

const PARSE_ZONE: &str = "parse_zone";
const MASS_EDIT_ZONE: &str = "mass_edit_zone";

/// Lock shared by every client that may mutate the same cPanel account.
///
/// `mass_edit_zone` keys edits on the zone serial and cPanel silently drops
/// one of two edits made against the same serial, so the whole
/// read-serial-then-write sequence must run under this lock.
pub type ZoneLock = Arc<Mutex<()>>;

#[derive(Clone)]
pub struct CpanelClient {
    http: Client,
    config: ClientConfig,
    lock: ZoneLock,
}

impl CpanelClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_lock(config, ZoneLock::default())
    }

    /// Build a client that serializes with other holders of `lock`.
    pub fn with_lock(config: ClientConfig, lock: ZoneLock) -> Self {
        Self {
            http: Client::new(),
            config,
            lock,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Ensure a TXT record `record_name` carrying exactly `value` exists.
    ///
    /// `record_name` is fully qualified (`_acme-challenge.example.com.`).
    /// Calling this again with the same value issues no mutation.
    pub async fn present(&self, record_name: &str, value: &str) -> Result<(), CpanelError> {
        let _guard = self.lock.lock().await;
        info!("setting TXT record for '{record_name}' to '{value}'");
        let name = self.config.relative_name(record_name);
        debug!("calculated record name '{name}' for zone '{}'", self.config.zone);

        let zone = self.fetch_zone().await?;
        info!("got zone, record count: {}", zone.records.len());
        let serial = self.serial_of(&zone);

        let lookup = zone.find_for_present(name, value);
        if let Some(existing) = lookup.existing {
            info!(
                "TXT record '{name}' already carries the value (line {}), nothing to do",
                existing.line_index
            );
            return Ok(());
        }

        info!("no TXT record '{name}' with the value exists, creating it with ttl {}", lookup.ttl);
        match self.add_record(&serial, name, value, lookup.ttl).await {
            Ok(()) => {
                info!("record created");
                Ok(())
            }
            Err(err) => {
                error!("could not create record: {err}");
                Err(err)
            }
        }
    }

    /// Remove the TXT record `record_name` carrying exactly `value`.
    ///
    /// Other values under the same name are left alone, and a missing record
    /// counts as success.
    pub async fn clean_up(&self, record_name: &str, value: &str) -> Result<(), CpanelError> {
        let _guard = self.lock.lock().await;
        info!("deleting TXT record for '{record_name}' with value '{value}'");
        let name = self.config.relative_name(record_name);

        let zone = self.fetch_zone().await?;
        let serial = self.serial_of(&zone);

        let Some(line_index) = zone.find_for_delete(name, value) else {
            warn!("TXT record '{name}' not found, has it already been deleted? treating as success");
            return Ok(());
        };

        debug!("record found at line {line_index}");
        self.remove_record(&serial, line_index).await.inspect_err(|err| {
            error!("could not delete record: {err}");
        })
    }

    fn serial_of(&self, zone: &ZoneSnapshot) -> String {
        let serial = zone.serial();
        if serial.is_empty() {
            warn!(
                "no SOA serial found in zone '{}', mutating with an empty serial",
                self.config.zone_root()
            );
        } else {
            info!("got SOA serial {serial}");
        }
        serial
    }

    /// Read and decode the whole zone.
    pub async fn fetch_zone(&self) -> Result<ZoneSnapshot, CpanelError> {
        let res: ParseZoneResponse = self
            .execute(PARSE_ZONE, &[("zone", self.config.zone_root())])
            .await?;
        check_envelope(PARSE_ZONE, &res.envelope)?;
        Ok(ZoneSnapshot::from_wire(res.data.as_deref().unwrap_or_default()))
    }

    pub async fn add_record(
        &self,
        serial: &str,
        name: &str,
        value: &str,
        ttl: u32,
    ) -> Result<(), CpanelError> {
        let add = ZoneRecordAdd {
            dname: name,
            ttl,
            record_type: RecordType::Txt.as_str(),
            data: [value],
        };
        let add = serde_json::to_string(&add).map_err(|source| CpanelError::Encode {
            operation: MASS_EDIT_ZONE,
            source,
        })?;

        let res: UapiResponse = self
            .execute(
                MASS_EDIT_ZONE,
                &[
                    ("zone", self.config.zone_root()),
                    ("serial", serial),
                    ("add", add.as_str()),
                ],
            )
            .await?;
        check_envelope(MASS_EDIT_ZONE, &res)
    }

    pub async fn remove_record(&self, serial: &str, line_index: u32) -> Result<(), CpanelError> {
        let line_index = line_index.to_string();
        let res: UapiResponse = self
            .execute(
                MASS_EDIT_ZONE,
                &[
                    ("zone", self.config.zone_root()),
                    ("serial", serial),
                    ("remove", line_index.as_str()),
                ],
            )
            .await?;
        check_envelope(MASS_EDIT_ZONE, &res)
    }

    fn auth_header(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let creds = &self.config.credentials;
        if creds.uses_api_token() {
            req.header(
                AUTHORIZATION,
                format!("cpanel {}:{}", creds.username, creds.api_token),
            )
        } else {
            req.basic_auth(&creds.username, Some(&creds.password))
        }
    }

    fn url(&self, function: &str) -> String {
        format!("{}/execute/DNS/{}", self.config.base_url_root(), function)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        function: &'static str,
        query: &[(&str, &str)],
    ) -> Result<T, CpanelError> {
        let req = self.auth_header(self.http.get(self.url(function)).query(query));
        let res = req.send().await.map_err(CpanelError::transport(function))?;
        debug!("{function} responded {} for {}", res.status(), res.url());

        let status = res.status();
        let body = res.text().await.map_err(CpanelError::transport(function))?;
        serde_json::from_str(&body).map_err(|source| CpanelError::Decode {
            operation: function,
            status,
            source,
        })
    }
}

fn check_envelope(operation: &'static str, envelope: &UapiResponse) -> Result<(), CpanelError> {
    for warning in envelope.warnings() {
        warn!("{operation} warning: {warning}");
    }
    for message in envelope.messages() {
        debug!("{operation} message: {message}");
    }
    if envelope.errors().is_empty() {
        return Ok(());
    }

    error!("{operation} reported errors: {:?}", envelope.errors());
    Err(CpanelError::Provider {
        operation,
        errors: envelope.errors().to_vec(),
    })
}
