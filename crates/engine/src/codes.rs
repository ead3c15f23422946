//! Scannable code composition.
//!
//! The engine persists opaque tokens plus the URLs that scan stations
//! resolve them through; rendering the actual label image happens
//! outside this process.

use presshub_core::error::CoreError;
use presshub_core::tokens::generate_scan_token;
use presshub_core::types::DbId;
use presshub_db::repositories::{BatchRepo, UnitRepo};

use crate::error::EngineError;
use crate::Engine;

/// Public-host configuration for scan URLs.
#[derive(Debug, Clone)]
pub struct ScanCodeConfig {
    public_host: String,
}

impl ScanCodeConfig {
    /// `public_host` is the externally reachable base URL of this
    /// service, e.g. `https://ops.example.com`.
    pub fn new(public_host: &str) -> Self {
        Self {
            public_host: public_host.trim_end_matches('/').to_string(),
        }
    }

    /// Load the public host from the `PUBLIC_HOST` env var, defaulting
    /// to a local development URL.
    pub fn from_env() -> Self {
        let host =
            std::env::var("PUBLIC_HOST").unwrap_or_else(|_| "http://localhost:3000".into());
        Self::new(&host)
    }

    /// Mint a token + URL pair for a batch (printer scan).
    pub fn batch_code(&self) -> (String, String) {
        let token = generate_scan_token();
        let url = format!("{}/api/v1/scan/batch/{token}", self.public_host);
        (token, url)
    }

    /// Mint a token + URL pair for a unit (cutting/fulfillment scans).
    pub fn unit_code(&self) -> (String, String) {
        let token = generate_scan_token();
        let url = format!("{}/api/v1/scan/unit/{token}", self.public_host);
        (token, url)
    }
}

/// Scan codes minted for one batch's labels.
#[derive(Debug, Clone)]
pub struct BatchCodes {
    pub batch_token: String,
    pub batch_url: String,
    pub unit_codes: Vec<UnitCode>,
}

/// One unit's freshly minted scan code.
#[derive(Debug, Clone)]
pub struct UnitCode {
    pub unit_id: DbId,
    pub token: String,
    pub url: String,
}

impl Engine {
    /// (Re)generate label codes for a batch: a fresh batch code, plus
    /// codes for every unit that does not have one yet. Returns the full
    /// set for label printing.
    pub async fn generate_batch_codes(&self, batch_id: DbId) -> Result<BatchCodes, EngineError> {
        let mut tx = self.pool().begin().await?;

        BatchRepo::find_by_id(&mut *tx, batch_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Batch",
                id: batch_id,
            })?;

        let (batch_token, batch_url) = self.codes().batch_code();
        BatchRepo::set_scan_code(&mut *tx, batch_id, &batch_token, &batch_url).await?;

        let mut unit_codes = Vec::new();
        for unit in UnitRepo::list_without_token_for_batch(&mut *tx, batch_id).await? {
            let (token, url) = self.codes().unit_code();
            UnitRepo::set_scan_code(&mut *tx, unit.id, &token, &url).await?;
            unit_codes.push(UnitCode {
                unit_id: unit.id,
                token,
                url,
            });
        }

        tx.commit().await?;
        tracing::info!(batch_id, units = unit_codes.len(), "Batch scan codes generated");
        Ok(BatchCodes {
            batch_token,
            batch_url,
            unit_codes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_embed_the_token_under_the_public_host() {
        let codes = ScanCodeConfig::new("https://ops.example.com/");
        let (token, url) = codes.batch_code();
        assert_eq!(url, format!("https://ops.example.com/api/v1/scan/batch/{token}"));
        let (token, url) = codes.unit_code();
        assert_eq!(url, format!("https://ops.example.com/api/v1/scan/unit/{token}"));
    }
}
