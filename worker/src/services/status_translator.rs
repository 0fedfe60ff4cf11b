use std::collections::HashMap;

use anyhow::{Context, Result};
use crates::domain::{
    entities::payment_statuses::PaymentStatusEntity,
    repositories::payment_statuses::PaymentStatusCatalogRepository,
    value_objects::enums::payment_statuses::PaymentStatus,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("unknown payment status name: {0}")]
    UnknownStatusName(String),
    #[error("unknown payment status code: {0}")]
    UnknownStatusCode(i64),
    #[error("payment status catalog is empty")]
    EmptyCatalog,
    #[error("payment status catalog has no entry for {0}")]
    MissingCanonicalStatus(PaymentStatus),
    #[error("payment status catalog lists {0} more than once")]
    DuplicateStatus(String),
}

#[derive(Debug, Clone, Copy)]
struct CanonicalCodes {
    pending: i64,
    paid: i64,
    expired: i64,
    failed: i64,
}

/// Bidirectional name/code lookup over the ledger's status catalog.
///
/// Built once at startup and shared behind an `Arc`; it is never mutated
/// afterwards, so lookups need no locking.
#[derive(Debug, Clone)]
pub struct StatusTranslator {
    name_to_code: HashMap<String, i64>,
    code_to_name: HashMap<i64, String>,
    canonical: CanonicalCodes,
}

impl StatusTranslator {
    pub async fn load(
        repository: &(dyn PaymentStatusCatalogRepository + Send + Sync),
    ) -> Result<Self> {
        let statuses = repository
            .list_statuses()
            .await
            .context("failed to read payment status catalog")?;

        let translator = Self::from_statuses(statuses)?;
        info!(
            statuses = translator.name_to_code.len(),
            "status_translator: catalog loaded"
        );
        Ok(translator)
    }

    pub fn from_statuses(statuses: Vec<PaymentStatusEntity>) -> Result<Self, StatusError> {
        if statuses.is_empty() {
            return Err(StatusError::EmptyCatalog);
        }

        let mut name_to_code = HashMap::with_capacity(statuses.len());
        let mut code_to_name = HashMap::with_capacity(statuses.len());
        for status in statuses {
            let name = normalize(&status.name);
            if name_to_code.insert(name.clone(), status.id).is_some()
                || code_to_name.insert(status.id, name.clone()).is_some()
            {
                return Err(StatusError::DuplicateStatus(name));
            }
        }

        let canonical_code = |status: PaymentStatus| {
            name_to_code
                .get(status.as_str())
                .copied()
                .ok_or(StatusError::MissingCanonicalStatus(status))
        };
        let canonical = CanonicalCodes {
            pending: canonical_code(PaymentStatus::Pending)?,
            paid: canonical_code(PaymentStatus::Paid)?,
            expired: canonical_code(PaymentStatus::Expired)?,
            failed: canonical_code(PaymentStatus::Failed)?,
        };

        Ok(Self {
            name_to_code,
            code_to_name,
            canonical,
        })
    }

    pub fn name_to_code(&self, name: &str) -> Result<i64, StatusError> {
        self.name_to_code
            .get(&normalize(name))
            .copied()
            .ok_or_else(|| StatusError::UnknownStatusName(name.to_string()))
    }

    pub fn code_to_name(&self, code: i64) -> Result<&str, StatusError> {
        self.code_to_name
            .get(&code)
            .map(String::as_str)
            .ok_or(StatusError::UnknownStatusCode(code))
    }

    /// Catalog code of a canonical status. Infallible: construction already
    /// verified all four are present.
    pub fn code_of(&self, status: PaymentStatus) -> i64 {
        match status {
            PaymentStatus::Pending => self.canonical.pending,
            PaymentStatus::Paid => self.canonical.paid,
            PaymentStatus::Expired => self.canonical.expired,
            PaymentStatus::Failed => self.canonical.failed,
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

/// The catalog as seeded by the migrations.
#[cfg(test)]
pub(crate) fn seeded_catalog() -> Vec<PaymentStatusEntity> {
    [(1, "PENDING"), (2, "PAID"), (3, "EXPIRED"), (4, "FAILED")]
        .into_iter()
        .map(|(id, name)| PaymentStatusEntity {
            id,
            name: name.to_string(),
        })
        .collect()
}
