//! The risk synthesis pipeline: fetch, prompt, complete, parse, score,
//! persist.
//!
//! Completer trouble of any kind routes into the deterministic fallback
//! generator; the only errors this module surfaces are a missing row,
//! a cross-tenant selection, and persistence failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::ai::{fallback, parser, Completer, CompleterError, ParsedRisk, RiskPromptBuilder};
use crate::config::CompleterConfig;
use crate::core::{Risk, RiskId, RiskStatus, RiskType, TenantId, TenantScope};
use crate::errors::{CoreError, CoreResult};
use crate::repo::Repo;
use crate::scoring;

/// A `(tenant, entity, table, row)` source selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub tenant: TenantId,
    pub entity: String,
    pub table: String,
    pub row: String,
}

impl Selection {
    /// The runner key for this selection.
    pub fn job_key(&self) -> String {
        format!("{}:{}:{}:{}", self.tenant, self.entity, self.table, self.row)
    }
}

/// Composes the prompt builder, completer, parser, and scorer into one
/// synthesis pipeline.
pub struct RiskSynthesizer {
    repo: Arc<dyn Repo>,
    completer: Arc<dyn Completer>,
    config: CompleterConfig,
}

impl RiskSynthesizer {
    pub fn new(repo: Arc<dyn Repo>, completer: Arc<dyn Completer>, config: CompleterConfig) -> Self {
        Self {
            repo,
            completer,
            config,
        }
    }

    /// Generate and persist risks for one selection.
    ///
    /// Persisted risks keep the completion-output order. Returns the
    /// created records.
    pub fn generate(
        &self,
        scope: &TenantScope,
        selection: &Selection,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<Risk>> {
        scope.ensure(&selection.tenant)?;
        let tenant = scope.tenant();

        let row = self
            .repo
            .find_row(tenant, &selection.table, &selection.row)?
            .ok_or_else(|| {
                CoreError::not_found(format!(
                    "row {} not found in table {} for tenant {}",
                    selection.row, selection.table, tenant
                ))
            })?;
        let row = normalize(row);

        let prompt =
            RiskPromptBuilder::build(&selection.entity, &selection.table, &row, now.date_naive());

        let parsed = match self.complete_with_retry(&prompt) {
            Ok(text) => {
                let parsed = parser::parse(&text);
                if parsed.is_empty() {
                    log::warn!(
                        "completion for ({}, {}, {}) in tenant {} contained no risk blocks, using fallback",
                        selection.entity,
                        selection.table,
                        selection.row,
                        tenant
                    );
                    fallback::generate(&selection.entity, &selection.table, &row)
                } else {
                    parsed
                }
            }
            Err(err) => {
                log::warn!(
                    "completer unavailable for ({}, {}, {}) in tenant {} ({}), using fallback",
                    selection.entity,
                    selection.table,
                    selection.row,
                    tenant,
                    err
                );
                fallback::generate(&selection.entity, &selection.table, &row)
            }
        };

        let mut created = Vec::with_capacity(parsed.len());
        for item in parsed {
            created.push(self.persist(tenant, selection, item, now)?);
        }
        log::info!(
            "persisted {} risks for ({}, {}, {}) in tenant {}",
            created.len(),
            selection.entity,
            selection.table,
            selection.row,
            tenant
        );
        Ok(created)
    }

    /// One completion attempt, plus one retry on transport failure when
    /// configured.
    fn complete_with_retry(&self, prompt: &str) -> Result<String, CompleterError> {
        match self.completer.complete(prompt, self.config.timeout()) {
            Err(err) if self.config.retry && err.is_retryable() => {
                log::debug!("completion transport failed ({}), retrying once", err);
                std::thread::sleep(self.config.retry_backoff());
                self.completer.complete(prompt, self.config.timeout())
            }
            other => other,
        }
    }

    fn persist(
        &self,
        tenant: &TenantId,
        selection: &Selection,
        item: ParsedRisk,
        now: DateTime<Utc>,
    ) -> CoreResult<Risk> {
        let sequence = self.repo.next_risk_sequence(tenant)?;
        let score = scoring::score(item.likelihood, item.impact, item.exposure);
        let risk = Risk {
            id: RiskId::from_sequence(sequence),
            tenant: tenant.clone(),
            // title cap holds for fallback titles built from row data too
            title: item.title.chars().take(255).collect(),
            description: item.description,
            likelihood: item.likelihood,
            impact: item.impact,
            exposure: item.exposure,
            score,
            priority: scoring::priority_for_score(score),
            status: RiskStatus::default(),
            risk_type: RiskType::default(),
            ai_explanation: item.explanation,
            suggested_mitigations: item.mitigations,
            entity: selection.entity.clone(),
            data: selection.table.clone(),
            row: selection.row.clone(),
            created_at: now,
            updated_at: now,
        };
        self.repo.insert_risk(tenant, risk)
    }
}

/// Strip null members so the prompt's JSON dump stays compact. Dates
/// and decimals arrive as ISO strings and plain numbers already.
fn normalize(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, normalize(v)))
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(normalize).collect())
        }
        other => other,
    }
}
