//! Approval engine - PENDING → APPROVED | REJECTED
//!
//! A decision is applied in two phases:
//! 1. In one transaction: status-conditioned update of the approval request,
//!    then the profile status. Either both rows change or neither does.
//! 2. After commit, on approval only: grant every active catalog entry.
//!    This step is best-effort; its outcome is reported in
//!    [`DecisionOutcome::grants`] and never undoes phase 1.

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use anyhow::Context;
use chrono::Utc;
use gatehouse_core::{AccessStatus, CoreError, Decision};
use gatehouse_persistence::{
    ApprovalRequestRepo, CatalogRepo, DecisionUpdate, GrantRepo, PersistenceError, ProfileRepo,
};
use serde::Serialize;
use tracing::{error, info, warn};

/// Validated admin decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecideCommand {
    pub request_id: String,
    pub user_id: String,
    pub decision: Decision,
    pub notes: Option<String>,
}

impl DecideCommand {
    /// Build a command from raw request fields.
    ///
    /// `request_id`, `user_id` and `action` are required; `action` must be
    /// `approve` or `reject`. Blank notes are dropped.
    pub fn parse(
        request_id: Option<&str>,
        user_id: Option<&str>,
        action: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Self, CoreError> {
        let required = |value: Option<&str>, field: &str| -> Result<String, CoreError> {
            match value.map(str::trim) {
                Some(v) if !v.is_empty() => Ok(v.to_string()),
                _ => Err(CoreError::missing(field)),
            }
        };

        let request_id = required(request_id, "requestId")?;
        let user_id = required(user_id, "userId")?;
        let action = required(action, "action")?;
        let decision =
            Decision::from_str(&action).ok_or_else(|| CoreError::InvalidDecision(action.clone()))?;
        let notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(Self {
            request_id,
            user_id,
            decision,
            notes,
        })
    }

    pub fn approve(request_id: &str, user_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            user_id: user_id.to_string(),
            decision: Decision::Approve,
            notes: None,
        }
    }

    pub fn reject(request_id: &str, user_id: &str, notes: Option<&str>) -> Self {
        Self {
            request_id: request_id.to_string(),
            user_id: user_id.to_string(),
            decision: Decision::Reject,
            notes: notes.map(str::to_string),
        }
    }
}

/// Outcome of the bulk grant step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GrantOutcome {
    /// Rejections never grant
    NotApplicable,
    /// `granted` new rows; `already_present` pairs were left untouched
    Applied { granted: usize, already_present: usize },
    /// The grant step failed after the decision was committed
    Failed { reason: String },
}

/// Result of a committed decision
#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutcome {
    pub request_id: String,
    pub user_id: String,
    pub status: AccessStatus,
    pub decided: bool,
    pub grants: GrantOutcome,
}

impl DecisionOutcome {
    /// Number of grants created by this decision
    pub fn grants_applied(&self) -> usize {
        match self.grants {
            GrantOutcome::Applied { granted, .. } => granted,
            _ => 0,
        }
    }

    pub fn grant_failed(&self) -> bool {
        matches!(self.grants, GrantOutcome::Failed { .. })
    }
}

/// Approval Engine - applies admin decisions to requests, profiles and grants
pub struct ApprovalEngine<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ApprovalEngine<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Apply `command` on behalf of admin `actor_id`.
    ///
    /// The caller is expected to have verified admin capability already.
    pub async fn decide(
        &self,
        actor_id: &str,
        command: &DecideCommand,
    ) -> BusinessResult<DecisionOutcome> {
        let status = command.decision.target_status();
        let now = Utc::now();
        let update = DecisionUpdate {
            status,
            admin_notes: match command.decision {
                Decision::Reject => command.notes.as_deref(),
                Decision::Approve => None,
            },
            approved_by: Some(actor_id),
            approved_at: command.decision.grants_access().then_some(now),
            decided_at: now,
        };

        let mut tx = self
            .ctx
            .pool()
            .begin()
            .await
            .context("Failed to open decision transaction")?;

        let applied = ApprovalRequestRepo::decide_if_pending(
            &mut *tx,
            &command.request_id,
            &command.user_id,
            &update,
        )
        .await
        .context("Failed to update approval request")?;

        if !applied {
            let existing = ApprovalRequestRepo::find_by_id(&mut *tx, &command.request_id)
                .await
                .context("Failed to read approval request")?;
            tx.rollback().await.context("Failed to roll back decision")?;

            let err = match existing {
                Some(row) if row.user_id == command.user_id => {
                    let current = AccessStatus::from_str(&row.status).ok_or_else(|| {
                        BusinessError::from(PersistenceError::invalid_enum("status", &row.status))
                    })?;
                    match current.apply(command.decision) {
                        Err(CoreError::AlreadyDecided(status)) => {
                            warn!(
                                request_id = %command.request_id,
                                status = %status,
                                "Decision refused: request already decided"
                            );
                            BusinessError::AlreadyDecided {
                                request_id: command.request_id.clone(),
                                status,
                            }
                        }
                        Err(other) => BusinessError::from(other),
                        // still PENDING but the conditional update matched nothing
                        Ok(_) => BusinessError::not_found("ApprovalRequest", &command.request_id),
                    }
                }
                _ => BusinessError::not_found("ApprovalRequest", &command.request_id),
            };
            return Err(err.into());
        }

        if let Err(e) = ProfileRepo::update_status(&mut *tx, &command.user_id, status, now).await {
            // tx rolls back on drop
            if e.is_not_found() {
                return Err(BusinessError::not_found("UserProfile", &command.user_id).into());
            }
            return Err(anyhow::Error::from(e).context("Failed to update user profile"));
        }

        tx.commit().await.context("Failed to commit decision")?;

        info!(
            request_id = %command.request_id,
            user_id = %command.user_id,
            actor = actor_id,
            status = %status,
            "Approval decision committed"
        );

        let grants = if command.decision.grants_access() {
            self.grant_active_catalog(&command.user_id).await
        } else {
            GrantOutcome::NotApplicable
        };

        Ok(DecisionOutcome {
            request_id: command.request_id.clone(),
            user_id: command.user_id.clone(),
            status,
            decided: true,
            grants,
        })
    }

    /// Grant every active catalog entry to `user_id`, swallowing failures
    async fn grant_active_catalog(&self, user_id: &str) -> GrantOutcome {
        match self.try_grant_active_catalog(user_id).await {
            Ok((granted, already_present)) => {
                info!(user_id, granted, already_present, "Catalog access granted");
                GrantOutcome::Applied {
                    granted,
                    already_present,
                }
            }
            Err(e) => {
                error!(user_id, error = %e, "Error granting app access");
                GrantOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_grant_active_catalog(&self, user_id: &str) -> BusinessResult<(usize, usize)> {
        let mut tx = self.ctx.pool().begin().await?;
        let app_ids = CatalogRepo::list_active_ids(&mut *tx)
            .await
            .context("Failed to read active catalog")?;

        let granted_at = Utc::now();
        let mut granted = 0;
        for app_id in &app_ids {
            if GrantRepo::insert_if_absent(&mut *tx, user_id, app_id, granted_at)
                .await
                .with_context(|| format!("Failed to grant {}", app_id))?
            {
                granted += 1;
            }
        }

        tx.commit().await?;
        Ok((granted, app_ids.len() - granted))
    }
}
