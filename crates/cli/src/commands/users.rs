//! User and approval commands

use anyhow::{Context, Result};
use gatehouse_business::{
    ApprovalEngine, DecideCommand, DirectoryQuery, DirectoryService, GrantOutcome,
};
use gatehouse_core::{Decision, Role};
use gatehouse_persistence::ProfileRepo;
use tracing::{info, warn};

use crate::db;
use crate::{DecisionArg, StatusArg};

/// Grant the admin role to a user
pub async fn promote(url: &str, user_id: &str) -> Result<()> {
    let ctx = db::connect(url).await?;
    ProfileRepo::set_role(ctx.pool(), user_id, Role::Admin)
        .await
        .with_context(|| format!("Failed to promote {}", user_id))?;
    info!(user_id, "Promoted to admin");

    println!("✅ {} is now an admin", user_id);
    ctx.pool().close().await;
    Ok(())
}

/// List users
pub async fn list(url: &str, status: Option<StatusArg>, page: i64, limit: i64) -> Result<()> {
    let ctx = db::connect(url).await?;
    let query = DirectoryQuery {
        status: status.map(|s| s.to_core_status().as_str().to_string()),
        page: Some(page),
        limit: Some(limit),
    };
    let result = DirectoryService::new(&ctx).list_users(&query).await?;

    if result.users.is_empty() {
        println!("📭 No users found");
    } else {
        println!(
            "{:<24} {:<30} {:<10} {:<6} {}",
            "ID", "EMAIL", "STATUS", "ROLE", "REQUEST"
        );
        for entry in &result.users {
            println!(
                "{:<24} {:<30} {:<10} {:<6} {}",
                entry.profile.id,
                entry.profile.email,
                entry.profile.status.as_str(),
                entry.profile.role.as_str(),
                entry
                    .approval_request
                    .as_ref()
                    .map(|r| r.id.as_str())
                    .unwrap_or("-"),
            );
        }
    }

    let p = &result.pagination;
    println!();
    println!(
        "Page {}/{} ({} users)",
        p.page,
        p.total_pages.max(1),
        p.total
    );

    ctx.pool().close().await;
    Ok(())
}

/// Approve or reject a request on behalf of an admin
pub async fn decide(
    url: &str,
    request_id: &str,
    user_id: &str,
    action: DecisionArg,
    notes: Option<&str>,
    admin: &str,
) -> Result<()> {
    let ctx = db::connect(url).await?;
    gatehouse_business::require_admin(Some(admin), &ctx).await?;

    let command = match action.to_core_decision() {
        Decision::Approve => DecideCommand::approve(request_id, user_id),
        Decision::Reject => DecideCommand::reject(request_id, user_id, notes),
    };
    let outcome = ApprovalEngine::new(&ctx).decide(admin, &command).await?;
    info!(
        request_id = %outcome.request_id,
        status = %outcome.status,
        admin,
        "Decision applied from CLI"
    );

    println!("✅ Request {} → {}", outcome.request_id, outcome.status);
    match &outcome.grants {
        GrantOutcome::NotApplicable => {}
        GrantOutcome::Applied {
            granted,
            already_present,
        } => println!(
            "   Apps granted: {} (already present: {})",
            granted, already_present
        ),
        GrantOutcome::Failed { reason } => {
            warn!(user_id = %outcome.user_id, reason = %reason, "Grant step failed");
            println!("⚠️  Decision saved but granting apps failed: {}", reason)
        }
    }

    ctx.pool().close().await;
    Ok(())
}

/// Portal statistics
pub async fn stats(url: &str) -> Result<()> {
    let ctx = db::connect(url).await?;
    let stats = DirectoryService::new(&ctx).stats().await?;

    println!("📊 Portal Statistics");
    println!("   Users:        {}", stats.users.total);
    println!("     Pending:    {}", stats.users.pending);
    println!("     Approved:   {}", stats.users.approved);
    println!("     Rejected:   {}", stats.users.rejected);
    println!("     Last 7 days: {}", stats.users.recent_registrations);
    println!("   Apps:         {}", stats.apps.total);
    println!("     Active:     {}", stats.apps.active);

    ctx.pool().close().await;
    Ok(())
}
