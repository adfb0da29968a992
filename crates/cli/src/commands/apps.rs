//! Catalog commands

use anyhow::Result;
use gatehouse_business::CatalogService;
use gatehouse_core::NewCatalogEntry;

use crate::db;
use crate::AppsAction;

/// Handle apps subcommands
pub async fn handle(url: &str, action: AppsAction) -> Result<()> {
    let ctx = db::connect(url).await?;
    let service = CatalogService::new(&ctx);

    match action {
        AppsAction::List => {
            let apps = service.list_all().await?;
            if apps.is_empty() {
                println!("📭 Catalog is empty");
            }
            for app in apps {
                println!(
                    "{} {:<36} {:<20} {:<12} {}",
                    if app.is_active { "●" } else { "○" },
                    app.id,
                    app.name,
                    app.category,
                    app.url
                );
            }
        }
        AppsAction::Add {
            name,
            description,
            url,
            category,
            icon_url,
        } => {
            let input = NewCatalogEntry::parse(
                Some(&name),
                Some(&description),
                Some(&url),
                category.as_deref(),
                icon_url.as_deref(),
            )?;
            let entry = service.create(input).await?;
            println!("✅ Added {} ({})", entry.name, entry.id);
        }
        AppsAction::Enable { app_id } => {
            let entry = service.set_active(&app_id, true).await?;
            println!("✅ {} enabled", entry.name);
        }
        AppsAction::Disable { app_id } => {
            let entry = service.set_active(&app_id, false).await?;
            println!("✅ {} disabled", entry.name);
        }
    }

    ctx.pool().close().await;
    Ok(())
}
