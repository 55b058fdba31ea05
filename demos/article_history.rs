//! Article History
//!
//! This example walks one article through its lifecycle and back.
//!
//! Key concepts:
//! - Configuration loaded from TOML
//! - Lifecycle hooks producing audit records
//! - Redacted and encoded attributes
//! - Presenting a stored audit and rolling the article back
//!
//! Run with: cargo run --example article_history

use audit_trail::archive::AuditArchive;
use audit_trail::auditor::{Auditor, AuditorError, Observer};
use audit_trail::builder::{Fixed, Resolvers};
use audit_trail::config::AuditConfig;
use audit_trail::core::{Actor, AuditSettings, Auditable, TrackedRecord, Value};
use audit_trail::driver::MemoryDriver;
use audit_trail::modifier::BASE64_ENCODER;

const CONFIG: &str = r#"
threshold = 10
events = ["archived"]
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Article History Example ===\n");

    let config = AuditConfig::from_toml_str(CONFIG)?;
    let resolvers = Resolvers::new()
        .user(|| Some(Actor::new(1, "users")))
        .url(Fixed::text("https://example.test/articles/1"))
        .ip_address(Fixed::text("192.168.0.10"))
        .user_agent(Fixed::text("article-history-demo"));
    let auditor = Auditor::new(config).with_resolvers(resolvers);
    let mut ctx = auditor.context();
    let mut driver = MemoryDriver::new();

    let mut article = TrackedRecord::new("articles")
        .with_attribute("id", 1)
        .with_attribute("title", "How To Audit Models")
        .with_attribute("content", "First draft")
        .with_attribute("reviewed", 0)
        .with_tags(["docs"])
        .with_settings(AuditSettings::new().modifier("reviewed", BASE64_ENCODER))
        .synced();

    {
        let mut observer = Observer::new(&auditor, &mut driver);

        println!("1. Creating the article");
        observer.created(&ctx, &article)?;

        println!("2. Editing title and review flag");
        article.set_attribute("title", Value::from("How To Audit Eloquent Models"));
        article.set_attribute("reviewed", Value::from(1));
        observer.updated(&ctx, &article)?;
        article.sync_original();

        println!("3. Deleting and restoring");
        observer.deleted(&ctx, &article)?;
        observer.restore(&mut ctx, &mut article, |observer, ctx, article| {
            article.set_attribute("deleted_at", Value::Null);
            observer.updated(ctx, &*article)?;
            Ok::<(), AuditorError>(())
        })?;
    }

    println!("\nStored audits:");
    for audit in driver.audits() {
        println!(
            "  {} {} by {:?}: {} old / {} new values",
            audit.created_at().format("%H:%M:%S"),
            audit.event(),
            audit.actor().map(|a| a.id.to_string()),
            audit.old_values().len(),
            audit.new_values().len(),
        );
    }

    let update = driver
        .audits()
        .iter()
        .find(|a| a.event().as_str() == "updated")
        .cloned()
        .ok_or("no update audit stored")?;

    println!("\nModified attributes of the update:");
    for (attribute, change) in auditor.modified(&article, &update)? {
        println!("  {attribute}: {:?} -> {:?}", change.old, change.new);
    }

    println!("\nRolling back to the values before the update");
    auditor.transition(&mut article, &update, true)?;
    for (attribute, value) in article.dirty() {
        println!("  pending {attribute} = {value}");
    }

    let archive = AuditArchive::new(driver.audits().to_vec());
    println!("\nArchived {} audits as JSON:", archive.audits.len());
    println!("{}", archive.to_json()?);

    println!("\n=== Example Complete ===");
    Ok(())
}
