//! # Seed Data Generator
//!
//! Provisions default document number formats for a tenant, the way the
//! (external) tenant-provisioning flow would in production.
//!
//! ## Usage
//! ```bash
//! # Seed defaults for a random demo tenant
//! cargo run -p fixdesk-db --bin seed
//!
//! # Specify tenant and database path
//! cargo run -p fixdesk-db --bin seed -- --tenant 550e8400-... --db ./data/fixdesk.db
//! ```
//!
//! ## Generated Formats
//! One row per document type with the stock defaults:
//! - job_sheet:      JS-YYYY-NNN, yearly reset
//! - invoice:        INV-YYYY-NNN, yearly reset
//! - estimate:       EST-YYYY-NNN, yearly reset
//! - service_ticket: ST-YYYY-NNN, yearly reset

use std::env;

use fixdesk_core::{DocumentNumberFormat, DocumentType};
use fixdesk_db::{Database, DbConfig};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let db_path = arg_value(&args, "--db").unwrap_or_else(|| "./fixdesk.db".to_string());
    let tenant_id = arg_value(&args, "--tenant").unwrap_or_else(|| Uuid::new_v4().to_string());

    println!("Seeding default formats");
    println!("  database: {db_path}");
    println!("  tenant:   {tenant_id}");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let formats = db.formats();

    for document_type in DocumentType::ALL {
        let format = DocumentNumberFormat::default_for(&tenant_id, document_type);
        formats.upsert(&format).await?;
        println!("  {document_type}: prefix {}", format.prefix);
    }

    db.close().await;
    println!("Done.");
    Ok(())
}

/// Returns the value following a `--flag` argument, if present.
fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
