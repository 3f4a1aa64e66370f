//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. UUIDs are stored as
//! strings. Certificate records are embedded in their session as an
//! array of objects, so a session is written and deleted as one unit.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users (credential store)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string READONLY;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD full_name ON TABLE user TYPE string;
DEFINE FIELD active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD last_login_at ON TABLE user TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_username ON TABLE user \
    COLUMNS username UNIQUE;

-- =======================================================================
-- Certificate sessions (ledger) with embedded certificate records
-- =======================================================================
DEFINE TABLE cert_session SCHEMAFULL;
DEFINE FIELD owner_user_id ON TABLE cert_session TYPE string;
DEFINE FIELD owner_username ON TABLE cert_session TYPE string;
DEFINE FIELD session_name ON TABLE cert_session TYPE string;
DEFINE FIELD total_certificates ON TABLE cert_session TYPE int;
DEFINE FIELD notifications_sent ON TABLE cert_session TYPE bool \
    DEFAULT false;
DEFINE FIELD notified_count ON TABLE cert_session TYPE int DEFAULT 0;
DEFINE FIELD content_template ON TABLE cert_session \
    TYPE option<string>;
DEFINE FIELD issuer_name ON TABLE cert_session TYPE option<string>;
DEFINE FIELD created_at ON TABLE cert_session TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD certificates ON TABLE cert_session TYPE array<object> \
    DEFAULT [];
DEFINE FIELD certificates.*.certificate_number ON TABLE cert_session \
    TYPE string;
DEFINE FIELD certificates.*.recipient_name ON TABLE cert_session \
    TYPE string;
DEFINE FIELD certificates.*.recipient_email ON TABLE cert_session \
    TYPE string;
DEFINE FIELD certificates.*.course_name ON TABLE cert_session \
    TYPE option<string>;
DEFINE FIELD certificates.*.issuer_name ON TABLE cert_session \
    TYPE option<string>;
DEFINE FIELD certificates.*.notified ON TABLE cert_session TYPE bool;
DEFINE FIELD certificates.*.notify_status ON TABLE cert_session \
    TYPE string;
DEFINE FIELD certificates.*.issued_at ON TABLE cert_session \
    TYPE datetime;
DEFINE FIELD certificates.*.notified_at ON TABLE cert_session \
    TYPE option<datetime>;
DEFINE INDEX idx_cert_session_owner ON TABLE cert_session \
    COLUMNS owner_user_id;
DEFINE INDEX idx_cert_session_created ON TABLE cert_session \
    COLUMNS created_at;
";

// -----------------------------------------------------------------------
// Migration runner
// -----------------------------------------------------------------------

/// Run all pending migrations against the database.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}
