//! Integration tests for the migration engine
//!
//! These run every source against real DuckDB files on disk, reopening the
//! database between runs the way separate `strat` invocations would.
//!
//! Run with: cargo test --test migration_tests -- --nocapture

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use stratum_core::adapters::duckdb::open_database;
use stratum_core::adapters::{ArchiveSource, CompositeSource, DirectorySource, EmbeddedSource};
use stratum_core::config::Config;
use stratum_core::services::{MigrationService, SchemaState};
use stratum_core::{available_migrations, Error, StratumContext, Version};

// ============================================================================
// Test Helpers
// ============================================================================

/// The catalogue used throughout: an origin migration and six increments
const CATALOGUE: &[(&str, &str)] = &[
    ("10_Origin.sql", "CREATE TABLE accounts (id INTEGER PRIMARY KEY);"),
    ("1000_add_name.sql", "ALTER TABLE accounts ADD COLUMN name VARCHAR;"),
    (
        "2000_create_entries.sql",
        "CREATE TABLE entries (id INTEGER, account_id INTEGER);",
    ),
    (
        "3000_add_amount.sql",
        "ALTER TABLE entries ADD COLUMN amount BIGINT;",
    ),
    (
        "4000_seed.sql",
        "-- default account\nINSERT INTO accounts (id, name) VALUES (1, 'default');",
    ),
    (
        "5000_entries_view.sql",
        "CREATE VIEW account_totals AS\nSELECT account_id, sum(amount) AS total\nFROM entries\nGROUP BY account_id;",
    ),
    (
        "6000_index.sql",
        "CREATE INDEX entries_account ON entries (account_id);\n\nPRAGMA database_size;",
    ),
];

fn write_migrations(dir: &Path, migrations: &[(&str, &str)]) {
    fs::create_dir_all(dir).unwrap();
    for (name, sql) in migrations {
        fs::write(dir.join(name), sql).unwrap();
    }
}

fn write_archive(path: &Path, entries: &[(&str, &str)]) {
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn db_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("test.duckdb")
}

fn versions(applied: &[stratum_core::services::MigrationSummary]) -> Vec<Version> {
    applied.iter().map(|m| m.version).collect()
}

// ============================================================================
// Fresh databases
// ============================================================================

#[test]
fn test_fresh_database_applies_everything_once() {
    let temp_dir = TempDir::new().unwrap();
    let migrations_dir = temp_dir.path().join("migrations");
    write_migrations(&migrations_dir, CATALOGUE);
    let source = DirectorySource::new(&migrations_dir);

    {
        let conn = open_database(&db_path(&temp_dir)).unwrap();
        let result = MigrationService::new(&conn).apply_pending(&source).unwrap();
        assert_eq!(result.applied_count(), 7);
        assert_eq!(
            versions(&result.applied),
            vec![10, 1000, 2000, 3000, 4000, 5000, 6000]
        );
        assert!(result.bootstrapped);
    }

    // Second invocation against the same file
    let conn = open_database(&db_path(&temp_dir)).unwrap();
    let result = MigrationService::new(&conn).apply_pending(&source).unwrap();
    assert_eq!(result.applied_count(), 0);
    assert_eq!(result.origin_version, Some(10));

    let state = SchemaState::new(&conn);
    assert_eq!(state.current_version().unwrap(), Some(6000));
    assert_eq!(state.applied_versions().unwrap().len(), 7);

    let name: String = conn
        .query_row("SELECT name FROM accounts WHERE id = 1", [], |row| row.get(0))
        .unwrap();
    assert_eq!(name, "default");
}

#[test]
fn test_new_migration_is_picked_up_on_next_run() {
    let temp_dir = TempDir::new().unwrap();
    let migrations_dir = temp_dir.path().join("migrations");
    write_migrations(&migrations_dir, &CATALOGUE[..3]);
    let source = DirectorySource::new(&migrations_dir);
    let conn = open_database(&db_path(&temp_dir)).unwrap();
    let service = MigrationService::new(&conn);

    assert_eq!(service.apply_pending(&source).unwrap().applied_count(), 3);

    write_migrations(&migrations_dir, &CATALOGUE[3..]);
    let result = service.apply_pending(&source).unwrap();
    assert_eq!(versions(&result.applied), vec![3000, 4000, 5000, 6000]);
}

// ============================================================================
// Origin version
// ============================================================================

#[test]
fn test_baseline_origin_skips_older_migrations() {
    let temp_dir = TempDir::new().unwrap();
    let source = EmbeddedSource::new("app", CATALOGUE).with_baseline(
        "-- schema as of version 3000\n\
         CREATE TABLE accounts (id INTEGER PRIMARY KEY, name VARCHAR);\n\n\
         CREATE TABLE entries (id INTEGER, account_id INTEGER, amount BIGINT);\n\n\
         CREATE TABLE schema_migrations (version UBIGINT NOT NULL);\n\n\
         INSERT INTO schema_migrations (version) VALUES (3000);\n\n\
         INSERT INTO schema_migrations (version) VALUES (5000);",
    );

    let conn = open_database(&db_path(&temp_dir)).unwrap();
    let service = MigrationService::new(&conn);

    let status = service.status(&source).unwrap();
    assert!(!status.bootstrapped);
    assert_eq!(status.origin_version, Some(3000));
    assert_eq!(versions(&status.pending), vec![4000, 6000]);

    let result = service.apply_pending(&source).unwrap();
    assert!(result.bootstrapped);
    assert_eq!(result.origin_version, Some(3000));
    assert_eq!(versions(&result.applied), vec![4000, 6000]);

    // 5000 was recorded by the baseline, so the view was never created
    assert!(conn.execute_batch("SELECT * FROM account_totals").is_err());
}

#[test]
fn test_origin_is_minimum_not_insertion_order() {
    let temp_dir = TempDir::new().unwrap();
    let conn = open_database(&db_path(&temp_dir)).unwrap();
    let state = SchemaState::new(&conn);
    state.bootstrap(None).unwrap();
    for version in [100, 1000, 10] {
        state.record_version(version).unwrap();
    }

    let source = EmbeddedSource::new(
        "app",
        &[
            ("5_before_origin.sql", "CREATE TABLE never (x INTEGER);"),
            ("10_origin.sql", "CREATE TABLE also_never (x INTEGER);"),
            ("50_gap.sql", "CREATE TABLE gap (x INTEGER);"),
        ],
    );
    let result = MigrationService::new(&conn).apply_pending(&source).unwrap();
    assert_eq!(result.origin_version, Some(10));
    assert_eq!(versions(&result.applied), vec![50]);
    assert!(conn.execute_batch("SELECT * FROM never").is_err());
}

// ============================================================================
// Atomicity
// ============================================================================

#[test]
fn test_failed_run_leaves_file_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let migrations_dir = temp_dir.path().join("migrations");
    write_migrations(&migrations_dir, &CATALOGUE[..2]);
    let source = DirectorySource::new(&migrations_dir);

    {
        let conn = open_database(&db_path(&temp_dir)).unwrap();
        MigrationService::new(&conn).apply_pending(&source).unwrap();
    }

    write_migrations(
        &migrations_dir,
        &[
            ("2000_create_entries.sql", CATALOGUE[2].1),
            ("2500_broken.sql", "ALTER TABLE missing ADD COLUMN x INTEGER;"),
        ],
    );

    {
        let conn = open_database(&db_path(&temp_dir)).unwrap();
        let err = MigrationService::new(&conn).apply_pending(&source).unwrap_err();
        match err {
            Error::MigrationApply { version, statement, .. } => {
                assert_eq!(version, 2500);
                assert!(statement.contains("ALTER TABLE missing"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    let conn = open_database(&db_path(&temp_dir)).unwrap();
    let state = SchemaState::new(&conn);
    assert_eq!(state.current_version().unwrap(), Some(1000));
    assert!(conn.execute_batch("SELECT * FROM entries").is_err());
}

#[test]
fn test_commit_inside_migration_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let migrations_dir = temp_dir.path().join("migrations");
    write_migrations(
        &migrations_dir,
        &[
            ("1000_a.sql", "CREATE TABLE a (x INTEGER);\nCOMMIT;"),
            ("2000_broken.sql", "DROP TABLE missing;"),
        ],
    );
    let source = DirectorySource::new(&migrations_dir);

    {
        let conn = open_database(&db_path(&temp_dir)).unwrap();
        assert!(MigrationService::new(&conn).apply_pending(&source).is_err());
    }

    let conn = open_database(&db_path(&temp_dir)).unwrap();
    assert!(!SchemaState::new(&conn).is_bootstrapped().unwrap());
    assert!(conn.execute_batch("SELECT * FROM a").is_err());
}

#[test]
fn test_unrecognized_statement_fails_before_anything_runs() {
    let temp_dir = TempDir::new().unwrap();
    let conn = open_database(&db_path(&temp_dir)).unwrap();
    let source = EmbeddedSource::new(
        "app",
        &[(
            "1_mixed.sql",
            "CREATE TABLE first (x INTEGER);\n\nSELECT 1;",
        )],
    );

    let err = MigrationService::new(&conn).apply_pending(&source).unwrap_err();
    assert!(matches!(err, Error::UnrecognizedStatement { .. }));
    assert!(conn.execute_batch("SELECT * FROM first").is_err());
    assert!(!SchemaState::new(&conn).is_bootstrapped().unwrap());
}

// ============================================================================
// Sources
// ============================================================================

#[test]
fn test_archive_and_directory_merge() {
    let temp_dir = TempDir::new().unwrap();
    let migrations_dir = temp_dir.path().join("migrations");
    write_migrations(&migrations_dir, &CATALOGUE[..2]);

    let archive = temp_dir.path().join("plugin.zip");
    write_archive(
        &archive,
        &[
            ("migrations/1500_plugin_table.sql", "CREATE TABLE plugin (x INTEGER);"),
            ("migrations/2000_create_entries.sql", CATALOGUE[2].1),
        ],
    );

    let source = CompositeSource::new()
        .with_source(DirectorySource::new(&migrations_dir))
        .with_source(ArchiveSource::new(&archive));

    let catalogue = available_migrations(&source).unwrap();
    assert_eq!(catalogue.versions(), vec![10, 1000, 1500, 2000]);

    let conn = open_database(&db_path(&temp_dir)).unwrap();
    let result = MigrationService::new(&conn).apply_pending(&source).unwrap();
    assert_eq!(result.applied_count(), 4);
    conn.execute_batch("SELECT * FROM plugin; SELECT * FROM entries;")
        .unwrap();
}

#[test]
fn test_duplicate_version_across_sources_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let migrations_dir = temp_dir.path().join("migrations");
    write_migrations(&migrations_dir, &CATALOGUE[..2]);

    let archive = temp_dir.path().join("plugin.zip");
    write_archive(&archive, &[("migrations/1000_other.sql", "")]);

    let source = CompositeSource::new()
        .with_source(DirectorySource::new(&migrations_dir))
        .with_source(ArchiveSource::new(&archive));

    let conn = open_database(&db_path(&temp_dir)).unwrap();
    assert!(matches!(
        MigrationService::new(&conn).apply_pending(&source),
        Err(Error::Enumeration { .. })
    ));
    assert!(!SchemaState::new(&conn).is_bootstrapped().unwrap());
}

#[test]
fn test_missing_archive_is_enumeration_error() {
    let temp_dir = TempDir::new().unwrap();
    let source = ArchiveSource::new(temp_dir.path().join("absent.zip"));

    assert!(matches!(
        available_migrations(&source),
        Err(Error::Enumeration { .. })
    ));
}

// ============================================================================
// Project context
// ============================================================================

#[test]
fn test_project_round_trip_through_dump() {
    let temp_dir = TempDir::new().unwrap();
    write_migrations(&temp_dir.path().join("migrations"), CATALOGUE);

    let mut config = Config::defaults(temp_dir.path());
    config.database = temp_dir.path().join("first.duckdb");
    let ctx = StratumContext::from_config(config.clone()).unwrap();
    assert_eq!(ctx.migrate().unwrap().applied_count(), 7);

    // Squash the history into a baseline for the next database
    ctx.dump_service().dump_to_file(&config.schema_path).unwrap();
    drop(ctx);

    config.database = temp_dir.path().join("second.duckdb");
    let ctx = StratumContext::from_config(config).unwrap();
    let result = ctx.migrate().unwrap();
    assert!(result.bootstrapped);
    assert_eq!(result.origin_version, Some(10));
    assert_eq!(result.applied_count(), 0);

    ctx.conn
        .execute_batch("INSERT INTO entries VALUES (1, 1, 100); SELECT * FROM account_totals;")
        .unwrap();
}

#[test]
fn test_validate_project_source() {
    let temp_dir = TempDir::new().unwrap();
    write_migrations(&temp_dir.path().join("migrations"), CATALOGUE);
    let config = Config::defaults(temp_dir.path());

    let report = MigrationService::validate(&StratumContext::source_for(&config)).unwrap();
    assert_eq!(report.migrations, 7);
    assert_eq!(report.statements, 8);

    // Validation never creates the project database
    assert!(!config.database.exists());
}
