//! Result and error types for the core library

use thiserror::Error;

use super::migration::Version;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    /// A migration identifier does not look like `<version>_<description>.sql`
    #[error("Invalid migration identifier: {identifier}")]
    InvalidIdentifier { identifier: String },

    /// The bookkeeping table is missing
    #[error("Schema not bootstrapped: table '{table}' does not exist")]
    SchemaNotBootstrapped { table: String },

    /// A statement whose leading keyword is neither an exec nor a query keyword
    #[error("Cannot parse statement in {script}: {statement}")]
    UnrecognizedStatement { script: String, statement: String },

    /// The database rejected a statement while applying a migration
    #[error("Failed to apply migration {version}: {source}\nStatement: {statement}")]
    MigrationApply {
        version: Version,
        statement: String,
        #[source]
        source: duckdb::Error,
    },

    /// The database rejected a statement of the baseline schema
    #[error("Failed to load baseline {script}: {source}\nStatement: {statement}")]
    BaselineApply {
        script: String,
        statement: String,
        #[source]
        source: duckdb::Error,
    },

    /// A migration source could not produce its catalogue
    #[error("Failed to enumerate migrations from {source_name}: {message}")]
    Enumeration { source_name: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid identifier error
    pub fn invalid_identifier(identifier: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            identifier: identifier.into(),
        }
    }

    /// Create an enumeration error for the named source
    pub fn enumeration(source_name: impl Into<String>, message: impl ToString) -> Self {
        Self::Enumeration {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error means the bookkeeping table has not been created yet
    pub fn is_not_bootstrapped(&self) -> bool {
        matches!(self, Self::SchemaNotBootstrapped { .. })
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
