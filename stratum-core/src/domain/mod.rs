//! Core domain entities
//!
//! Migrations, catalogues and scripts. These are plain data structures with
//! validation logic; the only I/O here is reading a migration's script and
//! running its statements on the connection it is handed.

pub mod migration;
pub mod result;
pub mod script;

pub use migration::{
    Catalogue, Migration, ScriptLocation, Version, BOOKKEEPING_TABLE, NO_VERSIONS,
};
pub use script::{Script, Statement, StatementKind, Statements};
