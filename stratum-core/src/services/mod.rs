//! Service layer - migration orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case.

mod dump;
pub mod migration;
mod scaffold;
mod schema_state;

pub use dump::{DumpResult, DumpService, SchemaDump};
pub use migration::{
    MigrationResult, MigrationService, MigrationStatus, MigrationSummary, ValidationReport,
};
pub use scaffold::ScaffoldService;
pub use schema_state::SchemaState;
