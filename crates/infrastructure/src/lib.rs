//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_store;
mod postgres_audit_log_repository;
mod postgres_invitation_repository;
mod postgres_migration_log_repository;
mod postgres_project_repository;
mod postgres_user_directory;

pub use in_memory_store::InMemoryStore;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_invitation_repository::PostgresInvitationRepository;
pub use postgres_migration_log_repository::PostgresMigrationLogRepository;
pub use postgres_project_repository::PostgresProjectRepository;
pub use postgres_user_directory::PostgresUserDirectory;
