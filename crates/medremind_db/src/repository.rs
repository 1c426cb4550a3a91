//! Repository factory trait
//!
//! Repositories are built from a database client through a factory so callers
//! never depend on a concrete backend.

/// A trait for database repository factories
///
/// Generic over the repository type and the configuration (usually a
/// [`DbClient`](crate::DbClient)) it is built from.
pub trait RepositoryFactory<R, C> {
    /// Create a new repository instance
    fn create_repository(&self, config: C) -> R;
}
