//! Core traits shared by the domain entities

/// Primary key type
pub type Id = i64;

/// Trait for persisted entities that have a primary key
pub trait Identifiable {
    fn id(&self) -> Id;
}

/// Base trait for all domain entities
pub trait Entity: Identifiable + Send + Sync {
    /// The database table name
    const TABLE_NAME: &'static str;

    /// Human-readable type name for error messages
    const TYPE_NAME: &'static str;
}

/// Trait for entities that belong to a project
pub trait ProjectScoped {
    fn project_id(&self) -> Option<Id>;
}
