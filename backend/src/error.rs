//! Application error types and result alias.

use thiserror::Error;
use uuid::Uuid;

use crate::models::resource::Operation;

/// Application result type alias
pub type Result<T> = std::result::Result<T, AppError>;

/// Caller-visible failure kinds plus the infrastructure error channel.
///
/// Every precondition violation surfaces eagerly with its specific kind;
/// nothing is retried internally and a failed operation leaves all entities
/// unchanged. The transport layer is expected to map kinds to user-facing
/// responses.
#[derive(Error, Debug)]
pub enum AppError {
    /// Entity absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Username already taken
    #[error("username already exists: {0}")]
    DuplicateUsername(String),

    /// Group name already taken
    #[error("group name already exists: {0}")]
    DuplicateGroupName(String),

    /// A membership row already exists for the (user, group) pair
    #[error("user {0} is already a member of group {1}")]
    AlreadyMember(Uuid, Uuid),

    /// No membership row exists for the (user, group) pair
    #[error("no membership for user {0} in group {1}")]
    NotAMember(Uuid, Uuid),

    /// The resource belongs to another user
    #[error("resource {0} belongs to another user")]
    NotOwner(Uuid),

    /// The caller is not a member of the owning group
    #[error("user {0} is not a member of group {1}")]
    NotInGroup(Uuid, Uuid),

    /// The caller's role does not permit the operation
    #[error("insufficient role: {0}")]
    InsufficientRole(String),

    /// Approval requested for an operation the engine already decided
    #[error("operation {0} does not need approval")]
    ApprovalNotNeeded(Operation),

    /// The approval request is already in a terminal state
    #[error("approval {0} has already been processed")]
    AlreadyProcessed(Uuid),

    /// The resolving user is not a member of the owning group
    #[error("approver {0} is not a member of the owning group")]
    ApproverNotInGroup(Uuid),

    /// Operation string outside the recognized set
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// Conflict (e.g. duplicate pipeline name)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Validation error at a text boundary
    #[error("validation error: {0}")]
    Validation(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}
