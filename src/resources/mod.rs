//! Idempotent filesystem resources (check + apply pattern).
pub mod fs;
pub mod link;

use crate::error::FsError;

/// State of a managed symlink.
///
/// # Examples
///
/// ```
/// use dotman::resources::ResourceState;
///
/// let missing = ResourceState::Missing;
/// let wrong = ResourceState::Incorrect { current: "/other/path".into() };
///
/// assert_ne!(missing, ResourceState::Correct);
/// assert_ne!(wrong, ResourceState::Occupied);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Nothing exists at the location.
    Missing,
    /// The resource matches the desired state.
    Correct,
    /// A symlink whose target no longer exists.
    Stale {
        /// Where the link points.
        current: String,
    },
    /// A symlink that resolves to something other than the desired target.
    Incorrect {
        /// Where the link points.
        current: String,
    },
    /// A real file or directory is in the way.
    Occupied,
    /// The resource cannot be applied at all.
    Invalid {
        /// Why the resource cannot be applied.
        reason: String,
    },
}

/// Result of applying a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// The resource was created or updated.
    Applied,
    /// The resource was already correct.
    AlreadyCorrect,
    /// The resource was left alone.
    Skipped {
        /// Why it was skipped.
        reason: String,
    },
}

/// Interface for resources that can be checked, applied and removed.
///
/// ```ignore
/// let state = resource.current_state()?;
/// if resource.needs_change()? {
///     resource.apply()?;
/// }
/// ```
pub trait Resource {
    /// Human-readable description.
    fn description(&self) -> String;

    /// Inspect the current state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be determined.
    fn current_state(&self) -> Result<ResourceState, FsError>;

    /// Bring the resource into the desired state where that is safe.
    ///
    /// # Errors
    ///
    /// Returns an error if a filesystem operation fails.
    fn apply(&self) -> Result<ResourceChange, FsError>;

    /// Undo a previous `apply()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be removed.
    fn remove(&self) -> Result<ResourceChange, FsError>;

    /// Whether [`apply`](Self::apply) would change anything.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`current_state`](Self::current_state).
    fn needs_change(&self) -> Result<bool, FsError> {
        Ok(matches!(
            self.current_state()?,
            ResourceState::Missing | ResourceState::Stale { .. } | ResourceState::Incorrect { .. }
        ))
    }
}
