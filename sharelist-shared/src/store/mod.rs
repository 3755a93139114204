/// Storage layer for ShareList
///
/// Lists are stored one record per list, keyed by id. Users live in one
/// aggregate registry. Both are accessed through async traits so the API can
/// run on disk or fully in memory.
///
/// # Modules
///
/// - `file`: JSON documents under a data directory
/// - `memory`: Process-local maps, used by tests and ephemeral runs
///
/// # Concurrency
///
/// Every list carries a `version`. Writers go through [`modify_list`], which
/// loads the list, applies the change, and replaces the record only if the
/// stored version is still the one it loaded. A conflicting write is retried
/// on fresh state, so two members changing different fields of the same
/// list both land instead of one silently overwriting the other.
///
/// # Example
///
/// ```
/// use sharelist_shared::models::todo_list::TodoList;
/// use sharelist_shared::store::{modify_list, memory::MemoryStore, ListRepository, StoreError};
/// use chrono::Utc;
///
/// # async fn example() -> Result<(), StoreError> {
/// let store = MemoryStore::new();
/// let list = TodoList::new("Groceries".into(), "alice".into(), None, Utc::now());
/// store.insert(&list).await?;
///
/// let renamed = modify_list(&store, list.id, 3, |list| {
///     list.title = "Weekend groceries".into();
///     Ok::<_, StoreError>(true)
/// })
/// .await?;
/// assert_eq!(renamed.version, 1);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::models::todo_list::TodoList;
use crate::models::user::{CreateUser, User};

pub mod file;
pub mod memory;

/// Result alias for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No list with this id
    #[error("Todo list {0} not found")]
    NotFound(Uuid),

    /// The list changed between read and write
    #[error("Todo list {id} was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict { id: Uuid, expected: u64, actual: u64 },

    /// A list with this id already exists
    #[error("Todo list {0} already exists")]
    AlreadyExists(Uuid),

    /// Username is taken (compared case-insensitively)
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    /// Filesystem failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Per-list record storage
#[async_trait]
pub trait ListRepository: Send + Sync {
    /// Stores a new list
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if the id is taken
    async fn insert(&self, list: &TodoList) -> StoreResult<()>;

    /// Loads a list, `None` if unknown
    async fn get(&self, id: Uuid) -> StoreResult<Option<TodoList>>;

    /// Replaces a list if its stored version equals `expected_version`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the list was deleted meanwhile
    /// - `VersionConflict` if another write got there first
    async fn replace(&self, list: &TodoList, expected_version: u64) -> StoreResult<()>;

    /// Deletes a list; returns false if it did not exist
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Loads every list
    async fn list_all(&self) -> StoreResult<Vec<TodoList>>;

    /// Cheap availability check for health reporting
    async fn ping(&self) -> StoreResult<()>;
}

/// User registry
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Registers a user
    ///
    /// # Errors
    ///
    /// `UsernameTaken` if the username exists in any casing
    async fn create(&self, data: CreateUser) -> StoreResult<User>;

    /// Case-insensitive lookup
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
}

/// Read-modify-write cycle for one list
///
/// `apply` receives the freshly loaded list. It performs authorization and
/// the field change, and returns whether anything changed. Unchanged lists
/// are returned as loaded, without a write. Changed lists get `updatedAt`
/// refreshed and `version` bumped, then are written back if nobody else
/// wrote in between; otherwise the whole cycle runs again on the new state,
/// up to `max_attempts` times.
///
/// # Errors
///
/// - `NotFound` if the list does not exist (or vanished mid-cycle)
/// - `VersionConflict` after `max_attempts` lost races
/// - whatever `apply` returns
pub async fn modify_list<E, F>(
    repo: &dyn ListRepository,
    id: Uuid,
    max_attempts: u32,
    mut apply: F,
) -> Result<TodoList, E>
where
    F: FnMut(&mut TodoList) -> Result<bool, E> + Send,
    E: From<StoreError>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let mut list = repo.get(id).await?.ok_or(StoreError::NotFound(id))?;

        if !apply(&mut list)? {
            return Ok(list);
        }

        let expected = list.version;
        list.touch(Utc::now());
        list.version = expected + 1;

        match repo.replace(&list, expected).await {
            Ok(()) => return Ok(list),
            Err(StoreError::VersionConflict { actual, .. }) if attempt < max_attempts => {
                warn!(
                    list_id = %id,
                    expected,
                    actual,
                    attempt,
                    "Concurrent write detected, retrying on fresh state"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
}
