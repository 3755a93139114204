/// File-backed store
///
/// # Layout
///
/// ```text
/// <data_dir>/
/// ├── users.json          # user registry (JSON array)
/// └── lists/
///     ├── <uuid>.json     # one document per list
///     └── ...
/// ```
///
/// Documents are pretty-printed JSON. Writes go to a temporary sibling file
/// that is renamed over the target, so readers never see a half-written
/// document. The version check and the write for a list happen under one
/// async mutex; registry updates take a second one.
///
/// Only one server process may use a data directory at a time.

use async_trait::async_trait;
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{ListRepository, StoreError, StoreResult, UserRepository};
use crate::models::todo_list::TodoList;
use crate::models::user::{CreateUser, User};

const LISTS_DIR: &str = "lists";
const USERS_FILE: &str = "users.json";

/// Store rooted at a data directory
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    list_writes: Mutex<()>,
    user_writes: Mutex<()>,
}

impl FileStore {
    /// Opens (and creates if needed) a data directory
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directories cannot be created
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(LISTS_DIR)).await?;

        info!(data_dir = %root.display(), "File store opened");

        Ok(Self {
            root,
            list_writes: Mutex::new(()),
            user_writes: Mutex::new(()),
        })
    }

    fn lists_dir(&self) -> PathBuf {
        self.root.join(LISTS_DIR)
    }

    fn list_path(&self, id: Uuid) -> PathBuf {
        self.lists_dir().join(format!("{}.json", id))
    }

    fn users_path(&self) -> PathBuf {
        self.root.join(USERS_FILE)
    }

    async fn read_users(&self) -> StoreResult<Vec<User>> {
        Ok(read_json(&self.users_path()).await?.unwrap_or_default())
    }
}

/// Reads and decodes a document, `None` if the file does not exist
async fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Writes a document through a temporary file and a rename
async fn write_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension(format!("json.tmp-{}", Uuid::new_v4()));

    fs::write(&tmp, &bytes).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    debug!(path = %path.display(), bytes = bytes.len(), "Document written");
    Ok(())
}

#[async_trait]
impl ListRepository for FileStore {
    async fn insert(&self, list: &TodoList) -> StoreResult<()> {
        let _guard = self.list_writes.lock().await;
        let path = self.list_path(list.id);

        if fs::try_exists(&path).await? {
            return Err(StoreError::AlreadyExists(list.id));
        }

        write_json(&path, list).await
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<TodoList>> {
        read_json(&self.list_path(id)).await
    }

    async fn replace(&self, list: &TodoList, expected_version: u64) -> StoreResult<()> {
        let _guard = self.list_writes.lock().await;
        let path = self.list_path(list.id);

        let current: TodoList = read_json(&path)
            .await?
            .ok_or(StoreError::NotFound(list.id))?;

        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                id: list.id,
                expected: expected_version,
                actual: current.version,
            });
        }

        write_json(&path, list).await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let _guard = self.list_writes.lock().await;

        match fs::remove_file(self.list_path(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_all(&self) -> StoreResult<Vec<TodoList>> {
        let mut entries = fs::read_dir(self.lists_dir()).await?;
        let mut lists = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            match read_json::<TodoList>(&path).await {
                Ok(Some(list)) => lists.push(list),
                // Deleted between read_dir and read
                Ok(None) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable list document");
                }
            }
        }

        Ok(lists)
    }

    async fn ping(&self) -> StoreResult<()> {
        fs::metadata(self.lists_dir()).await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for FileStore {
    async fn create(&self, data: CreateUser) -> StoreResult<User> {
        let _guard = self.user_writes.lock().await;
        let mut users = self.read_users().await?;

        if users.iter().any(|u| u.username_matches(&data.username)) {
            return Err(StoreError::UsernameTaken(data.username));
        }

        let user = User::new(data, Utc::now());
        users.push(user.clone());
        write_json(&self.users_path(), &users).await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read_users()
            .await?
            .into_iter()
            .find(|u| u.username_matches(username)))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.read_users().await?.into_iter().find(|u| u.id == id))
    }
}
