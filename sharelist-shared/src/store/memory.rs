/// In-memory store
///
/// Keeps lists and users in process memory behind async locks. Nothing
/// survives a restart. Used by the test suites and by `STORAGE_BACKEND=memory`.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ListRepository, StoreError, StoreResult, UserRepository};
use crate::models::todo_list::TodoList;
use crate::models::user::{CreateUser, User};

/// Lists and users held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    lists: RwLock<HashMap<Uuid, TodoList>>,
    users: RwLock<Vec<User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ListRepository for MemoryStore {
    async fn insert(&self, list: &TodoList) -> StoreResult<()> {
        let mut lists = self.lists.write().await;
        if lists.contains_key(&list.id) {
            return Err(StoreError::AlreadyExists(list.id));
        }
        lists.insert(list.id, list.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<TodoList>> {
        Ok(self.lists.read().await.get(&id).cloned())
    }

    async fn replace(&self, list: &TodoList, expected_version: u64) -> StoreResult<()> {
        let mut lists = self.lists.write().await;
        let current = lists.get_mut(&list.id).ok_or(StoreError::NotFound(list.id))?;

        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                id: list.id,
                expected: expected_version,
                actual: current.version,
            });
        }

        *current = list.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.lists.write().await.remove(&id).is_some())
    }

    async fn list_all(&self) -> StoreResult<Vec<TodoList>> {
        Ok(self.lists.read().await.values().cloned().collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, data: CreateUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username_matches(&data.username)) {
            return Err(StoreError::UsernameTaken(data.username));
        }

        let user = User::new(data, Utc::now());
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.username_matches(username))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_any_case() {
        let store = MemoryStore::new();
        store.create(new_user("Alice")).await.unwrap();

        let err = store.create(new_user("aLiCe")).await.unwrap_err();
        assert!(matches!(err, StoreError::UsernameTaken(_)));
    }

    #[tokio::test]
    async fn test_find_user() {
        let store = MemoryStore::new();
        let user = store.create(new_user("Alice")).await.unwrap();

        assert_eq!(store.find_by_username("ALICE").await.unwrap(), Some(user.clone()));
        assert_eq!(store.find_by_id(user.id).await.unwrap(), Some(user));
        assert!(store.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_checks_version() {
        let store = MemoryStore::new();
        let mut list = TodoList::new("T".into(), "a".into(), None, Utc::now());
        store.insert(&list).await.unwrap();

        list.version = 1;
        store.replace(&list, 0).await.unwrap();

        list.version = 2;
        let err = store.replace(&list, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { expected: 0, actual: 1, .. }));
    }

    #[tokio::test]
    async fn test_insert_twice_and_delete() {
        let store = MemoryStore::new();
        let list = TodoList::new("T".into(), "a".into(), None, Utc::now());

        store.insert(&list).await.unwrap();
        assert!(matches!(
            store.insert(&list).await,
            Err(StoreError::AlreadyExists(_))
        ));

        assert!(store.delete(list.id).await.unwrap());
        assert!(!store.delete(list.id).await.unwrap());
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
