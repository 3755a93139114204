//! Typed HTTP client for the ShareList API

use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use sharelist_shared::auth::identity::{Identity, IDENTITY_HEADER};
use sharelist_shared::models::{
    task::TaskPatch,
    todo_list::{JoinResponse, ListOverview, MemberRoster, TodoList},
    user::UserProfile,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::identity::IdentityStore;

/// Health report of a server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub storage: String,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

/// How a request carries the identity header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdentityMode {
    /// No header
    Anonymous,
    /// Stored identity if there is one, otherwise no header
    IfStored,
    /// Stored identity, minting a guest identity if none is stored
    Required,
}

/// Client state layer
///
/// Remembers the caller's identity in an [`IdentityStore`] and sends it on
/// every request that needs one.
///
/// # Example
///
/// ```no_run
/// use sharelist_client::{MemoryIdentityStore, ShareListClient};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), sharelist_client::ClientError> {
/// let client = ShareListClient::new("http://localhost:3001", Arc::new(MemoryIdentityStore::new()));
/// client.login("alice", "secret1").await?;
/// let list = client.create_list(Some("Groceries")).await?;
/// client.add_tasks(list.id, &["Milk", "Eggs"], None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ShareListClient {
    http: reqwest::Client,
    base_url: String,
    identity: Arc<dyn IdentityStore>,
}

impl ShareListClient {
    /// Client for the server at `base_url` (scheme, host and port)
    pub fn new(base_url: impl Into<String>, identity: Arc<dyn IdentityStore>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url, identity)
    }

    /// Same as [`ShareListClient::new`] with a preconfigured reqwest client
    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        identity: Arc<dyn IdentityStore>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            identity,
        }
    }

    /// The identity currently stored, if any
    pub fn current_identity(&self) -> ClientResult<Option<String>> {
        Ok(self.identity.load()?)
    }

    /// Forgets the stored identity
    pub fn logout(&self) -> ClientResult<()> {
        self.identity.clear()?;
        info!("Stored identity cleared");
        Ok(())
    }

    // Accounts

    /// Registers an account and stores its id as the identity
    pub async fn register(&self, username: &str, password: &str) -> ClientResult<UserProfile> {
        let body = json!({ "username": username, "password": password });
        let profile: UserProfile = self
            .call(Method::POST, "/api/auth/register", Some(&body), IdentityMode::Anonymous)
            .await?;

        self.identity.save(&profile.id.to_string())?;
        Ok(profile)
    }

    /// Logs in and stores the account id as the identity
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<UserProfile> {
        let body = json!({ "username": username, "password": password });
        let profile: UserProfile = self
            .call(Method::POST, "/api/auth/login", Some(&body), IdentityMode::Anonymous)
            .await?;

        self.identity.save(&profile.id.to_string())?;
        Ok(profile)
    }

    // Lists

    /// Lists the caller created and lists shared with them
    pub async fn list_overview(&self) -> ClientResult<ListOverview> {
        self.call(Method::GET, "/api/todos", None, IdentityMode::Required)
            .await
    }

    pub async fn create_list(&self, title: Option<&str>) -> ClientResult<TodoList> {
        let body = json!({ "title": title });
        self.call(Method::POST, "/api/todos", Some(&body), IdentityMode::Required)
            .await
    }

    /// Reads a list
    ///
    /// Asks anonymously first, like anyone opening a share link, and only
    /// retries with the identity if the server refuses.
    pub async fn get_list(&self, id: Uuid) -> ClientResult<TodoList> {
        let path = format!("/api/todos/{}", id);

        match self.call(Method::GET, &path, None, IdentityMode::Anonymous).await {
            Err(e) if e.is_forbidden() || e.is_identity_required() => {
                debug!(list_id = %id, "Anonymous read refused, retrying with identity");
                self.call(Method::GET, &path, None, IdentityMode::Required).await
            }
            other => other,
        }
    }

    /// Renames a list (creator only)
    pub async fn rename_list(&self, id: Uuid, title: &str) -> ClientResult<TodoList> {
        let body = json!({ "title": title });
        self.call(
            Method::PUT,
            &format!("/api/todos/{}", id),
            Some(&body),
            IdentityMode::Required,
        )
        .await
    }

    /// Deletes a list (creator only), returning the server's confirmation
    pub async fn delete_list(&self, id: Uuid) -> ClientResult<String> {
        let body: MessageBody = self
            .call(
                Method::DELETE,
                &format!("/api/todos/{}", id),
                None,
                IdentityMode::Required,
            )
            .await?;
        Ok(body.message)
    }

    // Membership

    /// Joins a list
    ///
    /// Without a stored identity the server mints a guest identity, which
    /// is stored for later requests.
    pub async fn join_list(&self, id: Uuid, username: Option<&str>) -> ClientResult<JoinResponse> {
        let body = json!({ "username": username });
        let response: JoinResponse = self
            .call(
                Method::POST,
                &format!("/api/todos/{}/users", id),
                Some(&body),
                IdentityMode::IfStored,
            )
            .await?;

        if let Some(generated) = &response.generated_user_id {
            self.identity.save(generated)?;
            info!(list_id = %id, "Stored guest identity issued by the server");
        }

        Ok(response)
    }

    pub async fn members(&self, id: Uuid) -> ClientResult<MemberRoster> {
        self.call(
            Method::GET,
            &format!("/api/todos/{}/users", id),
            None,
            IdentityMode::Required,
        )
        .await
    }

    // Tasks

    /// Adds one task per non-empty line
    pub async fn add_tasks<S: AsRef<str>>(
        &self,
        id: Uuid,
        tasks: &[S],
        username: Option<&str>,
    ) -> ClientResult<TodoList> {
        let tasks: Vec<&str> = tasks.iter().map(AsRef::as_ref).collect();
        let body = json!({ "tasks": tasks, "username": username });

        self.call(
            Method::POST,
            &format!("/api/todos/{}/tasks", id),
            Some(&body),
            IdentityMode::Required,
        )
        .await
    }

    /// Applies the fields present in `patch` to one task
    pub async fn update_task(
        &self,
        id: Uuid,
        task_id: Uuid,
        patch: &TaskPatch,
        username: Option<&str>,
    ) -> ClientResult<TodoList> {
        let body = update_task_body(patch, username)?;

        self.call(
            Method::PUT,
            &format!("/api/todos/{}/tasks/{}", id, task_id),
            Some(&body),
            IdentityMode::Required,
        )
        .await
    }

    pub async fn delete_task(&self, id: Uuid, task_id: Uuid) -> ClientResult<TodoList> {
        self.call(
            Method::DELETE,
            &format!("/api/todos/{}/tasks/{}", id, task_id),
            None,
            IdentityMode::Required,
        )
        .await
    }

    pub async fn health(&self) -> ClientResult<HealthStatus> {
        self.call(Method::GET, "/health", None, IdentityMode::Anonymous)
            .await
    }

    // Plumbing

    /// Stored identity, or a freshly minted and stored guest identity
    fn ensure_identity(&self) -> ClientResult<String> {
        if let Some(identity) = self.identity.load()? {
            return Ok(identity);
        }
        self.regenerate_identity()
    }

    fn regenerate_identity(&self) -> ClientResult<String> {
        let identity = Identity::generate_guest().into_inner();
        self.identity.save(&identity)?;
        debug!(identity = %identity, "Minted guest identity");
        Ok(identity)
    }

    /// Sends a request and decodes the response
    ///
    /// An identity-bearing request that the server rejects for lacking an
    /// identity is retried exactly once with a new guest identity.
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        mode: IdentityMode,
    ) -> ClientResult<T> {
        let identity = match mode {
            IdentityMode::Anonymous => None,
            IdentityMode::IfStored => self.identity.load()?,
            IdentityMode::Required => Some(self.ensure_identity()?),
        };

        let result = self
            .send(method.clone(), path, body, identity.as_deref())
            .await;

        match result {
            Err(e) if identity.is_some() && e.is_identity_required() => {
                let fresh = self.regenerate_identity()?;
                self.send(method, path, body, Some(&fresh)).await
            }
            other => other,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        identity: Option<&str>,
    ) -> ClientResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut request: RequestBuilder = self.http.request(method.clone(), &url);

        if let Some(identity) = identity {
            request = request.header(IDENTITY_HEADER, identity);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(%method, %url, status = status.as_u16(), "Request completed");

        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::from_response(status, &text))
        }
    }
}

/// JSON body of a task update: the patch fields plus the optional username
fn update_task_body(patch: &TaskPatch, username: Option<&str>) -> ClientResult<Value> {
    let mut body = serde_json::to_value(patch)?;
    if let (Some(username), Some(fields)) = (username, body.as_object_mut()) {
        fields.insert("username".to_string(), Value::from(username));
    }
    Ok(body)
}

impl std::fmt::Debug for ShareListClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareListClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
