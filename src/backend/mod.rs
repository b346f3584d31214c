//! External backend collaborators: document store, user directory and
//! messaging. Services depend only on these traits; the HTTP client in
//! `appwrite` and the in-process `memory` backend implement them.

pub mod appwrite;
pub mod memory;

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::models::User;

pub use appwrite::AppwriteClient;
pub use memory::MemoryBackend;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend is not reachable at {0}")]
    Connection(String),

    #[error("Backend returned error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("Conflict with an existing record: {0}")]
    Conflict(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Request encoding error: {0}")]
    RequestEncoding(String),
}

/// Encode typed attributes as document data.
pub fn encode<T: Serialize>(value: &T) -> Result<Value, BackendError> {
    serde_json::to_value(value).map_err(|e| BackendError::RequestEncoding(e.to_string()))
}

/// Generate an id accepted by the backend for new records.
pub fn unique_id() -> String {
    Uuid::new_v4().simple().to_string()
}

static RECORD_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,35}$").unwrap());

/// Whether `id` has the shape the backend allows for document and user ids.
/// Anything else can never name a stored record.
pub fn is_valid_id(id: &str) -> bool {
    RECORD_ID.is_match(id)
}

// ═══════════════════════════════════════════════════════════
// Documents and queries
// ═══════════════════════════════════════════════════════════

/// Raw stored document: system attributes (`$id`, `$createdAt`, ...) plus
/// the collection's own attributes, all at the top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(pub Value);

impl Document {
    pub fn id(&self) -> Option<&str> {
        self.0.get("$id").and_then(Value::as_str)
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, BackendError> {
        serde_json::from_value(self.0.clone())
            .map_err(|e| BackendError::ResponseParsing(e.to_string()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentList {
    pub total: u64,
    pub documents: Vec<Document>,
}

/// List query, serialized the way the backend's REST API expects.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal(String, Vec<Value>),
    OrderDesc(String),
    Limit(u32),
    /// Resume after the document with this id, in the current ordering.
    CursorAfter(String),
}

impl Query {
    pub fn equal(attribute: &str, value: impl Into<Value>) -> Self {
        Query::Equal(attribute.to_string(), vec![value.into()])
    }

    pub fn order_desc(attribute: &str) -> Self {
        Query::OrderDesc(attribute.to_string())
    }

    pub fn cursor_after(document_id: &str) -> Self {
        Query::CursorAfter(document_id.to_string())
    }

    pub fn to_param(&self) -> String {
        let value = match self {
            Query::Equal(attribute, values) => {
                json!({ "method": "equal", "attribute": attribute, "values": values })
            }
            Query::OrderDesc(attribute) => json!({ "method": "orderDesc", "attribute": attribute }),
            Query::Limit(limit) => json!({ "method": "limit", "values": [limit] }),
            Query::CursorAfter(id) => json!({ "method": "cursorAfter", "values": [id] }),
        };
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsMessage {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub status: String,
}

// ═══════════════════════════════════════════════════════════
// Collaborator traits
// ═══════════════════════════════════════════════════════════

/// Per-collection CRUD over the hosted database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Document, BackendError>;

    /// `Ok(None)` when the document does not exist.
    async fn get_document(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<Option<Document>, BackendError>;

    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<DocumentList, BackendError>;

    /// Partial update. `Ok(None)` when the document does not exist.
    async fn update_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Option<Document>, BackendError>;
}

/// Identity records, distinct from the patient documents.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fails with `BackendError::Conflict` when email, phone or id is taken.
    async fn create_user(
        &self,
        user_id: &str,
        email: &str,
        phone: &str,
        name: &str,
    ) -> Result<User, BackendError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, BackendError>;

    async fn list_users(&self, queries: &[Query]) -> Result<Vec<User>, BackendError>;
}

#[async_trait]
pub trait Messaging: Send + Sync {
    async fn create_sms(
        &self,
        message_id: &str,
        content: &str,
        topics: &[String],
        users: &[String],
    ) -> Result<SmsMessage, BackendError>;
}
