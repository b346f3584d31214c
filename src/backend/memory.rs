//! In-process backend: documents, users and sent messages held in memory.
//! Used when no hosted backend is configured and as the test double for
//! the services.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use super::{
    BackendError, Document, DocumentList, DocumentStore, Messaging, Query, SmsMessage,
    UserDirectory,
};
use crate::models::User;

/// SMS captured by the in-memory messaging channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SentSms {
    pub message_id: String,
    pub content: String,
    pub topics: Vec<String>,
    pub users: Vec<String>,
}

#[derive(Default)]
pub struct MemoryBackend {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    users: Mutex<Vec<User>>,
    sent: Mutex<Vec<SentSms>>,
    last_millis: Mutex<Option<i64>>,
    fail_writes: AtomicBool,
    fail_sms: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, BackendError> {
    mutex
        .lock()
        .map_err(|_| BackendError::HttpClient("memory backend lock poisoned".into()))
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every document/user write fail with a 503 status error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, AtomicOrdering::SeqCst);
    }

    /// Make every SMS send fail with a 503 status error.
    pub fn set_fail_sms(&self, fail: bool) {
        self.fail_sms.store(fail, AtomicOrdering::SeqCst);
    }

    pub fn sent_messages(&self) -> Vec<SentSms> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn check_writable(&self) -> Result<(), BackendError> {
        if self.fail_writes.load(AtomicOrdering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }

    /// Strictly increasing timestamps at the millisecond precision they are
    /// stored with, so creation order is always recoverable.
    fn next_timestamp(&self) -> Result<String, BackendError> {
        let mut last = lock(&self.last_millis)?;
        let mut millis = Utc::now().timestamp_millis();
        if let Some(prev) = *last {
            if millis <= prev {
                millis = prev + 1;
            }
        }
        let stamp = DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| BackendError::HttpClient("timestamp out of range".into()))?;
        *last = Some(millis);
        Ok(stamp.to_rfc3339_opts(SecondsFormat::Millis, false))
    }
}

fn unavailable() -> BackendError {
    BackendError::Status {
        status: 503,
        message: "backend unavailable".into(),
    }
}

fn compare_attribute(a: &Document, b: &Document, attribute: &str) -> Ordering {
    match (a.attribute(attribute), b.attribute(attribute)) {
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// Apply filters, ordering and paging. `total` counts matches before the
/// cursor and the limit.
fn apply_queries(mut documents: Vec<Document>, queries: &[Query]) -> Result<DocumentList, BackendError> {
    for query in queries {
        if let Query::Equal(attribute, values) = query {
            documents.retain(|d| d.attribute(attribute).map(|v| values.contains(v)).unwrap_or(false));
        }
    }
    for query in queries.iter().rev() {
        if let Query::OrderDesc(attribute) = query {
            documents.sort_by(|a, b| compare_attribute(b, a, attribute));
        }
    }
    let total = documents.len() as u64;
    if let Some(cursor) = queries.iter().find_map(|q| match q {
        Query::CursorAfter(id) => Some(id.as_str()),
        _ => None,
    }) {
        let position = documents
            .iter()
            .position(|d| d.id() == Some(cursor))
            .ok_or_else(|| BackendError::Status {
                status: 400,
                message: format!("Document '{cursor}' for the 'cursor' value not found"),
            })?;
        documents.drain(..=position);
    }
    if let Some(limit) = queries.iter().find_map(|q| match q {
        Query::Limit(n) => Some(*n as usize),
        _ => None,
    }) {
        documents.truncate(limit);
    }
    Ok(DocumentList { total, documents })
}

fn user_matches(user: &User, query: &Query) -> bool {
    match query {
        Query::Equal(attribute, values) => {
            let field = match attribute.as_str() {
                "$id" => &user.id,
                "email" => &user.email,
                "phone" => &user.phone,
                "name" => &user.name,
                _ => return false,
            };
            values.iter().any(|v| v.as_str() == Some(field.as_str()))
        }
        _ => true,
    }
}

#[async_trait]
impl DocumentStore for MemoryBackend {
    async fn create_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Document, BackendError> {
        self.check_writable()?;
        let Value::Object(mut body) = data else {
            return Err(BackendError::Status {
                status: 400,
                message: "document data must be an object".into(),
            });
        };
        let created_at = self.next_timestamp()?;
        let mut collections = lock(&self.collections)?;
        let documents = collections.entry(collection.to_string()).or_default();
        if documents.iter().any(|d| d.id() == Some(document_id)) {
            return Err(BackendError::Conflict(format!(
                "Document {document_id} already exists"
            )));
        }
        body.insert("$id".into(), Value::String(document_id.to_string()));
        body.insert("$collectionId".into(), Value::String(collection.to_string()));
        body.insert("$createdAt".into(), Value::String(created_at.clone()));
        body.insert("$updatedAt".into(), Value::String(created_at));
        let document = Document(Value::Object(body));
        documents.push(document.clone());
        Ok(document)
    }

    async fn get_document(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<Option<Document>, BackendError> {
        let collections = lock(&self.collections)?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id() == Some(document_id)))
            .cloned())
    }

    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<DocumentList, BackendError> {
        let documents = lock(&self.collections)?
            .get(collection)
            .cloned()
            .unwrap_or_default();
        apply_queries(documents, queries)
    }

    async fn update_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Option<Document>, BackendError> {
        self.check_writable()?;
        let updated_at = self.next_timestamp()?;
        let mut collections = lock(&self.collections)?;
        let Some(document) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id() == Some(document_id)))
        else {
            return Ok(None);
        };
        if let (Value::Object(target), Value::Object(patch)) = (&mut document.0, data) {
            for (key, value) in patch {
                target.insert(key, value);
            }
            target.insert("$updatedAt".into(), Value::String(updated_at));
        }
        Ok(Some(document.clone()))
    }
}

#[async_trait]
impl UserDirectory for MemoryBackend {
    async fn create_user(
        &self,
        user_id: &str,
        email: &str,
        phone: &str,
        name: &str,
    ) -> Result<User, BackendError> {
        self.check_writable()?;
        let mut users = lock(&self.users)?;
        if users
            .iter()
            .any(|u| u.id == user_id || u.email == email || u.phone == phone)
        {
            return Err(BackendError::Conflict(
                "A user with the same id, email, or phone already exists".into(),
            ));
        }
        let user = User {
            id: user_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, BackendError> {
        Ok(lock(&self.users)?.iter().find(|u| u.id == user_id).cloned())
    }

    async fn list_users(&self, queries: &[Query]) -> Result<Vec<User>, BackendError> {
        Ok(lock(&self.users)?
            .iter()
            .filter(|u| queries.iter().all(|q| user_matches(u, q)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Messaging for MemoryBackend {
    async fn create_sms(
        &self,
        message_id: &str,
        content: &str,
        topics: &[String],
        users: &[String],
    ) -> Result<SmsMessage, BackendError> {
        if self.fail_sms.load(AtomicOrdering::SeqCst) {
            return Err(unavailable());
        }
        lock(&self.sent)?.push(SentSms {
            message_id: message_id.to_string(),
            content: content.to_string(),
            topics: topics.to_vec(),
            users: users.to_vec(),
        });
        Ok(SmsMessage {
            id: message_id.to_string(),
            status: "sent".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn created_documents_get_system_attributes() {
        let backend = MemoryBackend::new();
        let doc = backend
            .create_document("appointments", "a1", json!({ "status": "pending" }))
            .await
            .unwrap();
        assert_eq!(doc.id(), Some("a1"));
        assert!(doc.attribute("$createdAt").is_some());

        let err = backend
            .create_document("appointments", "a1", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Conflict(_)));
    }

    #[tokio::test]
    async fn order_desc_returns_newest_first_and_counts_all() {
        let backend = MemoryBackend::new();
        for id in ["a1", "a2", "a3"] {
            backend
                .create_document("appointments", id, json!({ "status": "pending" }))
                .await
                .unwrap();
        }
        let list = backend
            .list_documents(
                "appointments",
                &[Query::order_desc("$createdAt"), Query::Limit(2)],
            )
            .await
            .unwrap();
        assert_eq!(list.total, 3);
        let ids: Vec<_> = list.documents.iter().filter_map(Document::id).collect();
        assert_eq!(ids, vec!["a3", "a2"]);
    }

    #[tokio::test]
    async fn rapid_creates_get_distinct_increasing_timestamps() {
        let backend = MemoryBackend::new();
        let mut stamps = Vec::new();
        for n in 0..200 {
            let doc = backend
                .create_document("appointments", &format!("a{n}"), json!({}))
                .await
                .unwrap();
            stamps.push(doc.attribute("$createdAt").unwrap().as_str().unwrap().to_string());
        }
        assert!(stamps.windows(2).all(|w| w[0] < w[1]), "{stamps:?}");
    }

    #[tokio::test]
    async fn cursor_after_pages_through_ordered_results() {
        let backend = MemoryBackend::new();
        for id in ["a1", "a2", "a3", "a4"] {
            backend
                .create_document("appointments", id, json!({}))
                .await
                .unwrap();
        }
        let page = backend
            .list_documents(
                "appointments",
                &[
                    Query::order_desc("$createdAt"),
                    Query::Limit(2),
                    Query::cursor_after("a3"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(page.total, 4);
        let ids: Vec<_> = page.documents.iter().filter_map(Document::id).collect();
        assert_eq!(ids, vec!["a2", "a1"]);

        let err = backend
            .list_documents("appointments", &[Query::cursor_after("missing")])
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn equal_filters_documents() {
        let backend = MemoryBackend::new();
        backend
            .create_document("patients", "p1", json!({ "userId": "u1" }))
            .await
            .unwrap();
        backend
            .create_document("patients", "p2", json!({ "userId": "u2" }))
            .await
            .unwrap();
        let list = backend
            .list_documents("patients", &[Query::equal("userId", "u2")])
            .await
            .unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.documents[0].id(), Some("p2"));
    }

    #[tokio::test]
    async fn update_merges_and_reports_missing() {
        let backend = MemoryBackend::new();
        backend
            .create_document("appointments", "a1", json!({ "status": "pending", "reason": "Flu" }))
            .await
            .unwrap();
        let doc = backend
            .update_document("appointments", "a1", json!({ "status": "scheduled" }))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.attribute("status"), Some(&json!("scheduled")));
        assert_eq!(doc.attribute("reason"), Some(&json!("Flu")));

        assert!(backend
            .update_document("appointments", "nope", json!({}))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_user_conflicts_and_is_listable() {
        let backend = MemoryBackend::new();
        backend
            .create_user("u1", "jane@example.com", "+15551234567", "Jane")
            .await
            .unwrap();
        let err = backend
            .create_user("u2", "jane@example.com", "+15559999999", "Jane")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Conflict(_)));

        let found = backend
            .list_users(&[Query::equal("email", "jane@example.com")])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "u1");
    }

    #[tokio::test]
    async fn failure_injection() {
        let backend = MemoryBackend::new();
        backend.set_fail_sms(true);
        assert!(backend.create_sms("m1", "hi", &[], &[]).await.is_err());
        assert!(backend.sent_messages().is_empty());

        backend.set_fail_writes(true);
        assert!(backend
            .create_document("appointments", "a1", json!({}))
            .await
            .is_err());
    }
}
