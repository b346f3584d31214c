//! REST client for the hosted Appwrite backend.
//!
//! Every request carries the project id and the server API key. Listing
//! queries are passed as repeated `queries[]` parameters, each holding one
//! JSON-encoded query. Record ids travel as single, percent-encoded path
//! segments; ids the backend could never have issued are answered as
//! missing without a request.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{
    is_valid_id, BackendError, Document, DocumentList, DocumentStore, Messaging, Query, SmsMessage,
    UserDirectory,
};
use crate::config::AppwriteSettings;
use crate::models::User;

pub struct AppwriteClient {
    base: Url,
    project_id: String,
    api_key: String,
    database_id: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Deserialize)]
struct AppwriteErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct UserList {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserBody<'a> {
    user_id: &'a str,
    email: &'a str,
    phone: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSmsBody<'a> {
    message_id: &'a str,
    content: &'a str,
    topics: &'a [String],
    users: &'a [String],
}

impl AppwriteClient {
    pub fn new(settings: &AppwriteSettings, timeout_secs: u64) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| BackendError::HttpClient(e.to_string()))?;

        let base = Url::parse(&settings.endpoint)
            .map_err(|e| BackendError::HttpClient(format!("Invalid endpoint: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::HttpClient(format!(
                "Invalid endpoint: {}",
                settings.endpoint
            )));
        }

        Ok(Self {
            base,
            project_id: settings.project_id.clone(),
            api_key: settings.api_key.clone(),
            database_id: settings.database_id.clone(),
            client,
            timeout_secs,
        })
    }

    /// Endpoint URL with `segments` appended, each one percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client
            .request(method, self.url(segments))
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Key", &self.api_key)
    }

    fn documents_request(
        &self,
        method: Method,
        collection: &str,
        document_id: Option<&str>,
    ) -> RequestBuilder {
        let mut segments = vec![
            "databases",
            self.database_id.as_str(),
            "collections",
            collection,
            "documents",
        ];
        segments.extend(document_id);
        self.request(method, &segments)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        request.send().await.map_err(|e| {
            if e.is_connect() {
                BackendError::Connection(self.base.to_string())
            } else if e.is_timeout() {
                BackendError::HttpClient(format!(
                    "Request timed out after {}s",
                    self.timeout_secs
                ))
            } else {
                BackendError::HttpClient(e.to_string())
            }
        })
    }

    /// Send and decode a 2xx body; any other status is an error.
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = self.send(request).await?;
        decode(response).await
    }

    /// Like `fetch`, but a 404 yields `Ok(None)`.
    async fn fetch_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, BackendError> {
        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(response).await.map(Some)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<AppwriteErrorBody>(&text)
            .map(|b| b.message)
            .unwrap_or(text);
        if status == StatusCode::CONFLICT {
            return Err(BackendError::Conflict(message));
        }
        return Err(BackendError::Status {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| BackendError::ResponseParsing(e.to_string()))
}

fn query_params(queries: &[Query]) -> Vec<(&'static str, String)> {
    queries.iter().map(|q| ("queries[]", q.to_param())).collect()
}

#[async_trait]
impl DocumentStore for AppwriteClient {
    async fn create_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Document, BackendError> {
        let request = self
            .documents_request(Method::POST, collection, None)
            .json(&json!({ "documentId": document_id, "data": data }));
        self.fetch(request).await
    }

    async fn get_document(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<Option<Document>, BackendError> {
        if !is_valid_id(document_id) {
            return Ok(None);
        }
        let request = self.documents_request(Method::GET, collection, Some(document_id));
        self.fetch_optional(request).await
    }

    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<DocumentList, BackendError> {
        let request = self
            .documents_request(Method::GET, collection, None)
            .query(&query_params(queries));
        self.fetch(request).await
    }

    async fn update_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Option<Document>, BackendError> {
        if !is_valid_id(document_id) {
            return Ok(None);
        }
        let request = self
            .documents_request(Method::PATCH, collection, Some(document_id))
            .json(&json!({ "data": data }));
        self.fetch_optional(request).await
    }
}

#[async_trait]
impl UserDirectory for AppwriteClient {
    async fn create_user(
        &self,
        user_id: &str,
        email: &str,
        phone: &str,
        name: &str,
    ) -> Result<User, BackendError> {
        let request = self.request(Method::POST, &["users"]).json(&CreateUserBody {
            user_id,
            email,
            phone,
            name,
        });
        self.fetch(request).await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, BackendError> {
        if !is_valid_id(user_id) {
            return Ok(None);
        }
        self.fetch_optional(self.request(Method::GET, &["users", user_id]))
            .await
    }

    async fn list_users(&self, queries: &[Query]) -> Result<Vec<User>, BackendError> {
        let request = self
            .request(Method::GET, &["users"])
            .query(&query_params(queries));
        let list: UserList = self.fetch(request).await?;
        Ok(list.users)
    }
}

#[async_trait]
impl Messaging for AppwriteClient {
    async fn create_sms(
        &self,
        message_id: &str,
        content: &str,
        topics: &[String],
        users: &[String],
    ) -> Result<SmsMessage, BackendError> {
        let request = self
            .request(Method::POST, &["messaging", "messages", "sms"])
            .json(&CreateSmsBody {
                message_id,
                content,
                topics,
                users,
            });
        self.fetch(request).await
    }
}
