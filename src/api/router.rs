//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Layers (outermost → innermost): CORS → no-store header → audit logger.

use axum::http::header::CACHE_CONTROL;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the API router over a prepared context.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/forms/:variant", get(endpoints::forms::schema))
        .route("/forms/:variant/validate", post(endpoints::forms::validate))
        .route("/users", post(endpoints::users::create))
        .route("/users/:user_id", get(endpoints::users::detail))
        .route("/patients", post(endpoints::patients::register))
        .route("/patients/:user_id", get(endpoints::patients::detail))
        .route("/doctors", get(endpoints::doctors::list))
        .route("/appointments", post(endpoints::appointments::create))
        .route(
            "/appointments/:id",
            get(endpoints::appointments::detail).patch(endpoints::appointments::update),
        )
        .route(
            "/admin/appointments",
            get(endpoints::admin::appointments),
        )
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::audit::log_access));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers(Any)
        .allow_origin(Any);

    // Dashboard counts are recomputed on every read; nothing is cacheable.
    Router::new()
        .nest("/api", routes)
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::backend::MemoryBackend;
    use crate::config::Collections;

    fn test_app() -> (Arc<MemoryBackend>, Router) {
        let backend = Arc::new(MemoryBackend::new());
        let ctx = ApiContext::in_memory(backend.clone(), &Collections::default());
        (backend, api_router(ctx))
    }

    fn make_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn appointment_body() -> Value {
        json!({
            "userId": "user-1",
            "patient": "patient-1",
            "primaryPhysician": "Dr. A",
            "schedule": "2024-01-01T10:00:00Z",
            "reason": "Persistent cough",
            "note": "Afternoons only"
        })
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (_, app) = test_app();
        let response = app
            .clone()
            .oneshot(make_request("GET", "/api/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CACHE_CONTROL).unwrap(), "no-store");

        let (_, json) = send(&app, make_request("GET", "/api/health", None)).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["backend"], "memory");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (_, app) = test_app();
        let (status, _) = send(&app, make_request("GET", "/api/nonexistent", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn appointment_lifecycle_over_http() {
        let (backend, app) = test_app();

        let (status, created) =
            send(&app, make_request("POST", "/api/appointments", Some(appointment_body()))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "pending");
        let id = created["$id"].as_str().unwrap().to_string();

        let (status, fetched) =
            send(&app, make_request("GET", &format!("/api/appointments/{id}"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["primaryPhysician"], "Dr. A");

        let (status, outcome) = send(
            &app,
            make_request(
                "PATCH",
                &format!("/api/appointments/{id}"),
                Some(json!({
                    "transition": "schedule",
                    "userId": "user-1",
                    "primaryPhysician": "Dr. A",
                    "schedule": "2024-01-01T10:00:00Z"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{outcome}");
        assert_eq!(outcome["appointment"]["status"], "scheduled");
        assert_eq!(outcome["notification"]["status"], "sent");

        let sms = backend.sent_messages();
        assert_eq!(sms.len(), 1);
        assert!(sms[0].content.contains("Jan 1, 2024, 10:00 AM"));

        let (status, dashboard) =
            send(&app, make_request("GET", "/api/admin/appointments", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dashboard["scheduledCount"], 1);
        assert_eq!(dashboard["pendingCount"], 0);
        assert_eq!(dashboard["totalCount"], 1);
        assert_eq!(dashboard["generation"], 1);
    }

    #[tokio::test]
    async fn patch_of_missing_appointment_is_404() {
        let (backend, app) = test_app();
        let (status, json) = send(
            &app,
            make_request(
                "PATCH",
                "/api/appointments/missing",
                Some(json!({ "transition": "cancel", "cancellationReason": "Patient unavailable" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(backend.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn invalid_appointment_returns_field_errors() {
        let (_, app) = test_app();
        let mut body = appointment_body();
        body["reason"] = json!("x");
        let (status, json) = send(&app, make_request("POST", "/api/appointments", Some(body))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"]["fields"]["reason"].is_string());
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (_, app) = test_app();
        let (status, json) = send(
            &app,
            make_request("POST", "/api/appointments", Some(json!({ "reason": 5 }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn store_failure_is_generic_502() {
        let (backend, app) = test_app();
        backend.set_fail_writes(true);
        let (status, json) =
            send(&app, make_request("POST", "/api/appointments", Some(appointment_body()))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"]["code"], "BACKEND_UNAVAILABLE");
    }

    #[tokio::test]
    async fn signup_twice_returns_same_user() {
        let (_, app) = test_app();
        let body = json!({ "name": "Jane Doe", "email": "jane@example.com", "phone": "+15551234567" });
        let (status, first) = send(&app, make_request("POST", "/api/users", Some(body.clone()))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, second) = send(&app, make_request("POST", "/api/users", Some(body))).await;
        assert_eq!(first["$id"], second["$id"]);

        let id = first["$id"].as_str().unwrap();
        let (status, user) = send(&app, make_request("GET", &format!("/api/users/{id}"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["email"], "jane@example.com");
    }

    #[tokio::test]
    async fn patient_registration_round() {
        let (_, app) = test_app();
        let body = json!({
            "userId": "user-1",
            "name": "Jane Doe",
            "email": "jane@example.com",
            "phone": "+15551234567",
            "birthDate": "1990-04-12T00:00:00Z",
            "gender": "Female",
            "address": "14 Main Street, Springfield",
            "occupation": "Teacher",
            "emergencyContactName": "John Doe",
            "emergencyContactNumber": "+15557654321",
            "primaryPhysician": "John Green",
            "insuranceProvider": "BlueCross",
            "insurancePolicyNumber": "ABC123456",
            "privacyConsent": true,
            "treatmentConsent": true,
            "disclosureConsent": true
        });
        let (status, patient) = send(&app, make_request("POST", "/api/patients", Some(body))).await;
        assert_eq!(status, StatusCode::CREATED, "{patient}");
        assert_eq!(patient["userId"], "user-1");

        let (status, found) = send(&app, make_request("GET", "/api/patients/user-1", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["$id"], patient["$id"]);

        let (status, _) = send(&app, make_request("GET", "/api/patients/user-2", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn form_schema_and_rendered_fields() {
        let (_, app) = test_app();
        let (status, json) =
            send(&app, make_request("GET", "/api/forms/appointment-cancel", None)).await;
        assert_eq!(status, StatusCode::OK);
        let fields = json["schema"]["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0]["name"], "cancellationReason");
        assert_eq!(json["fields"][0]["name"], "cancellationReason");

        let (status, json) =
            send(&app, make_request("GET", "/api/forms/patient-registration", None)).await;
        assert_eq!(status, StatusCode::OK);
        let rendered: Vec<&str> = json["fields"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|f| f["name"].as_str())
            .collect();
        assert!(rendered.contains(&"gender"));
        assert!(rendered.contains(&"privacyConsent"));

        let (status, _) = send(&app, make_request("GET", "/api/forms/unknown-form", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn schedule_form_prefills_from_appointment() {
        let (_, app) = test_app();
        let mut body = appointment_body();
        body["primaryPhysician"] = json!("John Green");
        let (_, created) = send(&app, make_request("POST", "/api/appointments", Some(body))).await;
        let id = created["$id"].as_str().unwrap();
        let (status, json) = send(
            &app,
            make_request("GET", &format!("/api/forms/appointment-schedule?appointmentId={id}"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let physician = json["fields"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["name"] == "primaryPhysician")
            .and_then(|f| f["html"].as_str())
            .unwrap()
            .to_string();
        assert!(physician.contains(" selected>John Green</option>"));
    }

    #[tokio::test]
    async fn validate_endpoint_reports_each_field() {
        let (_, app) = test_app();
        let (status, json) = send(
            &app,
            make_request(
                "POST",
                "/api/forms/user-signup/validate",
                Some(json!({ "name": "Jane Doe", "email": "bad", "phone": "123" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["fields"]["email"], "Invalid email address");
        assert_eq!(json["error"]["fields"]["phone"], "Invalid phone number");
        assert!(json["error"]["fields"].get("name").is_none());

        let (status, json) = send(
            &app,
            make_request(
                "POST",
                "/api/forms/user-signup/validate",
                Some(json!({ "name": "Jane Doe", "email": "jane@example.com", "phone": "+15551234567" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["valid"], true);
    }

    #[tokio::test]
    async fn doctors_are_listed() {
        let (_, app) = test_app();
        let (status, json) = send(&app, make_request("GET", "/api/doctors", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["doctors"].as_array().unwrap().len(), 9);
    }
}
