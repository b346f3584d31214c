//! Patient identity and registration.
//!
//! Signup creates a user-directory identity; registration then writes the
//! intake document linked to it by `userId`.

use std::sync::Arc;

use crate::backend::{encode, unique_id, BackendError, DocumentStore, Query, UserDirectory};
use crate::error::CareError;
use crate::forms::{schema_for, values_from, FormVariant};
use crate::models::{CreateUser, NewPatient, Patient, User};

pub struct PatientService {
    users: Arc<dyn UserDirectory>,
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl PatientService {
    pub fn new(users: Arc<dyn UserDirectory>, store: Arc<dyn DocumentStore>, collection: &str) -> Self {
        Self {
            users,
            store,
            collection: collection.to_string(),
        }
    }

    /// Create the identity. When email or phone is already registered the
    /// existing identity with that email is returned instead.
    pub async fn create_user(&self, request: CreateUser) -> Result<User, CareError> {
        schema_for(FormVariant::UserSignup).validate(&values_from(&request))?;

        let created = self
            .users
            .create_user(&unique_id(), &request.email, &request.phone, &request.name)
            .await;

        match created {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "User created");
                Ok(user)
            }
            Err(BackendError::Conflict(detail)) => {
                tracing::info!(%detail, "Identity exists, looking up by email");
                let existing = self
                    .users
                    .list_users(&[Query::equal("email", request.email.as_str())])
                    .await
                    .inspect_err(|e| tracing::error!(error = %e, "Failed to look up user"))?;
                existing
                    .into_iter()
                    .next()
                    .ok_or(CareError::DuplicateIdentity(request.email))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create user");
                Err(e.into())
            }
        }
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, CareError> {
        self.users
            .get_user(user_id)
            .await
            .inspect_err(|e| tracing::error!(user_id, error = %e, "Failed to fetch user"))?
            .ok_or_else(|| CareError::NotFound(format!("User {user_id}")))
    }

    /// Validate the full intake form and store the patient document.
    pub async fn register_patient(&self, request: NewPatient) -> Result<Patient, CareError> {
        schema_for(FormVariant::PatientRegistration).validate(&values_from(&request.intake))?;

        let document = self
            .store
            .create_document(&self.collection, &unique_id(), encode(&request)?)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to register patient"))?;
        let patient: Patient = document.decode()?;

        tracing::info!(patient_id = %patient.id, user_id = %patient.user_id, "Patient registered");
        Ok(patient)
    }

    /// First patient document owned by `user_id`.
    pub async fn get_patient(&self, user_id: &str) -> Result<Patient, CareError> {
        let list = self
            .store
            .list_documents(&self.collection, &[Query::equal("userId", user_id)])
            .await
            .inspect_err(|e| tracing::error!(user_id, error = %e, "Failed to fetch patient"))?;
        let document = list
            .documents
            .first()
            .ok_or_else(|| CareError::NotFound(format!("Patient for user {user_id}")))?;
        Ok(document.decode()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::models::{Gender, PatientIntake};
    use chrono::{TimeZone, Utc};

    fn service() -> (Arc<MemoryBackend>, PatientService) {
        let backend = Arc::new(MemoryBackend::new());
        let service = PatientService::new(backend.clone(), backend.clone(), "patients");
        (backend, service)
    }

    fn signup() -> CreateUser {
        CreateUser {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            phone: "+15551234567".into(),
        }
    }

    fn intake() -> PatientIntake {
        PatientIntake {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            phone: "+15551234567".into(),
            birth_date: Utc.with_ymd_and_hms(1990, 4, 12, 0, 0, 0).unwrap(),
            gender: Gender::Female,
            address: "14 Main Street, Springfield".into(),
            occupation: "Teacher".into(),
            emergency_contact_name: "John Doe".into(),
            emergency_contact_number: "+15557654321".into(),
            primary_physician: "John Green".into(),
            insurance_provider: "BlueCross".into(),
            insurance_policy_number: "ABC123456".into(),
            allergies: Some("Peanuts".into()),
            current_medication: None,
            family_medical_history: None,
            past_medical_history: None,
            identification_type: Some("Passport".into()),
            identification_number: Some("X1234567".into()),
            identification_document_id: None,
            identification_document_url: None,
            privacy_consent: true,
            treatment_consent: true,
            disclosure_consent: true,
        }
    }

    #[tokio::test]
    async fn duplicate_signup_returns_same_identity() {
        let (_, service) = service();
        let first = service.create_user(signup()).await.unwrap();
        let second = service.create_user(signup()).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(service.get_user(&first.id).await.unwrap().email, "jane@example.com");
    }

    #[tokio::test]
    async fn phone_collision_without_email_match_is_duplicate_identity() {
        let (_, service) = service();
        service.create_user(signup()).await.unwrap();
        let mut other = signup();
        other.email = "someone@example.com".into();
        let err = service.create_user(other).await.unwrap_err();
        assert!(matches!(err, CareError::DuplicateIdentity(email) if email == "someone@example.com"));
    }

    #[tokio::test]
    async fn signup_validation_names_fields() {
        let (_, service) = service();
        let err = service
            .create_user(CreateUser {
                name: "J".into(),
                email: "not-an-email".into(),
                phone: "5551234".into(),
            })
            .await
            .unwrap_err();
        let CareError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.get("name").is_some());
        assert_eq!(errors.get("email"), Some("Invalid email address"));
        assert!(errors.get("phone").is_some());
    }

    #[tokio::test]
    async fn registers_and_finds_patient_by_user() {
        let (_, service) = service();
        let user = service.create_user(signup()).await.unwrap();
        let patient = service
            .register_patient(NewPatient {
                user_id: user.id.clone(),
                intake: intake(),
            })
            .await
            .unwrap();
        assert_eq!(patient.user_id, user.id);
        assert_eq!(patient.intake.gender, Gender::Female);

        let found = service.get_patient(&user.id).await.unwrap();
        assert_eq!(found.id, patient.id);
        assert!(matches!(
            service.get_patient("nobody").await.unwrap_err(),
            CareError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn registration_requires_every_consent() {
        let (backend, service) = service();
        let mut form = intake();
        form.privacy_consent = false;
        let err = service
            .register_patient(NewPatient {
                user_id: "user-1".into(),
                intake: form,
            })
            .await
            .unwrap_err();
        let CareError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors.get("privacyConsent"),
            Some("You must consent to privacy in order to proceed")
        );
        let stored = backend.list_documents("patients", &[]).await.unwrap();
        assert_eq!(stored.total, 0);
    }
}
