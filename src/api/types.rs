//! Shared state for the API router.

use std::sync::Arc;

use crate::appointment::AppointmentService;
use crate::backend::{DocumentStore, MemoryBackend, Messaging, UserDirectory};
use crate::config::{BackendKind, Collections};
use crate::forms::FieldRenderer;
use crate::patient::PatientService;
use crate::revalidate::PathRevalidator;

/// Shared context for all API routes. Cloning is cheap.
#[derive(Clone)]
pub struct ApiContext {
    pub appointments: Arc<AppointmentService>,
    pub patients: Arc<PatientService>,
    pub revalidator: Arc<PathRevalidator>,
    pub renderer: Arc<FieldRenderer>,
    pub backend_kind: BackendKind,
}

impl ApiContext {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        users: Arc<dyn UserDirectory>,
        messaging: Arc<dyn Messaging>,
        collections: &Collections,
        backend_kind: BackendKind,
    ) -> Self {
        let revalidator = Arc::new(PathRevalidator::new());
        let appointments = AppointmentService::new(
            store.clone(),
            messaging,
            revalidator.clone(),
            &collections.appointments,
        );
        let patients = PatientService::new(users, store, &collections.patients);

        Self {
            appointments: Arc::new(appointments),
            patients: Arc::new(patients),
            revalidator,
            renderer: Arc::new(FieldRenderer::with_registration_widgets()),
            backend_kind,
        }
    }

    /// Context where every collaborator is the given in-process backend.
    pub fn in_memory(backend: Arc<MemoryBackend>, collections: &Collections) -> Self {
        Self::new(
            backend.clone(),
            backend.clone(),
            backend,
            collections,
            BackendKind::Memory,
        )
    }
}
