//! Schema-driven forms: field rules, per-variant schemas, form state and
//! the field renderer.

pub mod render;
pub mod rules;
pub mod schema;
pub mod state;

pub use render::{FieldRenderer, RenderedField, SkeletonFn};
pub use rules::{values_from, FieldRule, FieldValue, FormValues, Pattern, ValidationErrors, ValueType};
pub use schema::{
    appointment_schema, schema_for, FieldDescriptor, FieldKind, FormSchema, FormVariant,
    SelectOption,
};
pub use state::FormState;
