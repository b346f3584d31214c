//! Field Renderer: one rendering strategy per `FieldKind`.
//!
//! Output is an HTML fragment bound to the current `FormState` value.
//! Each field item is `label → widget → error`, except checkboxes which
//! carry their own label next to the box.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::rules::FieldValue;
use super::schema::{FieldDescriptor, FieldKind};
use super::state::FormState;
use crate::models::Gender;

/// Custom render function for `FieldKind::Skeleton` fields.
pub type SkeletonFn = Arc<dyn Fn(&FieldDescriptor, &FieldValue) -> String + Send + Sync>;

const CALENDAR_ICON: &str = "/assets/icons/calendar.svg";

#[derive(Clone, Default)]
pub struct FieldRenderer {
    skeletons: HashMap<String, SkeletonFn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedField {
    pub name: String,
    pub html: String,
}

impl FieldRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer with the composite widgets used by the registration form.
    pub fn with_registration_widgets() -> Self {
        Self::new()
            .with_skeleton("gender", Arc::new(render_gender_radio_group))
            .with_skeleton("identificationDocumentId", Arc::new(render_file_uploader))
    }

    pub fn with_skeleton(mut self, field_name: &str, render: SkeletonFn) -> Self {
        self.skeletons.insert(field_name.to_string(), render);
        self
    }

    /// Render one field item. `None` for unknown kinds and for skeleton
    /// fields without a registered render function.
    pub fn render(&self, field: &FieldDescriptor, state: &FormState) -> Option<String> {
        let value = state.value(&field.name);
        let widget = self.render_widget(field, value)?;

        let mut html = String::from("<div class=\"form-item flex-1\">");
        if field.kind != FieldKind::Checkbox && !field.label.is_empty() {
            html.push_str(&format!(
                "<label class=\"shad-label\" for=\"{}\">{}</label>",
                escape(&field.name),
                escape(&field.label)
            ));
        }
        html.push_str(&widget);
        if let Some(error) = state.error(&field.name) {
            html.push_str(&format!("<p class=\"shad-error\">{}</p>", escape(error)));
        }
        html.push_str("</div>");
        Some(html)
    }

    /// Render every field of the state's schema, skipping those that render nothing.
    pub fn render_form(&self, state: &FormState) -> Vec<RenderedField> {
        state
            .schema()
            .fields
            .iter()
            .filter_map(|field| {
                self.render(field, state).map(|html| RenderedField {
                    name: field.name.clone(),
                    html,
                })
            })
            .collect()
    }

    fn render_widget(&self, field: &FieldDescriptor, value: &FieldValue) -> Option<String> {
        match field.kind {
            FieldKind::Input => Some(render_input(field, value)),
            FieldKind::TextArea => Some(render_textarea(field, value)),
            FieldKind::PhoneInput => Some(render_phone(field, value)),
            FieldKind::DatePicker => Some(render_date_picker(field, value)),
            FieldKind::Select => Some(render_select(field, value)),
            FieldKind::Checkbox => Some(render_checkbox(field, value)),
            FieldKind::Skeleton => self.skeletons.get(&field.name).map(|f| f(field, value)),
            FieldKind::Unknown => None,
        }
    }
}

fn text_of(value: &FieldValue) -> &str {
    value.as_text().unwrap_or("")
}

fn placeholder_attr(field: &FieldDescriptor) -> String {
    field
        .placeholder
        .as_deref()
        .map(|p| format!(" placeholder=\"{}\"", escape(p)))
        .unwrap_or_default()
}

fn render_input(field: &FieldDescriptor, value: &FieldValue) -> String {
    let icon = field
        .icon
        .as_deref()
        .map(|src| {
            format!(
                "<img src=\"{}\" alt=\"{}\" width=\"24\" height=\"24\" class=\"ml-2\">",
                escape(src),
                escape(&field.name)
            )
        })
        .unwrap_or_default();
    format!(
        "<div class=\"flex rounded-md border border-dark-500 bg-dark-400\">{icon}\
         <input id=\"{name}\" name=\"{name}\" value=\"{value}\"{placeholder} class=\"shad-input border-0\"></div>",
        name = escape(&field.name),
        value = escape(text_of(value)),
        placeholder = placeholder_attr(field),
    )
}

fn render_textarea(field: &FieldDescriptor, value: &FieldValue) -> String {
    format!(
        "<textarea id=\"{name}\" name=\"{name}\"{placeholder} class=\"shad-textArea\">{value}</textarea>",
        name = escape(&field.name),
        placeholder = placeholder_attr(field),
        value = escape(text_of(value)),
    )
}

fn render_phone(field: &FieldDescriptor, value: &FieldValue) -> String {
    format!(
        "<input type=\"tel\" id=\"{name}\" name=\"{name}\" value=\"{value}\"{placeholder} \
         data-default-country=\"US\" class=\"input-phone\">",
        name = escape(&field.name),
        value = escape(text_of(value)),
        placeholder = placeholder_attr(field),
    )
}

fn render_date_picker(field: &FieldDescriptor, value: &FieldValue) -> String {
    let input_type = if field.show_time_select { "datetime-local" } else { "date" };
    let shown = match value.as_datetime() {
        Some(dt) if field.show_time_select => dt.format("%Y-%m-%dT%H:%M").to_string(),
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => String::new(),
    };
    format!(
        "<div class=\"flex rounded-md border border-dark-500 bg-dark-400\">\
         <img src=\"{CALENDAR_ICON}\" alt=\"calendar\" width=\"24\" height=\"24\" class=\"ml-2\">\
         <input type=\"{input_type}\" id=\"{name}\" name=\"{name}\" value=\"{shown}\"{placeholder} \
         data-date-format=\"{format}\" class=\"date-picker\"></div>",
        name = escape(&field.name),
        placeholder = placeholder_attr(field),
        format = escape(field.date_format.as_deref().unwrap_or("MM/dd/yyyy")),
    )
}

fn render_select(field: &FieldDescriptor, value: &FieldValue) -> String {
    let current = text_of(value);
    let mut html = format!(
        "<select id=\"{name}\" name=\"{name}\" class=\"shad-select-trigger\">",
        name = escape(&field.name)
    );
    html.push_str(&format!(
        "<option value=\"\" disabled{}>{}</option>",
        if current.is_empty() { " selected" } else { "" },
        escape(field.placeholder.as_deref().unwrap_or(""))
    ));
    for option in &field.options {
        let image = option
            .image
            .as_deref()
            .map(|src| format!(" data-image=\"{}\"", escape(src)))
            .unwrap_or_default();
        html.push_str(&format!(
            "<option value=\"{}\"{}{}>{}</option>",
            escape(&option.value),
            image,
            if option.value == current { " selected" } else { "" },
            escape(&option.label)
        ));
    }
    html.push_str("</select>");
    html
}

fn render_checkbox(field: &FieldDescriptor, value: &FieldValue) -> String {
    let checked = value.as_bool().unwrap_or(false);
    format!(
        "<div class=\"flex items-center gap-4\">\
         <input type=\"checkbox\" id=\"{name}\" name=\"{name}\"{checked}{class}>\
         <label for=\"{name}\" class=\"checkbox-label\">{label}</label></div>",
        name = escape(&field.name),
        checked = if checked { " checked" } else { "" },
        class = if checked { " class=\"bg-green-500\"" } else { "" },
        label = escape(&field.label),
    )
}

fn render_gender_radio_group(field: &FieldDescriptor, value: &FieldValue) -> String {
    let current = text_of(value);
    let mut html = String::from("<div class=\"flex h-11 gap-6 xl:justify-between\">");
    for gender in [Gender::Male, Gender::Female, Gender::Other] {
        let option = gender.as_str();
        html.push_str(&format!(
            "<div class=\"radio-group\"><input type=\"radio\" id=\"{option}\" name=\"{name}\" value=\"{option}\"{checked}>\
             <label for=\"{option}\" class=\"cursor-pointer\">{option}</label></div>",
            name = escape(&field.name),
            checked = if current == option { " checked" } else { "" },
        ));
    }
    html.push_str("</div>");
    html
}

fn render_file_uploader(field: &FieldDescriptor, value: &FieldValue) -> String {
    let uploaded = match text_of(value) {
        "" => String::new(),
        id => format!("<p class=\"file-upload_label\">{}</p>", escape(id)),
    };
    format!(
        "<div class=\"file-upload\"><input type=\"file\" id=\"{name}\" name=\"{name}\">{uploaded}\
         <p><span class=\"text-green-500\">Click to upload </span>or drag and drop</p>\
         <p class=\"text-12-regular\">SVG, PNG, JPG or GIF (max. 800x400px)</p></div>",
        name = escape(&field.name),
    )
}

/// Minimal HTML escaping for text and attribute values.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::rules::FieldRule;
    use crate::forms::schema::{appointment_schema, schema_for, FormVariant};
    use crate::models::FormType;

    fn state(variant: FormVariant) -> FormState {
        FormState::new(schema_for(variant))
    }

    #[test]
    fn input_binds_current_value_and_label() {
        let mut st = state(FormVariant::UserSignup);
        st.on_change("name", FieldValue::text("Jane <Doe>"));
        let field = st.schema().field("name").unwrap().clone();
        let html = FieldRenderer::new().render(&field, &st).unwrap();
        assert!(html.contains("<label class=\"shad-label\" for=\"name\">Full Name</label>"));
        assert!(html.contains("value=\"Jane &lt;Doe&gt;\""));
        assert!(html.contains("/assets/icons/user.svg"));
    }

    #[test]
    fn checkbox_carries_its_own_label() {
        let st = state(FormVariant::PatientRegistration);
        let field = st.schema().field("privacyConsent").unwrap().clone();
        let html = FieldRenderer::new().render(&field, &st).unwrap();
        assert!(!html.contains("shad-label"));
        assert!(html.contains("class=\"checkbox-label\""));
        assert!(!html.contains(" checked"));
    }

    #[test]
    fn error_is_rendered_below_widget() {
        let mut st = state(FormVariant::UserSignup);
        st.on_change("phone", FieldValue::text("123"));
        let field = st.schema().field("phone").unwrap().clone();
        let html = FieldRenderer::new().render(&field, &st).unwrap();
        let widget_at = html.find("type=\"tel\"").unwrap();
        let error_at = html.find("Invalid phone number").unwrap();
        assert!(error_at > widget_at);
    }

    #[test]
    fn select_marks_current_option() {
        let mut st = FormState::new(appointment_schema(FormType::Schedule));
        st.on_change("primaryPhysician", FieldValue::text("Leila Cameron"));
        let field = st.schema().field("primaryPhysician").unwrap().clone();
        let html = FieldRenderer::new().render(&field, &st).unwrap();
        assert!(html.contains("<option value=\"Leila Cameron\" data-image=\"/assets/images/dr-cameron.png\" selected>"));
        assert!(html.contains("<option value=\"\" disabled>Select a doctor</option>"));
    }

    #[test]
    fn textarea_is_always_editable() {
        let mut st = FormState::new(appointment_schema(FormType::Cancel));
        st.on_change("cancellationReason", FieldValue::text("Away & sick"));
        let field = st.schema().field("cancellationReason").unwrap().clone();
        let html = FieldRenderer::new().render(&field, &st).unwrap();
        assert!(html.contains(
            "placeholder=\"Enter reason for cancellation\" class=\"shad-textArea\">Away &amp; sick</textarea>"
        ));
        assert!(!html.contains("disabled"));
    }

    #[test]
    fn date_picker_with_time_uses_datetime_local() {
        let mut st = FormState::new(appointment_schema(FormType::Create));
        st.on_change("schedule", FieldValue::text("2024-01-01T10:00:00Z"));
        let field = st.schema().field("schedule").unwrap().clone();
        let html = FieldRenderer::new().render(&field, &st).unwrap();
        assert!(html.contains("type=\"datetime-local\""));
        assert!(html.contains("value=\"2024-01-01T10:00\""));
    }

    #[test]
    fn skeleton_without_renderer_renders_nothing() {
        let st = state(FormVariant::PatientRegistration);
        let field = st.schema().field("gender").unwrap().clone();
        assert!(FieldRenderer::new().render(&field, &st).is_none());
    }

    #[test]
    fn skeleton_delegates_to_registered_renderer() {
        let mut st = state(FormVariant::PatientRegistration);
        st.on_change("gender", FieldValue::text("Female"));
        let field = st.schema().field("gender").unwrap().clone();
        let html = FieldRenderer::with_registration_widgets()
            .render(&field, &st)
            .unwrap();
        assert!(html.contains("value=\"Female\" checked"));
        assert!(!html.contains("value=\"Male\" checked"));
    }

    #[test]
    fn unknown_kind_renders_nothing() {
        let st = state(FormVariant::UserSignup);
        let field = FieldDescriptor::new(FieldKind::Unknown, "slider", "Slider", FieldRule::text());
        assert!(FieldRenderer::new().render(&field, &st).is_none());
    }

    #[test]
    fn render_form_skips_fields_that_render_nothing() {
        let st = state(FormVariant::PatientRegistration);
        let plain = FieldRenderer::new().render_form(&st);
        let full = FieldRenderer::with_registration_widgets().render_form(&st);
        assert_eq!(full.len(), st.schema().fields.len());
        assert_eq!(plain.len(), full.len() - 2);
    }
}
