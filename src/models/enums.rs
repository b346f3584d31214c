use serde::{Deserialize, Serialize};

/// Macro to generate enum with the as_str pattern. The serde
/// representation matches `as_str`.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(AppointmentStatus {
    Pending => "pending",
    Scheduled => "scheduled",
    Cancelled => "cancelled",
});

str_enum!(FormType {
    Create => "create",
    Schedule => "schedule",
    Cancel => "cancel",
});

str_enum!(Gender {
    Male => "Male",
    Female => "Female",
    Other => "Other",
});

impl FormType {
    /// Status an appointment ends up in after this transition.
    pub fn resulting_status(&self) -> AppointmentStatus {
        match self {
            FormType::Schedule => AppointmentStatus::Scheduled,
            FormType::Cancel => AppointmentStatus::Cancelled,
            FormType::Create => AppointmentStatus::Pending,
        }
    }

    /// Label of the submit button for this form.
    pub fn button_label(&self) -> &'static str {
        match self {
            FormType::Create => "Create Appointment",
            FormType::Schedule => "Schedule Appointment",
            FormType::Cancel => "Cancel Appointment",
        }
    }
}
