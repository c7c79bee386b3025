//! Contact/lead request types.

use crate::error::CommerceError;
use crate::ids::ContactRequestId;
use crate::time::current_timestamp;
use crate::validation::{is_valid_email, is_valid_phone, optional, required, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Processing status of a contact request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactStatus {
    /// Just submitted.
    #[default]
    New,
    /// A manager is handling it.
    InProgress,
    /// Handled.
    Completed,
    /// Dropped (spam, duplicate, customer withdrew).
    Cancelled,
}

impl ContactStatus {
    pub const ALL: [ContactStatus; 4] = [
        ContactStatus::New,
        ContactStatus::InProgress,
        ContactStatus::Completed,
        ContactStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::New => "NEW",
            ContactStatus::InProgress => "IN_PROGRESS",
            ContactStatus::Completed => "COMPLETED",
            ContactStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ContactStatus::New => "New",
            ContactStatus::InProgress => "In progress",
            ContactStatus::Completed => "Completed",
            ContactStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ContactStatus::Completed | ContactStatus::Cancelled)
    }

    pub fn can_transition_to(&self, to: ContactStatus) -> bool {
        match self {
            ContactStatus::New => to != ContactStatus::New,
            ContactStatus::InProgress => to.is_terminal(),
            ContactStatus::Completed | ContactStatus::Cancelled => false,
        }
    }

    pub fn validate_transition(&self, to: ContactStatus) -> Result<(), CommerceError> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(CommerceError::InvalidTransition {
                from: self.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactStatus {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        ContactStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                CommerceError::invalid("status", format!("Unknown contact status: {}", s))
            })
    }
}

/// A stored contact request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactRequest {
    pub id: ContactRequestId,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub company: Option<String>,
    /// Equipment the customer asks about.
    pub equipment: Option<String>,
    pub message: String,
    pub status: ContactStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields submitted through the contact form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub phone: String,
    pub message: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub equipment: Option<String>,
}

impl ContactForm {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_equipment(mut self, equipment: impl Into<String>) -> Self {
        self.equipment = Some(equipment.into());
        self
    }

    /// Validate and turn the form into a new request with status `NEW`.
    pub fn into_request(self) -> Result<ContactRequest, CommerceError> {
        let mut errors = ValidationErrors::new();

        let name = required(&self.name);
        let phone = required(&self.phone);
        let message = required(&self.message);
        let email = optional(self.email.as_deref());

        if name.is_empty() {
            errors.add("name", "Name is required");
        }
        if phone.is_empty() {
            errors.add("phone", "Phone is required");
        } else if !is_valid_phone(&phone) {
            errors.add("phone", "Invalid phone number");
        }
        if message.is_empty() {
            errors.add("message", "Message is required");
        }
        if let Some(email) = &email {
            if !is_valid_email(email) {
                errors.add("email", "Invalid email address");
            }
        }
        errors.into_result()?;

        let now = current_timestamp();
        Ok(ContactRequest {
            id: ContactRequestId::generate(),
            name,
            phone,
            email,
            company: optional(self.company.as_deref()),
            equipment: optional(self.equipment.as_deref()),
            message,
            status: ContactStatus::New,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Acknowledgement returned to the submitter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactReceipt {
    pub id: ContactRequestId,
}
