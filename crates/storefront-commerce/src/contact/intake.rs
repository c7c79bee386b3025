//! Contact request intake and processing.

use crate::config::ContactConfig;
use crate::contact::{ContactForm, ContactReceipt, ContactRequest, ContactStatus};
use crate::error::CommerceError;
use crate::ids::ContactRequestId;
use crate::storage::Store;
use crate::time::current_timestamp;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct ContactIntake {
    store: Arc<dyn Store>,
    config: ContactConfig,
}

impl ContactIntake {
    pub fn new(store: Arc<dyn Store>, config: ContactConfig) -> Self {
        Self { store, config }
    }

    /// Validate and store a submitted form with status `NEW`.
    #[instrument(skip(self, form))]
    pub async fn submit(&self, form: ContactForm) -> Result<ContactReceipt, CommerceError> {
        let request = form.into_request().inspect_err(|err| {
            warn!(error = %err, "contact request rejected");
        })?;
        self.store.insert_contact_request(&request).await?;
        info!(id = %request.id, "contact request received");
        Ok(ContactReceipt { id: request.id })
    }

    pub async fn get(&self, id: &ContactRequestId) -> Result<ContactRequest, CommerceError> {
        self.store
            .get_contact_request(id)
            .await?
            .ok_or_else(|| CommerceError::not_found("ContactRequest", id))
    }

    /// Most recent first; `None` uses the configured default.
    pub async fn list(&self, limit: Option<i64>) -> Result<Vec<ContactRequest>, CommerceError> {
        let limit = limit.unwrap_or(self.config.list_limit).max(1);
        self.store.list_contact_requests(limit).await
    }

    pub async fn set_status(
        &self,
        id: &ContactRequestId,
        next: ContactStatus,
    ) -> Result<ContactRequest, CommerceError> {
        let current = self.get(id).await?;
        current.status.validate_transition(next)?;

        if !self
            .store
            .update_contact_status(id, current.status, next, current_timestamp())
            .await?
        {
            return Err(CommerceError::ConcurrencyConflict(format!(
                "contact request {} changed status",
                id
            )));
        }
        info!(id = %id, from = %current.status, to = %next, "contact request status changed");
        self.get(id).await
    }
}
