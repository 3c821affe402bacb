//! Registration validation, employer ID allocation and finalization.
//!
//! A finalize request moves through bind, validate, normalize and dispatch; any
//! failure ends the request. Nothing is retried and nothing is persisted here, so an
//! identical submission is dispatched again.

use crate::error::from_broker_error;
use bytes::Bytes;
use intake_core::models::{CompanyRegisterForm, RegistrationForm, ResidentRegisterForm};
use intake_core::validation::{field_violations, FOREIGN_OBJECT_KEY, INVALID_OBJECT_KEY, REQUIRED};
use intake_core::{AppError, BrokerConfig, FieldViolation};
use intake_services::{decode_reply, request_with_timeout, MessageBroker};
use intake_storage::parse_key;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Which request a form arrived on. The employer ID only exists once allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Initiate,
    Finalize,
}

/// Collect every violation in `form`, one per field, sorted by field path.
pub fn validate_form(form: &RegistrationForm, stage: Stage) -> Result<(), AppError> {
    let mut violations = match form.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => field_violations(&errors),
    };

    if let RegistrationForm::Company(company) = form {
        if stage == Stage::Finalize && company.employer_id.trim().is_empty() {
            violations.push(FieldViolation::new("employerID", REQUIRED));
        }
    }

    let mut owned = Vec::new();
    for (path, key) in form.document_keys() {
        if key.is_empty() {
            continue;
        }
        match parse_key(key) {
            Ok(parsed) => owned.push((path, parsed.registration_id)),
            Err(_) => violations.push(FieldViolation::new(path, INVALID_OBJECT_KEY)),
        }
    }

    if let Some(expected) = majority_registration(&owned) {
        for (path, registration_id) in owned {
            if registration_id != expected {
                violations.push(FieldViolation::new(path, FOREIGN_OBJECT_KEY));
            }
        }
    }

    if violations.is_empty() {
        return Ok(());
    }

    violations.sort_by(|a, b| a.field.cmp(&b.field));
    Err(AppError::Validation(violations))
}

/// Registration most document keys point at; ties go to the one seen first.
fn majority_registration<'a>(owned: &[(String, &'a str)]) -> Option<&'a str> {
    let mut counts: Vec<(&'a str, usize)> = Vec::new();
    for (_, registration_id) in owned {
        match counts.iter_mut().find(|(seen, _)| seen == registration_id) {
            Some((_, count)) => *count += 1,
            None => counts.push((*registration_id, 1)),
        }
    }
    counts
        .into_iter()
        .fold(None, |best, (registration_id, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((registration_id, count)),
        })
        .map(|(registration_id, _)| registration_id)
}

#[derive(Clone)]
pub struct RegistrationService {
    broker: Arc<dyn MessageBroker>,
    config: BrokerConfig,
}

impl RegistrationService {
    pub fn new(broker: Arc<dyn MessageBroker>, config: BrokerConfig) -> Self {
        Self { broker, config }
    }

    /// Validate a resident form and hand out a fresh registration ID.
    pub fn initiate_resident(&self, form: ResidentRegisterForm) -> Result<Uuid, AppError> {
        validate_form(&RegistrationForm::Resident(form), Stage::Initiate)?;
        Ok(Uuid::new_v4())
    }

    /// Validate a company form and allocate its employer ID from the backend.
    #[tracing::instrument(skip(self, form), fields(company_name = %form.company_name))]
    pub async fn initiate_company(
        &self,
        form: CompanyRegisterForm,
    ) -> Result<(Uuid, String), AppError> {
        validate_form(&RegistrationForm::Company(form), Stage::Initiate)?;
        let employer_id = self.allocate_employer_id().await?;
        let register_id = Uuid::new_v4();

        tracing::info!(register_id = %register_id, employer_id = %employer_id, "Company registration initiated");
        Ok((register_id, employer_id))
    }

    /// The allocation reply must be a JSON object whose `data` is the ID string.
    pub async fn allocate_employer_id(&self) -> Result<String, AppError> {
        let subject = self.config.employer_id_subject()?;
        let reply = request_with_timeout(
            self.broker.as_ref(),
            &subject,
            Bytes::new(),
            self.config.request_timeout,
        )
        .await
        .map_err(from_broker_error)?;

        let parsed: Value = serde_json::from_slice(&reply)
            .map_err(|e| AppError::BrokerReply(format!("Failed to parse broker reply: {}", e)))?;

        parsed
            .get("data")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::BrokerReply("Missing or invalid ID".to_string()))
    }

    /// Validate, normalize and dispatch a form; returns the decoded backend reply.
    #[tracing::instrument(skip(self, form), fields(kind = form.kind().as_str()))]
    pub async fn finalize(&self, form: &RegistrationForm) -> Result<Value, AppError> {
        validate_form(form, Stage::Finalize)?;

        let subject = self.config.finalize_subject(form.kind())?;
        let payload = serde_json::to_vec(&form.normalize())?;

        let reply = request_with_timeout(
            self.broker.as_ref(),
            &subject,
            Bytes::from(payload),
            self.config.request_timeout,
        )
        .await
        .map_err(from_broker_error)?;

        tracing::info!(subject = %subject, reply_bytes = reply.len(), "Registration dispatched");
        Ok(decode_reply(&reply))
    }
}
