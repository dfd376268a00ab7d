//! Feedback lifecycle: submit → PENDING → approve → APPROVED.
//!
//! Approval performs two writes without a transaction: the correction is
//! promoted first, then the feedback row is marked approved. If the second
//! write fails the caller gets [`Error::PartialPromotion`]; the engine never
//! retries it on its own.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;
use crate::catalog::{Catalog, UserDirectory};
use crate::correction::CorrectionLookup;
use crate::embedding::Embedding;
use crate::filter::FieldFilter;
use crate::record::{CorrectionRecord, FeedbackRecord, FeedbackStatus, ImageMeta};
use crate::store::{Records, ScanOrder};
use crate::{Error, Result};

/// A reviewer report that `predicted_sku` was wrong for an image.
#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub submitted_by: String,
    pub predicted_sku: String,
    pub correct_sku: String,
    pub embedding: Embedding,
    pub image: Vec<u8>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmittedFeedback {
    pub feedback_id: String,
    pub status: FeedbackStatus,
    pub correct_sku: String,
    pub description: Option<String>,
}

/// Read-only projection of a pending feedback row.
#[derive(Debug, Clone, Serialize)]
pub struct PendingFeedback {
    pub feedback_id: String,
    pub submitted_by: String,
    /// `None` when the submitter id is not in the user directory.
    pub username: Option<String>,
    pub predicted_sku: String,
    pub correct_sku: String,
    pub image_name: String,
    pub file_size: u64,
    pub submitted_at: DateTime<Utc>,
    pub status: FeedbackStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovedFeedback {
    pub feedback_id: String,
    pub training_id: String,
    pub correct_sku: String,
    pub approved_by: String,
    pub status: FeedbackStatus,
}

#[derive(Debug, Clone)]
pub struct FeedbackImage {
    pub image_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct FeedbackLifecycle {
    records: Records,
    corrections: CorrectionLookup,
    catalog: Arc<dyn Catalog>,
    users: Arc<dyn UserDirectory>,
}

impl FeedbackLifecycle {
    pub fn new(
        records: Records,
        corrections: CorrectionLookup,
        catalog: Arc<dyn Catalog>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            records,
            corrections,
            catalog,
            users,
        }
    }

    pub fn submit(&self, feedback: NewFeedback) -> Result<SubmittedFeedback> {
        let submitted_by = required("username", &feedback.submitted_by)?;
        let predicted_sku = required("predicted_sku", &feedback.predicted_sku)?;
        let correct_sku = required("correct_sku", &feedback.correct_sku)?;
        if feedback.image.is_empty() {
            return Err(Error::Validation("image data is required".to_string()));
        }

        let entry = self
            .catalog
            .lookup(correct_sku)?
            .ok_or_else(|| Error::UnknownSku(correct_sku.to_string()))?;

        if feedback.embedding.is_zero() {
            return Err(Error::Extraction("image produced an empty embedding".to_string()));
        }

        let now = Utc::now();
        let record = FeedbackRecord {
            feedback_id: Uuid::new_v4().to_string(),
            submitted_by: submitted_by.to_string(),
            predicted_sku: predicted_sku.to_string(),
            correct_sku: entry.sku_code.clone(),
            embedding: feedback.embedding,
            meta: ImageMeta::for_feedback(predicted_sku, feedback.image.len() as u64, now)
                .with_dimensions(feedback.width, feedback.height),
            image: feedback.image,
            submitted_at: now,
            status: FeedbackStatus::Pending,
            approved_by: None,
            approved_at: None,
        };

        self.records.insert(&record)?;
        info!(
            feedback_id = %record.feedback_id,
            predicted = %record.predicted_sku,
            correct = %record.correct_sku,
            "feedback submitted"
        );

        Ok(SubmittedFeedback {
            feedback_id: record.feedback_id,
            status: record.status,
            correct_sku: record.correct_sku,
            description: entry.description,
        })
    }

    /// Pending feedback, newest first, with submitter names resolved.
    pub fn pending(&self) -> Result<Vec<PendingFeedback>> {
        let filter = FieldFilter::status(FeedbackStatus::Pending);
        let pending = self
            .records
            .scan::<FeedbackRecord>(Some(&filter), ScanOrder::NewestFirst)?;

        Ok(pending
            .into_iter()
            .map(|record| PendingFeedback {
                username: self.users.username(&record.submitted_by),
                feedback_id: record.feedback_id,
                submitted_by: record.submitted_by,
                predicted_sku: record.predicted_sku,
                correct_sku: record.correct_sku,
                image_name: record.meta.image_name,
                file_size: record.meta.file_size,
                submitted_at: record.submitted_at,
                status: record.status,
            })
            .collect())
    }

    pub fn approve(&self, feedback_id: &str, approver: &str) -> Result<ApprovedFeedback> {
        let feedback_id = required("feedback_id", feedback_id)?;
        let approver = required("admin_name", approver)?;

        let feedback = match self.records.get::<FeedbackRecord>(feedback_id)? {
            Some(record) if record.is_pending() => record,
            _ => return Err(Error::FeedbackNotFound(feedback_id.to_string())),
        };

        let now = Utc::now();
        let correction = self.corrections.promote(&feedback, now)?;

        let approved = feedback.approved(approver, now);
        match self.records.update(&approved) {
            Ok(true) => {}
            Ok(false) => {
                return Err(self.partial(&correction, "feedback row no longer exists".to_string()));
            }
            Err(e) => return Err(self.partial(&correction, e.to_string())),
        }

        info!(feedback_id, approver, training_id = %correction.training_id, "feedback approved");

        Ok(ApprovedFeedback {
            feedback_id: approved.feedback_id,
            training_id: correction.training_id,
            correct_sku: approved.correct_sku,
            approved_by: approver.to_string(),
            status: approved.status,
        })
    }

    pub fn image(&self, feedback_id: &str) -> Result<Option<FeedbackImage>> {
        Ok(self
            .records
            .get::<FeedbackRecord>(feedback_id.trim())?
            .map(|record| FeedbackImage {
                image_name: record.meta.image_name,
                bytes: record.image,
            }))
    }

    fn partial(&self, correction: &CorrectionRecord, reason: String) -> Error {
        error!(
            feedback_id = %correction.feedback_id,
            training_id = %correction.training_id,
            reason = %reason,
            "correction promoted but feedback not marked approved; needs manual reconciliation"
        );
        Error::PartialPromotion {
            feedback_id: correction.feedback_id.clone(),
            training_id: correction.training_id.clone(),
            reason,
        }
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("{} is required", field)));
    }
    Ok(value)
}
