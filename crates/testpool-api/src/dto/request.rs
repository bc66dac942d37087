//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use testpool_core::error::AppError;
use testpool_store::{RequestKind, Tag};

/// Reservation request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReserveRequest {
    /// `premise` or `device`.
    #[serde(default)]
    #[validate(length(min = 1, message = "Request kind is required"))]
    pub kind: String,
    /// Requester label, e.g. the test case ID.
    #[serde(default)]
    #[validate(custom(function = "validate_tag"))]
    pub tag: String,
}

/// Tags are checked after trimming, exactly as they will be stored.
fn validate_tag(tag: &str) -> Result<(), ValidationError> {
    Tag::new(tag).map(|_| ()).map_err(|e| {
        let mut err = ValidationError::new("tag");
        err.message = Some(e.message.into());
        err
    })
}

impl ReserveRequest {
    /// Validate and convert into domain values.
    pub fn parse(&self) -> Result<(RequestKind, Tag), AppError> {
        self.validate()
            .map_err(|e| AppError::validation(format!("Invalid reservation request: {e}")))?;
        let kind = self.kind.parse::<RequestKind>()?;
        let tag = Tag::new(&self.tag)?;
        Ok((kind, tag))
    }
}
