use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::media::{MediaRecord, MediaSlot};
use crate::storage_types::StorageReference;

/// Scholarship announcement with an image gallery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scholarship {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub provider: Option<String>,
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub images: Vec<StorageReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateScholarshipRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Scholarship title must be between 1 and 200 characters"
    ))]
    pub title: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

impl MediaRecord for Scholarship {
    type Draft = CreateScholarshipRequest;
    const COLLECTION: &'static str = "scholarships";
    const LABEL: &'static str = "Scholarship";
    const SLOTS: &'static [MediaSlot] = &[];
    const HAS_GALLERY: bool = true;

    fn from_draft(draft: CreateScholarshipRequest, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Scholarship {
            id: Uuid::new_v4(),
            owner_id,
            title: draft.title,
            provider: draft.provider,
            deadline: draft.deadline,
            images: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn slot_mut(&mut self, _slot: MediaSlot) -> Option<&mut Option<StorageReference>> {
        None
    }

    fn gallery_mut(&mut self) -> Option<&mut Vec<StorageReference>> {
        Some(&mut self.images)
    }

    fn references(&self) -> Vec<&StorageReference> {
        self.images.iter().collect()
    }

    fn references_mut(&mut self) -> Vec<&mut StorageReference> {
        self.images.iter_mut().collect()
    }
}
