use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::media::{MediaRecord, MediaSlot};
use crate::storage_types::StorageReference;

/// Broadcast notification; may carry a thumbnail and a video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub body: String,
    pub thumbnail: Option<StorageReference>,
    pub video: Option<StorageReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNotificationRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 10000))]
    #[serde(default)]
    pub body: String,
}

impl MediaRecord for Notification {
    type Draft = CreateNotificationRequest;
    const COLLECTION: &'static str = "notifications";
    const LABEL: &'static str = "Notification";
    const SLOTS: &'static [MediaSlot] = &[MediaSlot::Thumbnail, MediaSlot::Video];

    fn from_draft(draft: CreateNotificationRequest, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Notification {
            id: Uuid::new_v4(),
            owner_id,
            title: draft.title,
            body: draft.body,
            thumbnail: None,
            video: None,
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

    fn slot_mut(&mut self, slot: MediaSlot) -> Option<&mut Option<StorageReference>> {
        match slot {
            MediaSlot::Thumbnail => Some(&mut self.thumbnail),
            MediaSlot::Video => Some(&mut self.video),
            _ => None,
        }
    }

    fn references(&self) -> Vec<&StorageReference> {
        self.thumbnail.iter().chain(self.video.iter()).collect()
    }

    fn references_mut(&mut self) -> Vec<&mut StorageReference> {
        self.thumbnail
            .iter_mut()
            .chain(self.video.iter_mut())
            .collect()
    }
}
