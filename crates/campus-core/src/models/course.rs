use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::media::{MediaRecord, MediaSlot};
use crate::storage_types::StorageReference;

/// Course with an optional cover thumbnail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<StorageReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Course title must be between 1 and 200 characters"
    ))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

impl MediaRecord for Course {
    type Draft = CreateCourseRequest;
    const COLLECTION: &'static str = "courses";
    const LABEL: &'static str = "Course";
    const SLOTS: &'static [MediaSlot] = &[MediaSlot::Thumbnail];

    fn from_draft(draft: CreateCourseRequest, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Course {
            id: Uuid::new_v4(),
            owner_id,
            title: draft.title,
            description: draft.description,
            thumbnail: None,
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
            _ => None,
        }
    }

    fn references(&self) -> Vec<&StorageReference> {
        self.thumbnail.iter().collect()
    }

    fn references_mut(&mut self) -> Vec<&mut StorageReference> {
        self.thumbnail.iter_mut().collect()
    }
}

/// Skill badge shown on profiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub thumbnail: Option<StorageReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSkillRequest {
    #[validate(length(
        min = 1,
        max = 120,
        message = "Skill name must be between 1 and 120 characters"
    ))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl MediaRecord for Skill {
    type Draft = CreateSkillRequest;
    const COLLECTION: &'static str = "skills";
    const LABEL: &'static str = "Skill";
    const SLOTS: &'static [MediaSlot] = &[MediaSlot::Thumbnail];

    fn from_draft(draft: CreateSkillRequest, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Skill {
            id: Uuid::new_v4(),
            owner_id,
            name: draft.name,
            description: draft.description,
            thumbnail: None,
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
            _ => None,
        }
    }

    fn references(&self) -> Vec<&StorageReference> {
        self.thumbnail.iter().collect()
    }

    fn references_mut(&mut self) -> Vec<&mut StorageReference> {
        self.thumbnail.iter_mut().collect()
    }
}

/// Entrant in a voting contest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contestant {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub contest_id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    pub image: Option<StorageReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateContestantRequest {
    pub contest_id: Uuid,
    #[validate(length(
        min = 1,
        max = 120,
        message = "Contestant name must be between 1 and 120 characters"
    ))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
}

impl MediaRecord for Contestant {
    type Draft = CreateContestantRequest;
    const COLLECTION: &'static str = "contestants";
    const LABEL: &'static str = "Contestant";
    const SLOTS: &'static [MediaSlot] = &[MediaSlot::Image];

    fn from_draft(draft: CreateContestantRequest, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Contestant {
            id: Uuid::new_v4(),
            owner_id,
            contest_id: draft.contest_id,
            name: draft.name,
            bio: draft.bio,
            image: None,
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
            MediaSlot::Image => Some(&mut self.image),
            _ => None,
        }
    }

    fn references(&self) -> Vec<&StorageReference> {
        self.image.iter().collect()
    }

    fn references_mut(&mut self) -> Vec<&mut StorageReference> {
        self.image.iter_mut().collect()
    }
}
