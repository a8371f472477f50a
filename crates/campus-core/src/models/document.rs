//! PDF-backed academic records: past questions, concours papers, solutions and books.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::media::{MediaRecord, MediaSlot};
use crate::storage_types::StorageReference;

/// Implements `MediaRecord` for a record whose only file is `pdf`.
macro_rules! pdf_record {
    ($record:ident, $draft:ident, $collection:literal, $label:literal, |$d:ident, $now:ident| $build:expr) => {
        impl MediaRecord for $record {
            type Draft = $draft;
            const COLLECTION: &'static str = $collection;
            const LABEL: &'static str = $label;
            const SLOTS: &'static [MediaSlot] = &[MediaSlot::Pdf];

            fn from_draft($d: $draft, owner_id: Uuid) -> Self {
                let $now = Utc::now();
                let mut record: $record = $build;
                record.owner_id = owner_id;
                record
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
                    MediaSlot::Pdf => Some(&mut self.pdf),
                    _ => None,
                }
            }

            fn references(&self) -> Vec<&StorageReference> {
                self.pdf.iter().collect()
            }

            fn references_mut(&mut self) -> Vec<&mut StorageReference> {
                self.pdf.iter_mut().collect()
            }
        }
    };
}

/// Past exam question paper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub course_id: Option<Uuid>,
    pub title: String,
    pub year: Option<i32>,
    pub pdf: Option<StorageReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[serde(default)]
    pub course_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
}

pdf_record!(Question, CreateQuestionRequest, "questions", "Question", |d, now| Question {
    id: Uuid::new_v4(),
    owner_id: Uuid::nil(),
    course_id: d.course_id,
    title: d.title,
    year: d.year,
    pdf: None,
    created_at: now,
    updated_at: now,
});

/// Entrance-exam (concours) paper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concours {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub school: String,
    pub title: String,
    pub year: Option<i32>,
    pub pdf: Option<StorageReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateConcoursRequest {
    #[validate(length(min = 1, max = 200))]
    pub school: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
}

pdf_record!(Concours, CreateConcoursRequest, "concours", "Concours", |d, now| Concours {
    id: Uuid::new_v4(),
    owner_id: Uuid::nil(),
    school: d.school,
    title: d.title,
    year: d.year,
    pdf: None,
    created_at: now,
    updated_at: now,
});

/// Worked solution to a question paper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub question_id: Uuid,
    pub title: String,
    pub pdf: Option<StorageReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSolutionRequest {
    pub question_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
}

pdf_record!(Solution, CreateSolutionRequest, "solutions", "Solution", |d, now| Solution {
    id: Uuid::new_v4(),
    owner_id: Uuid::nil(),
    question_id: d.question_id,
    title: d.title,
    pdf: None,
    created_at: now,
    updated_at: now,
});

/// Library book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub pdf: Option<StorageReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
}

pdf_record!(Book, CreateBookRequest, "books", "Book", |d, now| Book {
    id: Uuid::new_v4(),
    owner_id: Uuid::nil(),
    title: d.title,
    author: d.author,
    pdf: None,
    created_at: now,
    updated_at: now,
});
