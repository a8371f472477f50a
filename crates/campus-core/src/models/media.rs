//! Media slots and the trait implemented by every record that owns files.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::storage_types::StorageReference;

/// Named attachment position on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSlot {
    Thumbnail,
    Image,
    Video,
    Pdf,
    /// Multi-image gallery
    Images,
}

/// Broad file family, used to pick upload limits and allowlists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Document,
}

impl MediaSlot {
    pub const ALL: [MediaSlot; 5] = [
        MediaSlot::Thumbnail,
        MediaSlot::Image,
        MediaSlot::Video,
        MediaSlot::Pdf,
        MediaSlot::Images,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaSlot::Thumbnail => "thumbnail",
            MediaSlot::Image => "image",
            MediaSlot::Video => "video",
            MediaSlot::Pdf => "pdf",
            MediaSlot::Images => "images",
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            MediaSlot::Thumbnail | MediaSlot::Image | MediaSlot::Images => MediaKind::Image,
            MediaSlot::Video => MediaKind::Video,
            MediaSlot::Pdf => MediaKind::Document,
        }
    }
}

impl FromStr for MediaSlot {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaSlot::ALL
            .into_iter()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown media slot: {}", s))
    }
}

impl Display for MediaSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// How to pick one image out of a gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSelector {
    Id(String),
    Url(String),
}

impl ImageSelector {
    /// `resolved_url` is the URL clients were handed for `reference`; a URL
    /// selector matches it as well as the stored one.
    pub fn matches(&self, reference: &StorageReference, resolved_url: &str) -> bool {
        match self {
            ImageSelector::Id(id) => reference.id == *id,
            ImageSelector::Url(url) => reference.url == *url || resolved_url == url,
        }
    }
}

/// A persisted record that owns stored files.
///
/// `COLLECTION` doubles as the storage category, so every file a record owns
/// lives under `<collection>/`.
pub trait MediaRecord:
    Clone + std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + Unpin + 'static
{
    /// Client-supplied fields used to create the record
    type Draft: DeserializeOwned + Validate + Send;

    const COLLECTION: &'static str;

    /// Human name used in error messages
    const LABEL: &'static str;

    /// Single-reference slots this record exposes
    const SLOTS: &'static [MediaSlot];

    /// Whether the record has an `images` gallery
    const HAS_GALLERY: bool = false;

    fn from_draft(draft: Self::Draft, owner_id: Uuid) -> Self;

    fn id(&self) -> Uuid;

    fn owner_id(&self) -> Uuid;

    /// Bump the modification timestamp.
    fn touch(&mut self);

    /// Mutable access to a single-reference slot, `None` if the record has no such slot.
    fn slot_mut(&mut self, slot: MediaSlot) -> Option<&mut Option<StorageReference>>;

    /// Mutable access to the gallery, `None` if the record has none.
    fn gallery_mut(&mut self) -> Option<&mut Vec<StorageReference>> {
        None
    }

    /// Every reference the record currently holds.
    fn references(&self) -> Vec<&StorageReference>;

    fn references_mut(&mut self) -> Vec<&mut StorageReference>;

    fn supports(slot: MediaSlot) -> bool {
        if slot == MediaSlot::Images {
            Self::HAS_GALLERY
        } else {
            Self::SLOTS.contains(&slot)
        }
    }
}
