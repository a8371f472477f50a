use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// Defined in core because it is used in configuration, in stored references
/// and by the storage crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    /// Local filesystem under a configured root
    Disk,
    /// S3-protocol bucket (Supabase Storage)
    RemoteBucket,
    /// Google Cloud Storage bucket served through signed URLs (Firebase Storage)
    RemoteSigned,
}

impl StorageBackend {
    /// Auto-mode attempt order. Disk is last and always available.
    pub const PRIORITY: [StorageBackend; 3] = [
        StorageBackend::RemoteBucket,
        StorageBackend::RemoteSigned,
        StorageBackend::Disk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Disk => "disk",
            StorageBackend::RemoteBucket => "remote-bucket",
            StorageBackend::RemoteSigned => "remote-signed",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disk" | "local" => Ok(StorageBackend::Disk),
            "remote-bucket" | "bucket" | "supabase" => Ok(StorageBackend::RemoteBucket),
            "remote-signed" | "signed" | "firebase" => Ok(StorageBackend::RemoteSigned),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// How the storage router picks its backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Probe configured backends in priority order and fall back on failure
    #[default]
    Auto,
    /// Use exactly this backend, never fall back
    Pinned(StorageBackend),
}

impl FromStr for StorageMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        if value.is_empty() || value == "auto" {
            return Ok(StorageMode::Auto);
        }
        value
            .parse::<StorageBackend>()
            .map(StorageMode::Pinned)
            .map_err(|_| {
                anyhow::anyhow!(
                    "Invalid STORAGE_MODE '{}'. Expected auto, disk, remote-bucket or remote-signed",
                    s
                )
            })
    }
}

impl Display for StorageMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageMode::Auto => f.write_str("auto"),
            StorageMode::Pinned(backend) => write!(f, "{}", backend),
        }
    }
}

/// Durable pointer from a record to its stored file.
///
/// Records hold `Option<StorageReference>` or `Vec<StorageReference>`, so a
/// reference is either entirely present or entirely absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageReference {
    /// Backend the object was written to; deletes are routed back to it
    pub backend: StorageBackend,
    /// Opaque backend key, `<category>/<name>`
    pub id: String,
    /// Publicly resolvable address at upload time
    pub url: String,
}

impl StorageReference {
    pub fn new(backend: StorageBackend, id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            backend,
            id: id.into(),
            url: url.into(),
        }
    }

    /// Whether the stored URL can be handed out without consulting the backend.
    pub fn has_absolute_url(&self) -> bool {
        self.url.starts_with("https://") || self.url.starts_with("http://")
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    #[serde(flatten)]
    pub reference: StorageReference,
    pub category: String,
    pub filename: String,
}

impl StoredFile {
    pub fn id(&self) -> &str {
        &self.reference.id
    }

    pub fn url(&self) -> &str {
        &self.reference.url
    }

    pub fn into_reference(self) -> StorageReference {
        self.reference
    }
}
