//! Media lifecycle: upload, persist and delete in an order that never leaves a
//! record pointing at a missing file.
//!
//! Every mutation follows the same shape. The record is loaded and the actor
//! authorized before any storage call. New files are uploaded before the
//! record is written, and superseded files are deleted only after the write
//! succeeded. When a write fails, the files uploaded for it are deleted again
//! (best-effort) and the previous state stays intact. Mutations of one record
//! are serialized through [`RecordLocks`].

use bytes::Bytes;
use campus_core::models::{Actor, ImageSelector, MediaRecord, MediaSlot};
use campus_core::{AppError, StorageReference};
use campus_db::RecordRepository;
use campus_storage::{StorageRouter, UploadOptions};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::record_locks::RecordLocks;

/// A file received from a client, not yet stored
#[derive(Clone, Debug)]
pub struct FileUpload {
    pub content_type: String,
    pub data: Bytes,
}

impl FileUpload {
    pub fn new(content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        FileUpload {
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

/// Lifecycle operations for one record type
pub struct MediaLifecycleService<T: MediaRecord> {
    repository: Arc<dyn RecordRepository<T>>,
    storage: Arc<StorageRouter>,
    locks: Arc<RecordLocks>,
}

impl<T: MediaRecord> Clone for MediaLifecycleService<T> {
    fn clone(&self) -> Self {
        MediaLifecycleService {
            repository: self.repository.clone(),
            storage: self.storage.clone(),
            locks: self.locks.clone(),
        }
    }
}

fn set_slot<T: MediaRecord>(
    record: &mut T,
    slot: MediaSlot,
    value: Option<StorageReference>,
) -> Option<StorageReference> {
    record
        .slot_mut(slot)
        .and_then(|current| std::mem::replace(current, value))
}

impl<T: MediaRecord> MediaLifecycleService<T> {
    pub fn new(repository: Arc<dyn RecordRepository<T>>, storage: Arc<StorageRouter>) -> Self {
        MediaLifecycleService {
            repository,
            storage,
            locks: Arc::new(RecordLocks::new()),
        }
    }

    pub fn storage(&self) -> &Arc<StorageRouter> {
        &self.storage
    }

    /// Create a record with its initial files.
    pub async fn create(
        &self,
        actor: &Actor,
        draft: T::Draft,
        files: Vec<(MediaSlot, FileUpload)>,
    ) -> Result<T, AppError> {
        draft.validate()?;
        Self::check_initial_files(&files)?;

        let mut record = T::from_draft(draft, actor.user_id);
        let uploaded = self.upload_all(files).await?;

        for (slot, reference) in &uploaded {
            if *slot == MediaSlot::Images {
                if let Some(gallery) = record.gallery_mut() {
                    gallery.push(reference.clone());
                }
            } else {
                set_slot(&mut record, *slot, Some(reference.clone()));
            }
        }

        if let Err(e) = self.repository.insert(&record).await {
            tracing::error!(
                error = %e,
                collection = T::COLLECTION,
                record_id = %record.id(),
                "Insert failed, removing files uploaded for it"
            );
            self.discard(uploaded.iter().map(|(_, r)| r).collect::<Vec<_>>()).await;
            return Err(e);
        }

        tracing::info!(
            collection = T::COLLECTION,
            record_id = %record.id(),
            owner_id = %record.owner_id(),
            files = uploaded.len(),
            "Record created"
        );

        Ok(self.resolve(record))
    }

    /// Put a new file into `slot`, deleting the one it replaces.
    pub async fn replace_media(
        &self,
        actor: &Actor,
        id: Uuid,
        slot: MediaSlot,
        file: FileUpload,
    ) -> Result<T, AppError> {
        let _guard = self.locks.lock(id).await;
        let mut record = self.load(id).await?;
        Self::authorize(actor, &record)?;
        Self::check_single_slot(&mut record, slot)?;

        let new_reference = self.upload(&file).await?;
        let old_reference = set_slot(&mut record, slot, Some(new_reference.clone()));
        record.touch();

        if let Err(e) = self.repository.update(&record).await {
            tracing::error!(
                error = %e,
                collection = T::COLLECTION,
                record_id = %id,
                slot = %slot,
                "Update failed, keeping the previous file"
            );
            self.storage.delete(&new_reference).await;
            return Err(e);
        }

        if let Some(old) = old_reference {
            self.storage.delete(&old).await;
        }

        tracing::info!(
            collection = T::COLLECTION,
            record_id = %id,
            slot = %slot,
            key = %new_reference.id,
            "Media replaced"
        );

        Ok(self.resolve(record))
    }

    /// Clear `slot` and delete its file. An empty slot is left as is.
    pub async fn remove_media(
        &self,
        actor: &Actor,
        id: Uuid,
        slot: MediaSlot,
    ) -> Result<T, AppError> {
        let _guard = self.locks.lock(id).await;
        let mut record = self.load(id).await?;
        Self::authorize(actor, &record)?;
        Self::check_single_slot(&mut record, slot)?;

        let Some(old_reference) = set_slot(&mut record, slot, None) else {
            return Ok(self.resolve(record));
        };
        record.touch();
        self.repository.update(&record).await?;
        self.storage.delete(&old_reference).await;

        tracing::info!(
            collection = T::COLLECTION,
            record_id = %id,
            slot = %slot,
            "Media removed"
        );

        Ok(self.resolve(record))
    }

    /// Delete the record, then every file it held.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        let _guard = self.locks.lock(id).await;
        let record = self.load(id).await?;
        Self::authorize(actor, &record)?;

        if !self.repository.delete(id).await? {
            return Err(Self::not_found(id));
        }

        let references = record.references();
        self.discard(references.iter().copied().collect::<Vec<_>>()).await;

        tracing::info!(
            collection = T::COLLECTION,
            record_id = %id,
            files = references.len(),
            "Record deleted"
        );

        Ok(())
    }

    /// Append files to the record's gallery.
    pub async fn add_images(
        &self,
        actor: &Actor,
        id: Uuid,
        files: Vec<FileUpload>,
    ) -> Result<T, AppError> {
        let _guard = self.locks.lock(id).await;
        let mut record = self.load(id).await?;
        Self::authorize(actor, &record)?;
        Self::check_gallery(&mut record)?;
        if files.is_empty() {
            return Err(AppError::InvalidInput("No images provided".to_string()));
        }

        let uploaded = self
            .upload_all(files.into_iter().map(|f| (MediaSlot::Images, f)).collect())
            .await?;
        if let Some(gallery) = record.gallery_mut() {
            gallery.extend(uploaded.iter().map(|(_, r)| r.clone()));
        }
        record.touch();

        if let Err(e) = self.repository.update(&record).await {
            self.discard(uploaded.iter().map(|(_, r)| r).collect::<Vec<_>>()).await;
            return Err(e);
        }

        tracing::info!(
            collection = T::COLLECTION,
            record_id = %id,
            added = uploaded.len(),
            "Gallery images added"
        );

        Ok(self.resolve(record))
    }

    /// Remove the one gallery entry `selector` matches.
    pub async fn remove_image(
        &self,
        actor: &Actor,
        id: Uuid,
        selector: &ImageSelector,
    ) -> Result<T, AppError> {
        let _guard = self.locks.lock(id).await;
        let mut record = self.load(id).await?;
        Self::authorize(actor, &record)?;
        Self::check_gallery(&mut record)?;

        let removed = {
            let gallery = record
                .gallery_mut()
                .ok_or_else(|| AppError::Internal("gallery disappeared".to_string()))?;
            let position = gallery
                .iter()
                .position(|reference| {
                    selector.matches(reference, &self.storage.resolve_url(reference))
                })
                .ok_or_else(|| AppError::NotFound("Image not found in gallery".to_string()))?;
            gallery.remove(position)
        };
        record.touch();

        self.repository.update(&record).await?;
        self.storage.delete(&removed).await;

        tracing::info!(
            collection = T::COLLECTION,
            record_id = %id,
            key = %removed.id,
            "Gallery image removed"
        );

        Ok(self.resolve(record))
    }

    pub async fn get(&self, id: Uuid) -> Result<T, AppError> {
        let record = self.load(id).await?;
        Ok(self.resolve(record))
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<T>, AppError> {
        let records = self.repository.list(limit, offset).await?;
        Ok(records.into_iter().map(|r| self.resolve(r)).collect())
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        self.repository.count().await
    }

    async fn load(&self, id: Uuid) -> Result<T, AppError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    fn not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("{} {} not found", T::LABEL, id))
    }

    fn authorize(actor: &Actor, record: &T) -> Result<(), AppError> {
        if actor.can_modify(record.owner_id()) {
            return Ok(());
        }
        tracing::warn!(
            collection = T::COLLECTION,
            record_id = %record.id(),
            user_id = %actor.user_id,
            "Actor may not modify record"
        );
        Err(AppError::Forbidden(format!(
            "Not allowed to modify this {}",
            T::LABEL.to_lowercase()
        )))
    }

    fn check_single_slot(record: &mut T, slot: MediaSlot) -> Result<(), AppError> {
        if slot == MediaSlot::Images || !T::SLOTS.contains(&slot) || record.slot_mut(slot).is_none()
        {
            return Err(AppError::InvalidInput(format!(
                "{} has no '{}' media slot",
                T::LABEL,
                slot
            )));
        }
        Ok(())
    }

    fn check_gallery(record: &mut T) -> Result<(), AppError> {
        if !T::HAS_GALLERY || record.gallery_mut().is_none() {
            return Err(AppError::InvalidInput(format!(
                "{} has no image gallery",
                T::LABEL
            )));
        }
        Ok(())
    }

    fn check_initial_files(files: &[(MediaSlot, FileUpload)]) -> Result<(), AppError> {
        for (index, (slot, _)) in files.iter().enumerate() {
            if !T::supports(*slot) {
                return Err(AppError::InvalidInput(format!(
                    "{} has no '{}' media slot",
                    T::LABEL,
                    slot
                )));
            }
            if *slot != MediaSlot::Images && files[..index].iter().any(|(s, _)| s == slot) {
                return Err(AppError::InvalidInput(format!(
                    "Only one file allowed for '{}'",
                    slot
                )));
            }
        }
        Ok(())
    }

    async fn upload(&self, file: &FileUpload) -> Result<StorageReference, AppError> {
        let stored = self
            .storage
            .upload(
                file.data.clone(),
                UploadOptions::new(T::COLLECTION, file.content_type.clone()),
            )
            .await?;
        Ok(stored.into_reference())
    }

    /// Upload in order; on the first failure delete what was already stored.
    async fn upload_all(
        &self,
        files: Vec<(MediaSlot, FileUpload)>,
    ) -> Result<Vec<(MediaSlot, StorageReference)>, AppError> {
        let mut uploaded = Vec::with_capacity(files.len());
        for (slot, file) in files {
            match self.upload(&file).await {
                Ok(reference) => uploaded.push((slot, reference)),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        collection = T::COLLECTION,
                        rolled_back = uploaded.len(),
                        "Upload failed, removing files already stored for this request"
                    );
                    self.discard(uploaded.iter().map(|(_, r)| r).collect::<Vec<_>>()).await;
                    return Err(e);
                }
            }
        }
        Ok(uploaded)
    }

    async fn discard<'a>(&self, references: impl IntoIterator<Item = &'a StorageReference>) {
        for reference in references {
            self.storage.delete(reference).await;
        }
    }

    fn resolve(&self, mut record: T) -> T {
        for reference in record.references_mut() {
            let url = self.storage.resolve_url(reference);
            reference.url = url;
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use campus_core::models::{
        Course, CreateCourseRequest, CreateNotificationRequest, CreateScholarshipRequest,
        Notification, Role, Scholarship,
    };
    use campus_core::{StorageBackend, StorageMode};
    use campus_db::InMemoryRepository;
    use campus_storage::testing::{Failure, FlakyStorage};
    use campus_storage::{LocalStorage, Storage};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::{tempdir, TempDir};

    /// In-memory repository whose writes can be made to fail and whose reads
    /// can be slowed down so concurrent operations overlap
    struct BrokenWrites<T> {
        inner: InMemoryRepository<T>,
        failing: AtomicBool,
        slow_reads: AtomicBool,
    }

    impl<T: MediaRecord> BrokenWrites<T> {
        fn new() -> Self {
            BrokenWrites {
                inner: InMemoryRepository::new(),
                failing: AtomicBool::new(false),
                slow_reads: AtomicBool::new(false),
            }
        }

        fn check(&self) -> Result<(), AppError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(AppError::Internal("database unavailable".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl<T: MediaRecord> RecordRepository<T> for BrokenWrites<T> {
        async fn insert(&self, record: &T) -> Result<(), AppError> {
            self.check()?;
            self.inner.insert(record).await
        }
        async fn get(&self, id: Uuid) -> Result<Option<T>, AppError> {
            if self.slow_reads.load(Ordering::SeqCst) {
                tokio::time::sleep(std::time::Duration::from_millis(30)).await;
            }
            self.inner.get(id).await
        }
        async fn update(&self, record: &T) -> Result<(), AppError> {
            self.check()?;
            self.inner.update(record).await
        }
        async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
            self.check()?;
            self.inner.delete(id).await
        }
        async fn list(&self, limit: i64, offset: i64) -> Result<Vec<T>, AppError> {
            self.inner.list(limit, offset).await
        }
        async fn count(&self) -> Result<i64, AppError> {
            self.inner.count().await
        }
    }

    struct Harness<T: MediaRecord> {
        _root: TempDir,
        root_path: std::path::PathBuf,
        storage: Arc<FlakyStorage>,
        repository: Arc<BrokenWrites<T>>,
        service: MediaLifecycleService<T>,
    }

    async fn harness<T: MediaRecord>() -> Harness<T> {
        let root = tempdir().unwrap();
        let disk: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(root.path(), "http://h".to_string())
                .await
                .unwrap(),
        );
        let storage = Arc::new(FlakyStorage::new(disk));
        let router = StorageRouter::new(
            StorageMode::Auto,
            vec![storage.clone() as Arc<dyn Storage>],
        )
        .unwrap();
        let repository = Arc::new(BrokenWrites::<T>::new());
        let service = MediaLifecycleService::new(
            repository.clone() as Arc<dyn RecordRepository<T>>,
            Arc::new(router),
        );
        Harness {
            root_path: root.path().to_path_buf(),
            _root: root,
            storage,
            repository,
            service,
        }
    }

    impl<T: MediaRecord> Harness<T> {
        fn file_exists(&self, reference: &StorageReference) -> bool {
            self.root_path.join(&reference.id).exists()
        }

        fn stored_files(&self, category: &str) -> usize {
            std::fs::read_dir(self.root_path.join(category))
                .map(|entries| entries.count())
                .unwrap_or(0)
        }
    }

    fn owner() -> Actor {
        Actor::new(Uuid::new_v4(), Role::Student)
    }

    fn jpeg(bytes: &'static [u8]) -> FileUpload {
        FileUpload::new("image/jpeg", Bytes::from_static(bytes))
    }

    fn course_draft() -> CreateCourseRequest {
        CreateCourseRequest {
            title: "Algebra".to_string(),
            description: None,
        }
    }

    async fn course_with_thumbnail(h: &Harness<Course>, actor: &Actor) -> Course {
        h.service
            .create(actor, course_draft(), vec![(MediaSlot::Thumbnail, jpeg(b"old"))])
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_uploads_then_persists() {
        let h = harness::<Course>().await;
        let actor = owner();

        let course = course_with_thumbnail(&h, &actor).await;

        let thumbnail = course.thumbnail.clone().unwrap();
        assert_eq!(thumbnail.backend, StorageBackend::Disk);
        assert!(thumbnail.id.starts_with("courses/"));
        assert!(thumbnail.url.starts_with("http://h/courses/"));
        assert!(h.file_exists(&thumbnail));
        assert_eq!(course.owner_id, actor.user_id);
        assert_eq!(h.service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn create_with_failing_upload_leaves_no_record_and_no_files() {
        let h = harness::<Notification>().await;
        h.storage.fail_uploads_after(1, Failure::Upload);

        let result = h
            .service
            .create(
                &owner(),
                CreateNotificationRequest {
                    title: "Exam".to_string(),
                    body: String::new(),
                },
                vec![
                    (MediaSlot::Thumbnail, jpeg(b"thumb")),
                    (MediaSlot::Video, FileUpload::new("video/mp4", Bytes::from_static(b"mp4"))),
                ],
            )
            .await;

        assert!(matches!(result, Err(AppError::Storage(_))));
        assert_eq!(h.service.count().await.unwrap(), 0);
        assert_eq!(h.storage.delete_calls(), 1);
        assert_eq!(h.stored_files("notifications"), 0);
    }

    #[tokio::test]
    async fn create_with_failing_insert_removes_uploaded_files() {
        let h = harness::<Course>().await;
        h.repository.failing.store(true, Ordering::SeqCst);

        let result = h
            .service
            .create(&owner(), course_draft(), vec![(MediaSlot::Thumbnail, jpeg(b"x"))])
            .await;

        assert!(result.is_err());
        assert_eq!(h.storage.upload_calls(), 1);
        assert_eq!(h.stored_files("courses"), 0);
    }

    #[tokio::test]
    async fn create_rejects_unknown_slot_before_uploading() {
        let h = harness::<Course>().await;
        let result = h
            .service
            .create(&owner(), course_draft(), vec![(MediaSlot::Pdf, jpeg(b"x"))])
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(h.storage.total_calls(), 0);
    }

    #[tokio::test]
    async fn create_rejects_invalid_draft() {
        let h = harness::<Course>().await;
        let draft = CreateCourseRequest {
            title: String::new(),
            description: None,
        };
        let result = h.service.create(&owner(), draft, vec![]).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn replace_deletes_old_file_after_persisting_new() {
        let h = harness::<Course>().await;
        let actor = owner();
        let course = course_with_thumbnail(&h, &actor).await;
        let old = course.thumbnail.unwrap();

        let updated = h
            .service
            .replace_media(&actor, course.id, MediaSlot::Thumbnail, jpeg(b"new"))
            .await
            .unwrap();

        let new = updated.thumbnail.unwrap();
        assert_ne!(new.id, old.id);
        assert!(h.file_exists(&new));
        assert!(!h.file_exists(&old));
        assert_eq!(std::fs::read(h.root_path.join(&new.id)).unwrap(), b"new");
    }

    #[tokio::test]
    async fn failed_replace_upload_keeps_original_reference() {
        let h = harness::<Course>().await;
        let actor = owner();
        let course = course_with_thumbnail(&h, &actor).await;
        let original = course.thumbnail.clone().unwrap();
        h.storage.fail_uploads(Failure::Upload);

        let result = h
            .service
            .replace_media(&actor, course.id, MediaSlot::Thumbnail, jpeg(b"new"))
            .await;

        assert!(matches!(result, Err(AppError::Storage(_))));
        let stored = h.service.get(course.id).await.unwrap();
        assert_eq!(stored.thumbnail, Some(original.clone()));
        let bytes = h.service.storage().download(&original).await.unwrap();
        assert_eq!(bytes, b"old");
        assert_eq!(h.storage.delete_calls(), 0);
    }

    #[tokio::test]
    async fn failed_replace_persist_deletes_new_and_keeps_old() {
        let h = harness::<Course>().await;
        let actor = owner();
        let course = course_with_thumbnail(&h, &actor).await;
        let original = course.thumbnail.clone().unwrap();
        h.repository.failing.store(true, Ordering::SeqCst);

        let result = h
            .service
            .replace_media(&actor, course.id, MediaSlot::Thumbnail, jpeg(b"new"))
            .await;

        assert!(result.is_err());
        assert!(h.file_exists(&original));
        assert_eq!(h.stored_files("courses"), 1);
        let stored = h.service.get(course.id).await.unwrap();
        assert_eq!(stored.thumbnail, Some(original));
    }

    #[tokio::test]
    async fn missing_record_triggers_no_storage_call() {
        let h = harness::<Course>().await;
        let actor = owner();

        let replace = h
            .service
            .replace_media(&actor, Uuid::new_v4(), MediaSlot::Thumbnail, jpeg(b"x"))
            .await;
        let delete = h.service.delete(&actor, Uuid::new_v4()).await;

        assert!(matches!(replace, Err(AppError::NotFound(_))));
        assert!(matches!(delete, Err(AppError::NotFound(_))));
        assert_eq!(h.storage.total_calls(), 0);
    }

    #[tokio::test]
    async fn other_student_is_forbidden_before_storage() {
        let h = harness::<Course>().await;
        let course = course_with_thumbnail(&h, &owner()).await;
        let calls_before = h.storage.total_calls();
        let intruder = owner();

        let replace = h
            .service
            .replace_media(&intruder, course.id, MediaSlot::Thumbnail, jpeg(b"x"))
            .await;
        let delete = h.service.delete(&intruder, course.id).await;

        assert!(matches!(replace, Err(AppError::Forbidden(_))));
        assert!(matches!(delete, Err(AppError::Forbidden(_))));
        assert_eq!(h.storage.total_calls(), calls_before);
        assert_eq!(h.service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn admin_may_modify_any_record() {
        let h = harness::<Course>().await;
        let course = course_with_thumbnail(&h, &owner()).await;
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);

        h.service
            .remove_media(&admin, course.id, MediaSlot::Thumbnail)
            .await
            .unwrap();
        assert!(h.service.get(course.id).await.unwrap().thumbnail.is_none());
    }

    #[tokio::test]
    async fn unsupported_slot_is_invalid_input() {
        let h = harness::<Course>().await;
        let actor = owner();
        let course = course_with_thumbnail(&h, &actor).await;
        let calls_before = h.storage.total_calls();

        let result = h
            .service
            .replace_media(&actor, course.id, MediaSlot::Video, jpeg(b"x"))
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(h.storage.total_calls(), calls_before);
    }

    #[tokio::test]
    async fn remove_media_clears_slot_and_deletes_file() {
        let h = harness::<Course>().await;
        let actor = owner();
        let course = course_with_thumbnail(&h, &actor).await;
        let old = course.thumbnail.unwrap();

        let cleared = h
            .service
            .remove_media(&actor, course.id, MediaSlot::Thumbnail)
            .await
            .unwrap();
        assert!(cleared.thumbnail.is_none());
        assert!(!h.file_exists(&old));

        let deletes = h.storage.delete_calls();
        h.service
            .remove_media(&actor, course.id, MediaSlot::Thumbnail)
            .await
            .unwrap();
        assert_eq!(h.storage.delete_calls(), deletes);
    }

    #[tokio::test]
    async fn delete_removes_record_then_files() {
        let h = harness::<Course>().await;
        let actor = owner();
        let course = course_with_thumbnail(&h, &actor).await;

        h.service.delete(&actor, course.id).await.unwrap();

        assert_eq!(h.service.count().await.unwrap(), 0);
        assert_eq!(h.stored_files("courses"), 0);
        assert!(matches!(
            h.service.get(course.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_succeeds_even_if_file_delete_fails() {
        let h = harness::<Course>().await;
        let actor = owner();
        let course = course_with_thumbnail(&h, &actor).await;
        h.storage.fail_deletes(true);

        h.service.delete(&actor, course.id).await.unwrap();
        assert_eq!(h.service.count().await.unwrap(), 0);
    }

    async fn scholarship_with_images(h: &Harness<Scholarship>, actor: &Actor, n: usize) -> Scholarship {
        let scholarship = h
            .service
            .create(
                actor,
                CreateScholarshipRequest {
                    title: "Erasmus".to_string(),
                    provider: None,
                    deadline: None,
                },
                vec![],
            )
            .await
            .unwrap();
        let files = (0..n).map(|_| jpeg(b"img")).collect();
        h.service
            .add_images(actor, scholarship.id, files)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn gallery_remove_by_id_leaves_the_rest() {
        let h = harness::<Scholarship>().await;
        let actor = owner();
        let scholarship = scholarship_with_images(&h, &actor, 3).await;
        assert_eq!(scholarship.images.len(), 3);
        let target = scholarship.images[1].clone();

        let updated = h
            .service
            .remove_image(&actor, scholarship.id, &ImageSelector::Id(target.id.clone()))
            .await
            .unwrap();

        assert_eq!(updated.images.len(), 2);
        assert!(updated.images.iter().all(|r| r.id != target.id));
        assert!(!h.file_exists(&target));
        assert_eq!(h.stored_files("scholarships"), 2);
    }

    #[tokio::test]
    async fn gallery_remove_by_url() {
        let h = harness::<Scholarship>().await;
        let actor = owner();
        let scholarship = scholarship_with_images(&h, &actor, 2).await;
        let target = scholarship.images[0].clone();

        let updated = h
            .service
            .remove_image(&actor, scholarship.id, &ImageSelector::Url(target.url.clone()))
            .await
            .unwrap();
        assert_eq!(updated.images.len(), 1);
        assert_ne!(updated.images[0].url, target.url);
    }

    #[tokio::test]
    async fn gallery_remove_of_unknown_image_is_not_found_and_changes_nothing() {
        let h = harness::<Scholarship>().await;
        let actor = owner();
        let scholarship = scholarship_with_images(&h, &actor, 3).await;
        let deletes = h.storage.delete_calls();

        let result = h
            .service
            .remove_image(
                &actor,
                scholarship.id,
                &ImageSelector::Id("scholarships/unknown.jpg".to_string()),
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        let stored = h.service.get(scholarship.id).await.unwrap();
        assert_eq!(stored.images, scholarship.images);
        assert_eq!(h.storage.delete_calls(), deletes);
    }

    #[tokio::test]
    async fn concurrent_gallery_changes_never_restore_deleted_images() {
        let h = harness::<Scholarship>().await;
        let actor = owner();
        let scholarship = scholarship_with_images(&h, &actor, 1).await;
        let removed = scholarship.images[0].clone();
        h.repository.slow_reads.store(true, Ordering::SeqCst);

        let selector = ImageSelector::Id(removed.id.clone());
        let (remove_result, add_result) = tokio::join!(
            h.service.remove_image(&actor, scholarship.id, &selector),
            h.service.add_images(&actor, scholarship.id, vec![jpeg(b"new")]),
        );
        remove_result.unwrap();
        add_result.unwrap();

        let stored = h.service.get(scholarship.id).await.unwrap();
        assert_eq!(stored.images.len(), 1);
        assert!(stored.images.iter().all(|r| r.id != removed.id));
        assert!(stored.images.iter().all(|r| h.file_exists(r)));
        assert!(!h.file_exists(&removed));
    }

    #[tokio::test]
    async fn concurrent_replacements_leave_a_readable_thumbnail() {
        let h = harness::<Course>().await;
        let actor = owner();
        let course = course_with_thumbnail(&h, &actor).await;
        h.repository.slow_reads.store(true, Ordering::SeqCst);

        let (first, second) = tokio::join!(
            h.service
                .replace_media(&actor, course.id, MediaSlot::Thumbnail, jpeg(b"first")),
            h.service
                .replace_media(&actor, course.id, MediaSlot::Thumbnail, jpeg(b"second")),
        );
        first.unwrap();
        second.unwrap();

        let stored = h.service.get(course.id).await.unwrap();
        assert!(h.file_exists(stored.thumbnail.as_ref().unwrap()));
        // Serialized replacements each delete their predecessor
        assert_eq!(h.stored_files("courses"), 1);
    }

    #[tokio::test]
    async fn reads_follow_the_current_disk_base_url() {
        let h = harness::<Scholarship>().await;
        let actor = owner();
        let scholarship = scholarship_with_images(&h, &actor, 2).await;
        assert!(scholarship.images[0].url.starts_with("http://h/"));

        let moved: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(h.root_path.clone(), "https://cdn.example/files".to_string())
                .await
                .unwrap(),
        );
        let router = StorageRouter::new(StorageMode::Auto, vec![moved]).unwrap();
        let service = MediaLifecycleService::new(
            h.repository.clone() as Arc<dyn RecordRepository<Scholarship>>,
            Arc::new(router),
        );

        let fetched = service.get(scholarship.id).await.unwrap();
        let target = fetched.images[0].clone();
        assert_eq!(
            target.url,
            format!("https://cdn.example/files/{}", target.id)
        );

        let updated = service
            .remove_image(&actor, scholarship.id, &ImageSelector::Url(target.url.clone()))
            .await
            .unwrap();
        assert_eq!(updated.images.len(), 1);
        assert!(!h.file_exists(&target));
    }

    #[tokio::test]
    async fn add_images_rolls_back_on_partial_failure() {
        let h = harness::<Scholarship>().await;
        let actor = owner();
        let scholarship = scholarship_with_images(&h, &actor, 1).await;
        h.storage.fail_uploads_after(1, Failure::Upload);

        let result = h
            .service
            .add_images(&actor, scholarship.id, vec![jpeg(b"a"), jpeg(b"b")])
            .await;

        assert!(result.is_err());
        assert_eq!(h.service.get(scholarship.id).await.unwrap().images.len(), 1);
        assert_eq!(h.stored_files("scholarships"), 1);
    }

    #[tokio::test]
    async fn gallery_operations_require_a_gallery() {
        let h = harness::<Course>().await;
        let actor = owner();
        let course = course_with_thumbnail(&h, &actor).await;

        let result = h
            .service
            .add_images(&actor, course.id, vec![jpeg(b"a")])
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn reads_resolve_relative_urls() {
        let h = harness::<Course>().await;
        let mut course = Course::from_draft(course_draft(), Uuid::new_v4());
        course.thumbnail = Some(StorageReference::new(
            StorageBackend::Disk,
            "courses/legacy.jpg",
            "/files/courses/legacy.jpg",
        ));
        h.repository.insert(&course).await.unwrap();

        let fetched = h.service.get(course.id).await.unwrap();
        assert_eq!(
            fetched.thumbnail.unwrap().url,
            "http://h/courses/legacy.jpg"
        );

        let listed = h.service.list(10, 0).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(
            listed[0].thumbnail.as_ref().unwrap().url,
            "http://h/courses/legacy.jpg"
        );
    }
}
