//! Application state.
//!
//! One `MediaLifecycleService` per record type, all sharing the storage
//! router. Generic handlers reach the right service through [`Collection`].

use campus_core::models::{
    Book, Concours, Contestant, Course, MediaRecord, Notification, Question, Scholarship, Skill,
    Solution,
};
use campus_core::Config;
use campus_db::{InMemoryRepository, PgRecordRepository, RecordRepository};
use campus_services::MediaLifecycleService;
use campus_storage::StorageRouter;
use sqlx::PgPool;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub storage: Arc<StorageRouter>,
    /// `None` when running on in-memory repositories
    pub pool: Option<PgPool>,
    pub courses: MediaLifecycleService<Course>,
    pub skills: MediaLifecycleService<Skill>,
    pub contestants: MediaLifecycleService<Contestant>,
    pub notifications: MediaLifecycleService<Notification>,
    pub questions: MediaLifecycleService<Question>,
    pub concours: MediaLifecycleService<Concours>,
    pub solutions: MediaLifecycleService<Solution>,
    pub books: MediaLifecycleService<Book>,
    pub scholarships: MediaLifecycleService<Scholarship>,
}

fn service<T: MediaRecord>(
    storage: &Arc<StorageRouter>,
    pool: Option<&PgPool>,
) -> MediaLifecycleService<T> {
    let repository: Arc<dyn RecordRepository<T>> = match pool {
        Some(pool) => Arc::new(PgRecordRepository::<T>::new(pool.clone())),
        None => Arc::new(InMemoryRepository::<T>::new()),
    };
    MediaLifecycleService::new(repository, storage.clone())
}

impl AppState {
    pub fn new(config: Config, storage: Arc<StorageRouter>, pool: Option<PgPool>) -> Self {
        let db = pool.as_ref();
        AppState {
            courses: service(&storage, db),
            skills: service(&storage, db),
            contestants: service(&storage, db),
            notifications: service(&storage, db),
            questions: service(&storage, db),
            concours: service(&storage, db),
            solutions: service(&storage, db),
            books: service(&storage, db),
            scholarships: service(&storage, db),
            config,
            storage,
            pool,
        }
    }
}

/// A record type served under `/api/v1/<COLLECTION>`
pub trait Collection: MediaRecord {
    fn service(state: &AppState) -> &MediaLifecycleService<Self>;
}

macro_rules! collection {
    ($($record:ty => $field:ident),* $(,)?) => {
        $(
            impl Collection for $record {
                fn service(state: &AppState) -> &MediaLifecycleService<Self> {
                    &state.$field
                }
            }
        )*
    };
}

collection! {
    Course => courses,
    Skill => skills,
    Contestant => contestants,
    Notification => notifications,
    Question => questions,
    Concours => concours,
    Solution => solutions,
    Book => books,
    Scholarship => scholarships,
}
