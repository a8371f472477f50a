//! Record persistence
//!
//! [`RecordRepository`] is the seam the lifecycle service persists through.
//! `PgRecordRepository` keeps every collection in one JSONB document table;
//! `InMemoryRepository` backs development runs without a database and tests.

pub mod memory;
pub mod postgres;
pub mod repository;

pub use memory::InMemoryRepository;
pub use postgres::PgRecordRepository;
pub use repository::RecordRepository;
