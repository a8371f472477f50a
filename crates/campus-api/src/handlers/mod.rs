pub mod files;
pub mod gallery;
pub mod health;
pub mod records;
