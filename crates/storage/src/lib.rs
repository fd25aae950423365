#![forbid(unsafe_code)]

pub mod feed;
pub mod repository;
pub mod sqlite;

pub use feed::{CheckInFeed, DEFAULT_WINDOW_SIZE};
pub use repository::{
    CheckInRepository, InMemoryRepository, RosterRepository, Storage, StorageError,
    TemplateFilter, TemplateRepository,
};
