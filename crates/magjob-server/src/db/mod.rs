pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

use std::sync::Arc;

pub use memory::MemoryStore;
pub use postgres::Database;
pub use repository::{
    CalendarRepository, ChatRepository, NotificationRepository, RepoResult, ShiftRepository,
};

/// Storage handles shared by the services.
#[derive(Clone)]
pub struct Repositories {
    pub calendar: Arc<dyn CalendarRepository>,
    pub shifts: Arc<dyn ShiftRepository>,
    pub chats: Arc<dyn ChatRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    pub fn postgres(db: Database) -> Self {
        Self::from_store(db)
    }

    pub fn memory() -> Self {
        Self::from_store(MemoryStore::new())
    }

    fn from_store<S>(store: S) -> Self
    where
        S: CalendarRepository
            + ShiftRepository
            + ChatRepository
            + NotificationRepository
            + Clone
            + 'static,
    {
        Self {
            calendar: Arc::new(store.clone()),
            shifts: Arc::new(store.clone()),
            chats: Arc::new(store.clone()),
            notifications: Arc::new(store),
        }
    }
}
