use crate::error::EventError;
use crate::types::{Event, EventId};

pub trait EventRepository {
    fn insert(&self, event: &Event) -> Result<(), EventError>;
    fn update(&self, event: &Event) -> Result<(), EventError>;
    fn get(&self, id: &EventId) -> Result<Option<Event>, EventError>;
    fn get_by_slug(&self, slug: &str) -> Result<Option<Event>, EventError>;
    /// Whether an event other than `exclude` already owns `slug`.
    fn slug_taken(&self, slug: &str, exclude: &EventId) -> Result<bool, EventError>;
    /// All events, newest first.
    fn list(&self) -> Result<Vec<Event>, EventError>;
    /// Events other than `exclude` carrying at least one of `tags`.
    fn list_sharing_tags(&self, tags: &[String], exclude: &EventId)
    -> Result<Vec<Event>, EventError>;
}
