//! Recording sessions: event accumulation, bookmarks and time sources.

pub mod clock;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{Bookmark, EventStore, Session, SharedEventStore, StoreState};
