//! Repositories for database operations
//!
//! Every query on a resource table is scoped by the owning user's id, so a
//! row belonging to another account behaves exactly like a missing one.

pub mod diary;
pub mod memorial;
pub mod message;
pub mod photo;
pub mod todo;
pub mod user;

pub use diary::DiaryRepository;
pub use memorial::MemorialRepository;
pub use message::MessageRepository;
pub use photo::PhotoRepository;
pub use todo::TodoRepository;
pub use user::UserRepository;
