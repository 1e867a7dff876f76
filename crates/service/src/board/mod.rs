//! Anonymous message board: messages, one level of replies, likes, a short author edit
//! window, soft delete by the author and a 24h expiry purge.

pub mod commands;
pub mod filter;
pub mod model;
pub mod policy;
pub mod repository;
pub mod sort;
pub mod store;

pub use commands::{dispatch, Command, CreateMessage, EditMessage, Outcome};
pub use filter::{FilterSettings, WordFilter};
pub use model::{Message, MessageDocument, MessageState, MessageThread};
pub use policy::BoardPolicy;
pub use repository::MessageRepository;
pub use sort::SortOrder;
pub use store::MessageStore;
