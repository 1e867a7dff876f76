//! Service layer for the message board.
//! - `board`: message rules, the file-backed store and the command boundary.
//! - `storage`: generic JSON document persistence behind a single lock.
//! - Provides clear error types and documented interfaces.

pub mod board;
pub mod clock;
pub mod errors;
pub mod pagination;
pub mod runtime;
pub mod storage;
