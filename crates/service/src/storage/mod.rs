//! Storage abstractions for service layer
//!
//! Contains the file-backed JSON document store the message board persists through.

pub mod json_document_store;
