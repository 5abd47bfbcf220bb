//! Core types and trait definitions for the Murmur feed backend.
//!
//! This crate has no HTTP or database dependencies. It owns the two pieces
//! every other crate leans on: the opaque keyset pagination [`cursor`] and
//! the idempotent interaction [`guard`].

// Native `async fn` in traits, with `Send` spelled out on the trait methods.
// Silence the advisory lint about unbounded returned futures.
#![allow(async_fn_in_trait)]

pub mod content;
pub mod cursor;
pub mod error;
pub mod guard;
pub mod id;
pub mod identity;
pub mod interaction;
pub mod page;
pub mod store;

pub use cursor::{Cursor, CursorError};
pub use error::{Error, Result};
pub use id::ObjectId;
