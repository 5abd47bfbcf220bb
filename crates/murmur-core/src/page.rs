//! Ordering and page assembly shared by every keyset listing.
//!
//! Listings are ordered by `(timestamp DESC, id DESC)`. A store answers a
//! [`PageRequest`] with at most `limit + 1` rows strictly after the cursor;
//! [`Page::from_overfetch`] uses the extra row to decide whether a
//! `next_cursor` is handed out.

use std::cmp::Ordering;

use serde::Serialize;

use crate::cursor::Cursor;

/// Anything that can appear in a keyset listing.
pub trait Keyed {
  fn sort_key(&self) -> Cursor;
}

/// Comparator for listing order: newest first, ties broken by id descending.
pub fn descending<T: Keyed>(a: &T, b: &T) -> Ordering {
  b.sort_key().cmp(&a.sort_key())
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// One page worth of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  /// `None` on the first page: no lower bound.
  pub after: Option<Cursor>,
  pub limit: usize,
}

impl PageRequest {
  pub fn first(limit: usize) -> Self { Self { after: None, limit: limit.max(1) } }

  pub fn after(cursor: Cursor, limit: usize) -> Self {
    Self { after: Some(cursor), limit: limit.max(1) }
  }

  /// Resolve a client-supplied limit against the configured default and
  /// ceiling. The result is always in `1..=max`.
  pub fn clamped(
    after: Option<Cursor>,
    requested: Option<usize>,
    default: usize,
    max: usize,
  ) -> Self {
    let max = max.max(1);
    let limit = requested.unwrap_or(default).clamp(1, max);
    Self { after, limit }
  }

  /// How many rows a store should fetch: one more than the page size.
  pub fn fetch_limit(&self) -> usize { self.limit + 1 }

  /// Whether `item` belongs after this request's lower bound.
  pub fn admits<T: Keyed>(&self, item: &T) -> bool {
    self.after.is_none_or(|c| c.admits(&item.sort_key()))
  }
}

// ─── Page ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
  pub items:       Vec<T>,
  /// Cursor of the last item when more items follow, otherwise `None`.
  pub next_cursor: Option<Cursor>,
}

impl<T: Keyed> Page<T> {
  /// Assemble a page from rows already in listing order, as returned by a
  /// store queried with [`PageRequest::fetch_limit`].
  pub fn from_overfetch(mut rows: Vec<T>, limit: usize) -> Self {
    let next_cursor = if rows.len() > limit {
      rows.truncate(limit);
      rows.last().map(Keyed::sort_key)
    } else {
      None
    };
    Self { items: rows, next_cursor }
  }
}

impl<T> Page<T> {
  pub fn empty() -> Self { Self { items: Vec::new(), next_cursor: None } }

  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
    Page {
      items:       self.items.into_iter().map(f).collect(),
      next_cursor: self.next_cursor,
    }
  }
}

/// Reference implementation of the store range query over an in-memory
/// snapshot.
pub fn paginate<T: Keyed + Clone>(items: &[T], request: &PageRequest) -> Page<T> {
  let mut rows: Vec<T> = items.iter().filter(|i| request.admits(*i)).cloned().collect();
  rows.sort_by(descending);
  rows.truncate(request.fetch_limit());
  Page::from_overfetch(rows, request.limit)
}
