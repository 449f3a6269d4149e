//! Record types for todo lists and their items.
//!
//! Lists and items are fixed-shape records. Identifiers are opaque strings
//! assigned at construction; the rest of the crate only ever compares them
//! for equality.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ordering::{is_item_complete, is_list_complete, remaining_count, sort_for_display};

/// Anything with a display title. Used by the display sort.
pub trait Titled {
    fn title(&self) -> &str;
}

/// A single unit of work inside a [`TodoList`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

impl Item {
    /// Creates an incomplete item with a freshly generated identifier.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            completed: false,
        }
    }
}

impl Titled for Item {
    fn title(&self) -> &str {
        &self.title
    }
}

/// A named, ordered collection of items.
///
/// `items` keeps insertion order; display order is computed on read by
/// [`sort_for_display`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoList {
    pub id: String,
    pub title: String,
    pub items: Vec<Item>,
}

impl TodoList {
    /// Creates an empty list with a freshly generated identifier.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            items: Vec::new(),
        }
    }
}

impl Titled for TodoList {
    fn title(&self) -> &str {
        &self.title
    }
}

/// One row of the `GET /lists` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSummary {
    pub id: String,
    pub title: String,
    pub item_count: usize,
    pub remaining: usize,
    pub completed: bool,
}

impl From<&TodoList> for ListSummary {
    fn from(list: &TodoList) -> Self {
        Self {
            id: list.id.clone(),
            title: list.title.clone(),
            item_count: list.items.len(),
            remaining: remaining_count(list),
            completed: is_list_complete(list),
        }
    }
}

/// A list with its items in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDetail {
    pub id: String,
    pub title: String,
    pub remaining: usize,
    pub completed: bool,
    pub items: Vec<Item>,
}

impl From<&TodoList> for ListDetail {
    fn from(list: &TodoList) -> Self {
        Self {
            id: list.id.clone(),
            title: list.title.clone(),
            remaining: remaining_count(list),
            completed: is_list_complete(list),
            items: sort_for_display(&list.items, is_item_complete)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}
