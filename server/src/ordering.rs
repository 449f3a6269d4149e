//! List and item ordering, completion and validation rules.
//!
//! Everything here is a plain function over caller-owned records. Only
//! [`mark_all_complete`] mutates its argument; the rest are pure.
//!
//! # Display order
//!
//! [`sort_for_display`] is a two-key stable sort. The primary key is the
//! completion bucket (incomplete before complete), the secondary key is the
//! lowercase title. Records whose keys are equal keep their input order.
//!
//! ```rust
//! use todolists_server::ordering::{is_item_complete, sort_for_display};
//! use todolists_server::types::Item;
//!
//! let mut done = Item::new("apples");
//! done.completed = true;
//! let items = vec![done, Item::new("Zucchini"), Item::new("bread")];
//!
//! let titles: Vec<&str> = sort_for_display(&items, is_item_complete)
//!     .into_iter()
//!     .map(|item| item.title.as_str())
//!     .collect();
//! assert_eq!(titles, ["bread", "Zucchini", "apples"]);
//! ```

use crate::error::{TitleSubject, ValidationError};
use crate::types::{Item, Titled, TodoList};

/// Shortest accepted title, in characters, after trimming.
pub const MIN_TITLE_LENGTH: usize = 1;

/// Longest accepted title, in characters, after trimming.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Validates a list title against length limits and the titles of `existing`.
///
/// `title` is trimmed before either check runs. The uniqueness check is an
/// exact, case-sensitive comparison and runs before the length check. When
/// renaming, pass every list except the one being renamed.
///
/// # Errors
///
/// - [`ValidationError::DuplicateTitle`] if some list in `existing` already
///   has exactly this title
/// - [`ValidationError::InvalidLength`] if the trimmed title is empty or
///   longer than [`MAX_TITLE_LENGTH`] characters
pub fn validate_list_title<'a, I>(title: &str, existing: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = &'a TodoList>,
{
    let title = title.trim();
    if existing.into_iter().any(|list| list.title == title) {
        return Err(ValidationError::DuplicateTitle);
    }

    check_length(title, TitleSubject::List)
}

/// Validates an item title against length limits.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidLength`] if the trimmed title is empty
/// or longer than [`MAX_TITLE_LENGTH`] characters.
pub fn validate_item_title(title: &str) -> Result<(), ValidationError> {
    check_length(title, TitleSubject::Item)
}

fn check_length(title: &str, subject: TitleSubject) -> Result<(), ValidationError> {
    let length = title.trim().chars().count();
    if (MIN_TITLE_LENGTH..=MAX_TITLE_LENGTH).contains(&length) {
        Ok(())
    } else {
        Err(ValidationError::InvalidLength { subject })
    }
}

/// Returns the first list whose identifier equals `id`.
pub fn find_list_by_id<'a>(id: &str, lists: &'a [TodoList]) -> Option<&'a TodoList> {
    lists.iter().find(|list| list.id == id)
}

/// Mutable counterpart of [`find_list_by_id`].
pub fn find_list_by_id_mut<'a>(id: &str, lists: &'a mut [TodoList]) -> Option<&'a mut TodoList> {
    lists.iter_mut().find(|list| list.id == id)
}

/// Returns the first item whose identifier equals `id`.
pub fn find_item_by_id<'a>(id: &str, items: &'a [Item]) -> Option<&'a Item> {
    items.iter().find(|item| item.id == id)
}

/// Mutable counterpart of [`find_item_by_id`].
pub fn find_item_by_id_mut<'a>(id: &str, items: &'a mut [Item]) -> Option<&'a mut Item> {
    items.iter_mut().find(|item| item.id == id)
}

/// A list is complete when it has at least one item and none are outstanding.
pub fn is_list_complete(list: &TodoList) -> bool {
    !list.items.is_empty() && remaining_count(list) == 0
}

pub fn is_item_complete(item: &Item) -> bool {
    item.completed
}

/// Number of items not yet completed.
pub fn remaining_count(list: &TodoList) -> usize {
    list.items.iter().filter(|item| !item.completed).count()
}

/// Marks every item of `list` completed, in place.
///
/// Returns how many items changed state. An empty list is left untouched.
pub fn mark_all_complete(list: &mut TodoList) -> usize {
    let mut changed = 0;
    for item in list.items.iter_mut().filter(|item| !item.completed) {
        item.completed = true;
        changed += 1;
    }
    changed
}

/// Orders records for display: incomplete first, then complete, each bucket
/// by case-insensitive title.
///
/// `is_complete` decides the bucket so the same ordering serves both lists
/// ([`is_list_complete`]) and items ([`is_item_complete`]). The sort is
/// stable.
pub fn sort_for_display<'a, T, F>(records: &'a [T], is_complete: F) -> Vec<&'a T>
where
    T: Titled,
    F: Fn(&T) -> bool,
{
    let mut sorted: Vec<&T> = records.iter().collect();
    sorted.sort_by_cached_key(|record| (is_complete(*record), record.title().to_lowercase()));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(id: &str, title: &str) -> TodoList {
        TodoList {
            id: id.to_string(),
            title: title.to_string(),
            items: Vec::new(),
        }
    }

    fn item(id: &str, title: &str, completed: bool) -> Item {
        Item {
            id: id.to_string(),
            title: title.to_string(),
            completed,
        }
    }

    fn list_with(items: Vec<Item>) -> TodoList {
        TodoList {
            items,
            ..list("l", "List")
        }
    }

    // ========================================================================
    // Validation
    // ========================================================================

    #[test]
    fn list_title_accepts_normal_title() {
        let lists = vec![list("a", "Groceries")];
        assert!(validate_list_title("Chores", &lists).is_ok());
    }

    #[test]
    fn list_title_rejects_exact_duplicate() {
        let lists = vec![list("a", "Groceries")];
        assert_eq!(
            validate_list_title("Groceries", &lists),
            Err(ValidationError::DuplicateTitle)
        );
    }

    #[test]
    fn list_title_uniqueness_is_case_sensitive() {
        let lists = vec![list("a", "Groceries")];
        assert!(validate_list_title("groceries", &lists).is_ok());
    }

    #[test]
    fn list_title_rejects_empty_and_blank() {
        let expected = Err(ValidationError::InvalidLength {
            subject: TitleSubject::List,
        });
        assert_eq!(validate_list_title("", &[]), expected);
        assert_eq!(validate_list_title("   ", &[]), expected);
    }

    #[test]
    fn list_title_length_boundaries() {
        let hundred = "x".repeat(100);
        let hundred_one = "x".repeat(101);
        assert!(validate_list_title("x", &[]).is_ok());
        assert!(validate_list_title(&hundred, &[]).is_ok());
        assert!(matches!(
            validate_list_title(&hundred_one, &[]),
            Err(ValidationError::InvalidLength { .. })
        ));
    }

    #[test]
    fn list_title_length_counts_characters_not_bytes() {
        let title = "é".repeat(100);
        assert!(title.len() > 100);
        assert!(validate_list_title(&title, &[]).is_ok());
    }

    #[test]
    fn list_title_length_ignores_surrounding_whitespace() {
        let padded = format!("  {}  ", "x".repeat(100));
        assert!(validate_list_title(&padded, &[]).is_ok());
    }

    #[test]
    fn padded_title_gets_same_verdict_as_trimmed() {
        let lists = vec![list("a", "Groceries")];
        assert_eq!(
            validate_list_title(" Groceries ", &lists),
            Err(ValidationError::DuplicateTitle)
        );
        assert_eq!(
            validate_list_title(" Groceries ", &lists),
            validate_list_title("Groceries", &lists)
        );
        assert!(validate_list_title(" groceries ", &lists).is_ok());
    }

    #[test]
    fn duplicate_check_runs_before_length_check() {
        let long = "y".repeat(150);
        let lists = vec![list("a", &long), list("b", "")];
        assert_eq!(
            validate_list_title(&long, &lists),
            Err(ValidationError::DuplicateTitle)
        );
        assert_eq!(
            validate_list_title("", &lists),
            Err(ValidationError::DuplicateTitle)
        );
    }

    #[test]
    fn rename_can_exclude_the_list_itself() {
        let lists = vec![list("a", "Groceries"), list("b", "Chores")];
        let others = lists.iter().filter(|l| l.id != "a");
        assert!(validate_list_title("Groceries", others).is_ok());

        let others = lists.iter().filter(|l| l.id != "a");
        assert_eq!(
            validate_list_title("Chores", others),
            Err(ValidationError::DuplicateTitle)
        );
    }

    #[test]
    fn item_title_length_rules() {
        assert!(validate_item_title("Milk").is_ok());
        assert!(validate_item_title(&"m".repeat(100)).is_ok());
        assert_eq!(
            validate_item_title(""),
            Err(ValidationError::InvalidLength {
                subject: TitleSubject::Item
            })
        );
        assert!(validate_item_title(&"m".repeat(101)).is_err());
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    #[test]
    fn find_list_in_empty_collection_is_none() {
        assert!(find_list_by_id("x", &[]).is_none());
    }

    #[test]
    fn find_list_returns_matching_record() {
        let lists = vec![list("a", "First"), list("b", "Second")];
        let found = find_list_by_id("b", &lists).unwrap();
        assert_eq!(found.title, "Second");
        assert!(find_list_by_id("c", &lists).is_none());
    }

    #[test]
    fn find_list_returns_first_of_duplicate_ids() {
        let lists = vec![list("a", "First"), list("a", "Shadow")];
        assert_eq!(find_list_by_id("a", &lists).unwrap().title, "First");
    }

    #[test]
    fn find_list_mut_allows_edit() {
        let mut lists = vec![list("a", "First")];
        find_list_by_id_mut("a", &mut lists).unwrap().title = "Renamed".to_string();
        assert_eq!(lists[0].title, "Renamed");
    }

    #[test]
    fn find_item_by_id_matches_and_misses() {
        let mut items = vec![item("1", "Milk", false), item("2", "Eggs", true)];
        assert_eq!(find_item_by_id("2", &items).unwrap().title, "Eggs");
        assert!(find_item_by_id("3", &items).is_none());

        find_item_by_id_mut("1", &mut items).unwrap().completed = true;
        assert!(items[0].completed);
    }

    // ========================================================================
    // Completion
    // ========================================================================

    #[test]
    fn empty_list_is_not_complete() {
        assert!(!is_list_complete(&list_with(vec![])));
    }

    #[test]
    fn list_with_only_completed_items_is_complete() {
        assert!(is_list_complete(&list_with(vec![item("1", "a", true)])));
    }

    #[test]
    fn list_with_outstanding_item_is_not_complete() {
        let l = list_with(vec![item("1", "a", true), item("2", "b", false)]);
        assert!(!is_list_complete(&l));
    }

    #[test]
    fn item_completion_reflects_flag() {
        assert!(is_item_complete(&item("1", "a", true)));
        assert!(!is_item_complete(&item("1", "a", false)));
    }

    #[test]
    fn remaining_count_counts_incomplete_items() {
        let l = list_with(vec![
            item("1", "a", false),
            item("2", "b", true),
            item("3", "c", false),
        ]);
        assert_eq!(remaining_count(&l), 2);
        assert_eq!(remaining_count(&list_with(vec![])), 0);
    }

    #[test]
    fn mark_all_complete_completes_every_item() {
        let mut l = list_with(vec![item("1", "a", false), item("2", "b", true)]);
        let changed = mark_all_complete(&mut l);

        assert_eq!(changed, 1);
        assert!(l.items.iter().all(|i| i.completed));
        assert_eq!(remaining_count(&l), 0);
        assert!(is_list_complete(&l));
    }

    #[test]
    fn mark_all_complete_on_empty_list_is_noop() {
        let mut l = list_with(vec![]);
        assert_eq!(mark_all_complete(&mut l), 0);
        assert!(l.items.is_empty());
        assert!(!is_list_complete(&l));
    }

    // ========================================================================
    // Display order
    // ========================================================================

    fn titles<T: Titled>(records: &[&T]) -> Vec<String> {
        records.iter().map(|r| r.title().to_string()).collect()
    }

    #[test]
    fn sort_puts_incomplete_before_complete() {
        let items = vec![
            item("1", "a", true),
            item("2", "b", false),
            item("3", "c", true),
            item("4", "d", false),
        ];
        let sorted = sort_for_display(&items, is_item_complete);
        assert_eq!(titles(&sorted), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn sort_is_case_insensitive_within_bucket() {
        let items = vec![
            item("1", "banana", false),
            item("2", "Apple", false),
            item("3", "cherry", false),
            item("4", "Date", true),
            item("5", "apricot", true),
        ];
        let sorted = sort_for_display(&items, is_item_complete);
        assert_eq!(
            titles(&sorted),
            vec!["Apple", "banana", "cherry", "apricot", "Date"]
        );
    }

    #[test]
    fn sort_keeps_input_order_for_equal_keys() {
        let items = vec![
            item("first", "Milk", false),
            item("done", "milk", true),
            item("second", "MILK", false),
            item("third", "milk", false),
        ];
        let sorted = sort_for_display(&items, is_item_complete);
        let ids: Vec<&str> = sorted.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third", "done"]);
    }

    #[test]
    fn sort_of_empty_slice_is_empty() {
        let items: Vec<Item> = Vec::new();
        assert!(sort_for_display(&items, is_item_complete).is_empty());
    }

    #[test]
    fn sort_orders_lists_by_list_completion() {
        let done = list_with(vec![item("1", "x", true)]);
        let lists = vec![
            TodoList {
                title: "Alpha".to_string(),
                ..done.clone()
            },
            TodoList {
                title: "beta".to_string(),
                ..list_with(vec![])
            },
            TodoList {
                title: "Gamma".to_string(),
                ..list_with(vec![item("2", "y", false)])
            },
        ];
        let sorted = sort_for_display(&lists, is_list_complete);
        assert_eq!(titles(&sorted), vec!["beta", "Gamma", "Alpha"]);
    }

    #[test]
    fn sort_honours_injected_predicate() {
        let items = vec![item("1", "b", false), item("2", "a", false)];
        let sorted = sort_for_display(&items, |i: &Item| i.title == "a");
        assert_eq!(titles(&sorted), vec!["b", "a"]);
    }

    #[test]
    fn sorted_output_satisfies_ordering_properties() {
        // Deterministic pseudo-random input covering mixed case and duplicates.
        let words = ["pear", "Apple", "apple", "kiwi", "Fig", "fig", "LIME", "date"];
        let mut seed: u32 = 7;
        let items: Vec<Item> = (0..64)
            .map(|n| {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let word = words[(seed >> 16) as usize % words.len()];
                item(&n.to_string(), word, (seed >> 8) % 3 == 0)
            })
            .collect();

        let sorted = sort_for_display(&items, is_item_complete);
        assert_eq!(sorted.len(), items.len());

        let boundary = sorted.iter().position(|i| i.completed).unwrap_or(sorted.len());
        assert!(sorted[boundary..].iter().all(|i| i.completed));

        for pair in sorted.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.completed != b.completed {
                continue;
            }
            let (ka, kb) = (a.title.to_lowercase(), b.title.to_lowercase());
            assert!(ka <= kb);
            if ka == kb {
                let ia: usize = a.id.parse().unwrap();
                let ib: usize = b.id.parse().unwrap();
                assert!(ia < ib, "equal keys must keep input order");
            }
        }
    }
}
