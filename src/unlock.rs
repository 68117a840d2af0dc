//! Sequential unlocking of content within one section or course.
//!
//! The first item of a grouping is always open. Each later item opens once
//! the item directly before it has recorded progress at or above the
//! threshold. Items are ordered by `(unlock_order, id)`, so two items sharing
//! an unlock order are sequenced by id.

use std::collections::{HashMap, HashSet};

/// Progress percentage the preceding item must reach before the next opens.
pub const DEFAULT_UNLOCK_THRESHOLD: f64 = 80.0;

/// Content that takes part in sequential unlocking.
pub trait Sequenced {
    fn id(&self) -> &str;
    fn unlock_order(&self) -> i32;
}

/// Returns the ids of unlocked items. Missing progress entries count as 0.
#[must_use]
pub fn compute_unlocked<T: Sequenced>(
    items: &[T],
    progress: &HashMap<String, f64>,
    threshold: f64,
) -> HashSet<String> {
    let mut ordered: Vec<&T> = items.iter().collect();
    ordered.sort_by(|a, b| {
        a.unlock_order()
            .cmp(&b.unlock_order())
            .then_with(|| a.id().cmp(b.id()))
    });

    let mut unlocked = HashSet::with_capacity(ordered.len());
    let mut previous: Option<&T> = None;

    for item in ordered {
        let open = match previous {
            None => true,
            Some(prev) => progress.get(prev.id()).copied().unwrap_or(0.0) >= threshold,
        };
        if open {
            unlocked.insert(item.id().to_string());
        }
        previous = Some(item);
    }

    unlocked
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item {
        id: &'static str,
        order: i32,
    }

    impl Sequenced for Item {
        fn id(&self) -> &str {
            self.id
        }

        fn unlock_order(&self) -> i32 {
            self.order
        }
    }

    fn three() -> Vec<Item> {
        vec![
            Item { id: "a", order: 1 },
            Item { id: "b", order: 2 },
            Item { id: "c", order: 3 },
        ]
    }

    fn ids(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn progress(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_no_progress_opens_first_only() {
        let unlocked = compute_unlocked(&three(), &HashMap::new(), DEFAULT_UNLOCK_THRESHOLD);
        assert_eq!(unlocked, ids(&["a"]));
    }

    #[test]
    fn test_threshold_reached_opens_next() {
        let unlocked = compute_unlocked(
            &three(),
            &progress(&[("a", 80.0)]),
            DEFAULT_UNLOCK_THRESHOLD,
        );
        assert_eq!(unlocked, ids(&["a", "b"]));
    }

    #[test]
    fn test_below_threshold_keeps_next_locked() {
        let unlocked = compute_unlocked(
            &three(),
            &progress(&[("a", 79.0)]),
            DEFAULT_UNLOCK_THRESHOLD,
        );
        assert_eq!(unlocked, ids(&["a"]));
    }

    #[test]
    fn test_all_complete_opens_everything() {
        let unlocked = compute_unlocked(
            &three(),
            &progress(&[("a", 100.0), ("b", 100.0)]),
            DEFAULT_UNLOCK_THRESHOLD,
        );
        assert_eq!(unlocked, ids(&["a", "b", "c"]));
    }

    #[test]
    fn test_empty_items() {
        let items: Vec<Item> = Vec::new();
        assert!(compute_unlocked(&items, &progress(&[("a", 100.0)]), 80.0).is_empty());
    }

    #[test]
    fn test_order_field_not_array_position() {
        let items = vec![
            Item { id: "c", order: 30 },
            Item { id: "a", order: 10 },
            Item { id: "b", order: 20 },
        ];
        let unlocked = compute_unlocked(&items, &progress(&[("a", 95.0)]), 80.0);
        assert_eq!(unlocked, ids(&["a", "b"]));
    }

    #[test]
    fn test_only_immediate_predecessor_counts() {
        let unlocked = compute_unlocked(&three(), &progress(&[("b", 90.0)]), 80.0);
        assert_eq!(unlocked, ids(&["a", "c"]));
    }

    #[test]
    fn test_duplicate_order_breaks_tie_by_id() {
        let items = vec![
            Item { id: "y", order: 1 },
            Item { id: "x", order: 1 },
            Item { id: "z", order: 2 },
        ];
        let unlocked = compute_unlocked(&items, &HashMap::new(), 80.0);
        assert_eq!(unlocked, ids(&["x"]));

        let unlocked = compute_unlocked(&items, &progress(&[("x", 80.0)]), 80.0);
        assert_eq!(unlocked, ids(&["x", "y"]));
    }

    #[test]
    fn test_custom_threshold() {
        let unlocked = compute_unlocked(&three(), &progress(&[("a", 50.0)]), 50.0);
        assert_eq!(unlocked, ids(&["a", "b"]));
    }
}
