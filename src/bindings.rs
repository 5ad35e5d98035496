//! Binding resolution
//!
//! Turns a key code and the accumulated press length into the gateway paths
//! that should be fired. Resolution is pure: it only reads the binding table
//! it is handed, so callers decide which config snapshot applies.

use crate::config::{Bindings, Press};
use rand::seq::IteratorRandom;
use rand::Rng;

/// Leading character marking a random alternation, e.g. `|opt1|opt2|opt3`
pub const ALTERNATION_DELIMITER: char = '|';

/// Entry fired when a key is released after `press_length` held ticks.
///
/// The first entry whose threshold is satisfied wins; later entries are not
/// looked at. Keys without bindings, continuous keys, and releases that
/// satisfy no threshold all resolve to `None`.
pub fn resolve_release(bindings: &Bindings, code: u16, press_length: u32) -> Option<&Press> {
    if resolve_held(bindings, code).is_some() {
        return None;
    }
    bindings
        .get(&code)?
        .iter()
        .find(|press| i64::from(press.len) <= i64::from(press_length))
}

/// Path fired on every held tick of a continuous binding.
///
/// Only a key with exactly one entry, threshold [`CONTINUOUS`], and exactly
/// one path is continuous.
///
/// [`CONTINUOUS`]: crate::config::CONTINUOUS
pub fn resolve_held(bindings: &Bindings, code: u16) -> Option<&str> {
    match bindings.get(&code).map(Vec::as_slice) {
        Some([press]) if press.is_continuous() && press.path.len() == 1 => {
            Some(press.path[0].as_str())
        }
        _ => None,
    }
}

pub fn is_alternation(path: &str) -> bool {
    path.starts_with(ALTERNATION_DELIMITER)
}

/// Non-empty choices of an alternation path
pub fn alternatives(path: &str) -> impl Iterator<Item = &str> {
    path.strip_prefix(ALTERNATION_DELIMITER)
        .unwrap_or_default()
        .split(ALTERNATION_DELIMITER)
        .filter(|choice| !choice.is_empty())
}

/// Concrete path to dispatch.
///
/// Literal paths come back unchanged. Alternations pick one choice uniformly
/// at random on every call.
pub fn pick_path<'a, R: Rng + ?Sized>(path: &'a str, rng: &mut R) -> &'a str {
    if !is_alternation(path) {
        return path;
    }
    alternatives(path).choose(rng).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONTINUOUS;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn table(entries: &[(u16, Vec<Press>)]) -> Bindings {
        entries.iter().cloned().collect()
    }

    #[test]
    fn unbound_key_resolves_nothing() {
        let bindings = table(&[(5, vec![Press::new(0, ["play"])])]);

        assert!(resolve_release(&bindings, 6, 0).is_none());
        assert!(resolve_release(&bindings, 6, 100).is_none());
        assert!(resolve_held(&bindings, 6).is_none());
    }

    #[test]
    fn first_satisfied_entry_wins() {
        let bindings = table(&[(
            5,
            vec![
                Press::new(10, ["next"]),
                Press::new(3, ["previous"]),
                Press::new(0, ["playpause"]),
            ],
        )]);

        assert_eq!(resolve_release(&bindings, 5, 12).unwrap().path, ["next"]);
        assert_eq!(resolve_release(&bindings, 5, 10).unwrap().path, ["next"]);
        assert_eq!(resolve_release(&bindings, 5, 4).unwrap().path, ["previous"]);
        assert_eq!(resolve_release(&bindings, 5, 0).unwrap().path, ["playpause"]);
    }

    #[test]
    fn later_matching_entry_is_never_selected() {
        // Both entries match a long press; table order decides.
        let bindings = table(&[(5, vec![Press::new(0, ["short"]), Press::new(5, ["long"])])]);

        assert_eq!(resolve_release(&bindings, 5, 9).unwrap().path, ["short"]);
    }

    #[test]
    fn unsatisfied_threshold_resolves_nothing() {
        let bindings = table(&[(5, vec![Press::new(2, ["volUp"])])]);

        assert!(resolve_release(&bindings, 5, 1).is_none());
        assert!(resolve_release(&bindings, 5, 2).is_some());
    }

    #[test]
    fn continuous_binding_resolves_on_hold() {
        let bindings = table(&[(114, vec![Press::new(CONTINUOUS, ["volume/-1"])])]);
        assert_eq!(resolve_held(&bindings, 114), Some("volume/-1"));
    }

    #[test]
    fn continuous_binding_never_resolves_on_release() {
        let bindings = table(&[(114, vec![Press::new(CONTINUOUS, ["volume/-1"])])]);
        assert!(resolve_release(&bindings, 114, 0).is_none());
        assert!(resolve_release(&bindings, 114, 20).is_none());
    }

    #[test]
    fn continuous_requires_single_entry_and_single_path() {
        let two_entries = table(&[(
            114,
            vec![Press::new(CONTINUOUS, ["volume/-1"]), Press::new(0, ["mute"])],
        )]);
        let two_paths = table(&[(114, vec![Press::new(CONTINUOUS, ["volume/-1", "mute"])])]);
        let regular = table(&[(114, vec![Press::new(0, ["mute"])])]);

        assert!(resolve_held(&two_entries, 114).is_none());
        assert!(resolve_held(&two_paths, 114).is_none());
        assert!(resolve_held(&regular, 114).is_none());
    }

    #[test]
    fn literal_path_is_unchanged() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(pick_path("favorite/Jazz", &mut rng), "favorite/Jazz");
    }

    #[test]
    fn alternation_picks_every_choice() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = HashSet::new();

        for _ in 0..300 {
            let picked = pick_path("|a|b|c", &mut rng);
            assert!(["a", "b", "c"].contains(&picked));
            seen.insert(picked);
        }

        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn alternation_skips_empty_choices() {
        let choices: Vec<&str> = alternatives("|a||b|").collect();
        assert_eq!(choices, ["a", "b"]);
        assert_eq!(alternatives("|").count(), 0);
    }

    #[test]
    fn single_choice_alternation() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick_path("|only", &mut rng), "only");
    }
}
