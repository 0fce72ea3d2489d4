//! Ordered environment maps.

use indexmap::IndexMap;

/// String-keyed, string-valued environment in document order
pub type Env = IndexMap<String, String>;

/// Combine two env layers into a new map.
///
/// Keys from `overrides` replace same-named keys in `base` in place, so a
/// replaced key keeps the position it had in `base`. Keys only present in
/// `overrides` are appended in their own order.
#[must_use]
pub fn merge_env(base: &Env, overrides: &Env) -> Env {
    let mut merged = base.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Keys that `overrides` would replace in `base` with a different value
pub fn overridden_keys<'a>(base: &'a Env, overrides: &'a Env) -> impl Iterator<Item = &'a str> {
    overrides
        .iter()
        .filter(|(key, value)| base.get(*key).is_some_and(|old| old != *value))
        .map(|(key, _)| key.as_str())
}
