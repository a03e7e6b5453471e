//! Recursive-update merge of configuration mappings
//!
//! Later sources override earlier ones at the leaf level. Mappings present
//! on both sides are merged key by key instead of being replaced wholesale.
//! Sequences and scalars are replaced.

use serde_yaml::{Mapping, Value};

/// Merge `overlay` into `base` in place.
pub fn rupdate(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            rupdate_mapping(base_map, overlay_map);
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Merge mapping `overlay` into mapping `base` in place.
pub fn rupdate_mapping(base: &mut Mapping, overlay: &Mapping) {
    for (key, overlay_value) in overlay {
        match base.get_mut(key) {
            Some(base_value) => rupdate(base_value, overlay_value),
            None => {
                base.insert(key.clone(), overlay_value.clone());
            }
        }
    }
}

/// Copy the first mapping and merge the rest into it in order.
pub fn merge_all<'a>(configs: impl IntoIterator<Item = &'a Mapping>) -> Mapping {
    let mut configs = configs.into_iter();
    let mut merged = configs.next().cloned().unwrap_or_default();
    for config in configs {
        rupdate_mapping(&mut merged, config);
    }
    merged
}

/// Build a nested mapping from a dotted key, e.g. `a.b` -> `{a: {b: value}}`.
pub fn mapping_from_dotted(key: &str, value: Value) -> Mapping {
    let mut parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    let mut current = value;
    let Some(first) = parts.first().copied() else {
        return Mapping::new();
    };
    while parts.len() > 1 {
        let Some(last) = parts.pop() else { break };
        let mut inner = Mapping::new();
        inner.insert(Value::from(last), current);
        current = Value::Mapping(inner);
    }
    let mut root = Mapping::new();
    root.insert(Value::from(first), current);
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn yaml(s: &str) -> Mapping {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn nested_keys_merge_instead_of_replacing() {
        let mut base = yaml("a: {x: 1, keep: true}\nb: 1\n");
        rupdate_mapping(&mut base, &yaml("a: {x: 2, y: 3}\nc: 4\n"));
        assert_eq!(base, yaml("a: {x: 2, keep: true, y: 3}\nb: 1\nc: 4\n"));
    }

    #[test]
    fn sequences_are_replaced() {
        let mut base = yaml("tools: [a, b]\n");
        rupdate_mapping(&mut base, &yaml("tools: [c]\n"));
        assert_eq!(base, yaml("tools: [c]\n"));
    }

    #[test]
    fn scalar_overlay_replaces_mapping() {
        let mut base = yaml("a: {x: 1}\n");
        rupdate_mapping(&mut base, &yaml("a: off\n"));
        assert_eq!(base, yaml("a: off\n"));
    }

    #[test]
    fn merge_all_does_not_touch_inputs() {
        let first = yaml("a: {x: 1}\n");
        let second = yaml("a: {y: 2}\n");
        let merged = merge_all([&first, &second]);
        assert_eq!(merged, yaml("a: {x: 1, y: 2}\n"));
        assert_eq!(first, yaml("a: {x: 1}\n"));
    }

    #[test]
    fn merge_all_of_nothing_is_empty() {
        assert!(merge_all(std::iter::empty()).is_empty());
    }

    #[test]
    fn dotted_keys_nest() {
        assert_eq!(
            mapping_from_dotted("apps.obs_planner.site_name", Value::from("lmt")),
            yaml("apps: {obs_planner: {site_name: lmt}}\n")
        );
        assert_eq!(mapping_from_dotted("x", Value::from(1)), yaml("x: 1\n"));
        assert!(mapping_from_dotted("", Value::Null).is_empty());
    }
}
