//! Merging of several interpolated documents into one.

use serde_yaml::{Mapping, Value};

/// Merges `overlay` into `base`: nested mappings merge key by key, any other
/// value in `overlay` replaces the one in `base`.
#[must_use]
pub fn merge_mappings(mut base: Mapping, overlay: Mapping) -> Mapping {
    for (key, value) in overlay {
        let merged = match (base.get_mut(&key), value) {
            (Some(Value::Mapping(existing)), Value::Mapping(incoming)) => {
                Value::Mapping(merge_mappings(std::mem::take(existing), incoming))
            }
            (_, incoming) => incoming,
        };
        let _ = base.insert(key, merged);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).expect("yaml")
    }

    #[test]
    fn later_scalars_win() {
        let merged = merge_mappings(
            dict("services:\n  web:\n    image: a\n    user: root\n"),
            dict("services:\n  web:\n    image: b\n"),
        );
        assert_eq!(merged, dict("services:\n  web:\n    image: b\n    user: root\n"));
    }

    #[test]
    fn services_from_both_files_are_kept() {
        let merged = merge_mappings(
            dict("services:\n  web:\n    image: a\n"),
            dict("services:\n  db:\n    image: b\n"),
        );
        let services = merged["services"].as_mapping().expect("services");
        assert_eq!(services.len(), 2);
    }

    #[test]
    fn sequences_are_replaced() {
        let merged = merge_mappings(
            dict("services:\n  web:\n    command: [a, b]\n"),
            dict("services:\n  web:\n    command: [c]\n"),
        );
        assert_eq!(merged["services"]["web"]["command"], dict("x: [c]\n")["x"]);
    }
}
