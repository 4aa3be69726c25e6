//! Detection of service options the stack loader refuses, ignores, or
//! discourages.
//!
//! All detectors are pure functions over raw document trees.

use std::collections::{BTreeMap, BTreeSet};

use serde_yaml::{Mapping, Value};

/// Service keys that abort the conversion, with the advice shown to users.
pub const FORBIDDEN_PROPERTIES: &[(&str, &str)] = &[
    ("extends", "Support for `extends` is not implemented yet."),
    (
        "volume_driver",
        "Instead of setting the volume driver on the service, define a volume using the top-level `volumes` option and specify the driver there.",
    ),
    (
        "volumes_from",
        "To share a volume between services, define it using the top-level `volumes` option and reference it from each service that shares it using the service-level `volumes` option.",
    ),
    ("cpu_quota", "Set resource limits using deploy.resources"),
    ("cpu_shares", "Set resource limits using deploy.resources"),
    ("cpuset", "Set resource limits using deploy.resources"),
    ("mem_limit", "Set resource limits using deploy.resources"),
    ("memswap_limit", "Set resource limits using deploy.resources"),
];

/// Service keys that are accepted but have no effect on a stack.
pub const UNSUPPORTED_PROPERTIES: &[&str] = &[
    "build",
    "cap_add",
    "cap_drop",
    "cgroup_parent",
    "devices",
    "domainname",
    "external_links",
    "ipc",
    "links",
    "mac_address",
    "network_mode",
    "privileged",
    "restart",
    "security_opt",
    "shm_size",
    "sysctls",
    "tmpfs",
    "userns_mode",
];

/// Service keys that still work but should no longer be used.
pub const DEPRECATED_PROPERTIES: &[(&str, &str)] = &[
    ("container_name", "Setting the container name is not supported."),
    (
        "expose",
        "Exposing ports is unnecessary - services on the same network can access each other's containers on any port.",
    ),
];

fn services<'a>(dicts: impl IntoIterator<Item = &'a Mapping>) -> impl Iterator<Item = &'a Mapping> {
    dicts
        .into_iter()
        .filter_map(|dict| dict.get("services").and_then(Value::as_mapping))
        .flat_map(|services| services.values().filter_map(Value::as_mapping))
}

fn described_properties<'a>(
    dicts: impl IntoIterator<Item = &'a Mapping>,
    table: &[(&str, &str)],
) -> BTreeMap<String, String> {
    let mut found = BTreeMap::new();
    for service in services(dicts) {
        for (name, description) in table {
            if service.contains_key(*name) {
                let _ = found.insert((*name).to_owned(), (*description).to_owned());
            }
        }
    }
    found
}

/// Names of ignored service options used anywhere, sorted and de-duplicated.
pub fn unsupported_properties<'a>(dicts: impl IntoIterator<Item = &'a Mapping>) -> Vec<String> {
    let mut found = BTreeSet::new();
    for service in services(dicts) {
        for name in UNSUPPORTED_PROPERTIES {
            if service.contains_key(*name) {
                let _ = found.insert((*name).to_owned());
            }
        }
    }
    found.into_iter().collect()
}

/// Discouraged service options used anywhere, with their descriptions.
pub fn deprecated_properties<'a>(
    dicts: impl IntoIterator<Item = &'a Mapping>,
) -> BTreeMap<String, String> {
    described_properties(dicts, DEPRECATED_PROPERTIES)
}

/// Refused service options used anywhere, with their descriptions.
pub fn forbidden_properties<'a>(
    dicts: impl IntoIterator<Item = &'a Mapping>,
) -> BTreeMap<String, String> {
    described_properties(dicts, FORBIDDEN_PROPERTIES)
}

/// Formats `name: description` lines, sorted, separated by a blank line.
#[must_use]
pub fn property_warnings(properties: &BTreeMap<String, String>) -> String {
    let mut lines: Vec<String> = properties
        .iter()
        .map(|(name, description)| format!("{name}: {description}"))
        .collect();
    lines.sort();
    lines.join("\n\n")
}
