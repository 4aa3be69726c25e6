//! Casting interpolated strings back to the types their paths require.
//!
//! Substitution always yields strings; values such as `replicas` or
//! `ports.*.target` must become numbers or booleans again before decoding.

use std::fmt;

use serde_yaml::Value;

/// Segment standing for any sequence element in a [`ConfigPath`].
pub const LIST_SEGMENT: &str = "[]";

/// Pattern segment matching any single path segment.
const WILDCARD: &str = "*";

/// A dotted location inside a document tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPath(Vec<String>);

impl ConfigPath {
    /// The document root.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns a child path.
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// A path pattern where `*` matches exactly one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern(Vec<String>);

impl PathPattern {
    /// Parses a dotted pattern such as `services.*.ports.[].target`.
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        Self(pattern.split('.').map(str::to_owned).collect())
    }

    /// Whether `path` matches this pattern segment by segment.
    #[must_use]
    pub fn matches(&self, path: &ConfigPath) -> bool {
        let segments = path.segments();
        self.0.len() == segments.len()
            && self
                .0
                .iter()
                .zip(segments)
                .all(|(expected, actual)| expected == WILDCARD || expected == actual)
    }
}

/// Target type of a cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cast {
    /// Signed integer.
    Int,
    /// Floating point number.
    Float,
    /// Boolean (`y`/`yes`/`true`/`on` or `n`/`no`/`false`/`off`).
    Bool,
}

impl Cast {
    /// Name used in error messages.
    #[must_use]
    pub const fn expected(self) -> &'static str {
        match self {
            Self::Int => "an integer",
            Self::Float => "a number",
            Self::Bool => "a boolean",
        }
    }

    /// Converts `value`, or `None` if it does not parse.
    #[must_use]
    pub fn apply(self, value: &str) -> Option<Value> {
        match self {
            Self::Int => value.trim().parse::<i64>().ok().map(Value::from),
            Self::Float => value.trim().parse::<f64>().ok().map(Value::from),
            Self::Bool => to_boolean(value).map(Value::Bool),
        }
    }
}

fn to_boolean(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "y" | "yes" | "true" | "on" => Some(true),
        "n" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Ordered list of path patterns and the cast applied at matching paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCastMapping {
    rules: Vec<(PathPattern, Cast)>,
}

impl TypeCastMapping {
    /// An empty mapping; every value stays a string.
    #[must_use]
    pub const fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Adds a rule.
    #[must_use]
    pub fn with(mut self, pattern: &str, cast: Cast) -> Self {
        self.rules.push((PathPattern::parse(pattern), cast));
        self
    }

    /// Returns the cast for `path`, if any rule matches.
    #[must_use]
    pub fn cast_for(&self, path: &ConfigPath) -> Option<Cast> {
        self.rules
            .iter()
            .find(|(pattern, _)| pattern.matches(path))
            .map(|(_, cast)| *cast)
    }
}

impl Default for TypeCastMapping {
    /// Casts for every typed field of the compose schema.
    fn default() -> Self {
        Self::empty()
            .with("services.*.configs.[].mode", Cast::Int)
            .with("services.*.secrets.[].mode", Cast::Int)
            .with("services.*.healthcheck.retries", Cast::Int)
            .with("services.*.healthcheck.disable", Cast::Bool)
            .with("services.*.deploy.replicas", Cast::Int)
            .with("services.*.deploy.update_config.parallelism", Cast::Int)
            .with("services.*.deploy.update_config.max_failure_ratio", Cast::Float)
            .with("services.*.deploy.rollback_config.parallelism", Cast::Int)
            .with("services.*.deploy.rollback_config.max_failure_ratio", Cast::Float)
            .with("services.*.deploy.restart_policy.max_attempts", Cast::Int)
            .with("services.*.ports.[].target", Cast::Int)
            .with("services.*.ports.[].published", Cast::Int)
            .with("services.*.ulimits.*", Cast::Int)
            .with("services.*.ulimits.*.hard", Cast::Int)
            .with("services.*.ulimits.*.soft", Cast::Int)
            .with("services.*.privileged", Cast::Bool)
            .with("services.*.read_only", Cast::Bool)
            .with("services.*.stdin_open", Cast::Bool)
            .with("services.*.tty", Cast::Bool)
            .with("services.*.init", Cast::Bool)
            .with("services.*.volumes.[].read_only", Cast::Bool)
            .with("services.*.volumes.[].volume.nocopy", Cast::Bool)
            .with("networks.*.external", Cast::Bool)
            .with("networks.*.internal", Cast::Bool)
            .with("networks.*.attachable", Cast::Bool)
            .with("volumes.*.external", Cast::Bool)
            .with("secrets.*.external", Cast::Bool)
            .with("configs.*.external", Cast::Bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(dotted: &str) -> ConfigPath {
        dotted
            .split('.')
            .fold(ConfigPath::root(), |path, segment| path.child(segment))
    }

    #[test]
    fn wildcard_matches_one_segment() {
        let pattern = PathPattern::parse("services.*.deploy.replicas");
        assert!(pattern.matches(&path("services.web.deploy.replicas")));
        assert!(!pattern.matches(&path("services.deploy.replicas")));
        assert!(!pattern.matches(&path("services.web.deploy.replicas.x")));
    }

    #[test]
    fn list_segment_must_match_literally() {
        let pattern = PathPattern::parse("services.*.ports.[].target");
        assert!(pattern.matches(&path("services.web.ports.[].target")));
        assert!(!pattern.matches(&path("services.web.ports.0.target")));
    }

    #[test]
    fn default_mapping_casts_replicas() {
        let mapping = TypeCastMapping::default();
        assert_eq!(mapping.cast_for(&path("services.api.deploy.replicas")), Some(Cast::Int));
        assert_eq!(mapping.cast_for(&path("networks.front.external")), Some(Cast::Bool));
        assert_eq!(mapping.cast_for(&path("services.api.image")), None);
    }

    #[test]
    fn bool_cast_accepts_yaml_spellings() {
        for truthy in ["y", "Yes", "TRUE", "on"] {
            assert_eq!(Cast::Bool.apply(truthy), Some(Value::Bool(true)), "{truthy}");
        }
        for falsy in ["n", "No", "false", "OFF"] {
            assert_eq!(Cast::Bool.apply(falsy), Some(Value::Bool(false)), "{falsy}");
        }
        assert_eq!(Cast::Bool.apply("maybe"), None);
    }

    #[test]
    fn numeric_casts() {
        assert_eq!(Cast::Int.apply("3"), Some(Value::from(3_i64)));
        assert_eq!(Cast::Int.apply("three"), None);
        assert_eq!(Cast::Float.apply("0.25"), Some(Value::from(0.25_f64)));
    }

    #[test]
    fn path_display_is_dotted() {
        assert_eq!(path("services.web.image").to_string(), "services.web.image");
    }
}
