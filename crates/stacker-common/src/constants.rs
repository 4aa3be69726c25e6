//! System-wide constants and defaults.

/// Compose file read when no `-c` flag is given.
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";

/// Schema version assumed for documents without a `version` key.
pub const DEFAULT_SCHEMA_VERSION: &str = "3.x";

/// Major schema version accepted by the loader.
pub const SUPPORTED_SCHEMA_MAJOR: &str = "3";

/// Top-level key holding the schema version.
pub const VERSION_KEY: &str = "version";

/// Separators marking a default value, in precedence order.
pub const DEFAULT_SEPARATORS: [&str; 2] = [":-", "-"];

/// Separators marking a mandatory reference, in precedence order.
pub const MANDATORY_SEPARATORS: [&str; 2] = [":?", "?"];

/// Binary name for the CLI.
pub const BIN_NAME: &str = "stacker";
