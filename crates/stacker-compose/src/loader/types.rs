//! Typed model of an interpolated compose configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use super::de;
use crate::error::{ComposeError, Result};

/// A fully interpolated and decoded configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Config {
    /// Schema version of the first document.
    pub version: String,
    /// Services sorted by name.
    pub services: Vec<ServiceConfig>,
    /// Top-level networks.
    pub networks: BTreeMap<String, NetworkConfig>,
    /// Top-level volumes.
    pub volumes: BTreeMap<String, VolumeConfig>,
    /// Top-level secrets.
    pub secrets: BTreeMap<String, SecretConfig>,
    /// Top-level configs.
    pub configs: BTreeMap<String, ConfigObjConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    services: Option<BTreeMap<String, ServiceConfig>>,
    networks: Option<BTreeMap<String, Option<NetworkConfig>>>,
    volumes: Option<BTreeMap<String, Option<VolumeConfig>>>,
    secrets: Option<BTreeMap<String, SecretConfig>>,
    configs: Option<BTreeMap<String, ConfigObjConfig>>,
}

fn flatten<T: Default>(entries: Option<BTreeMap<String, Option<T>>>) -> BTreeMap<String, T> {
    entries
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| (name, value.unwrap_or_default()))
        .collect()
}

/// Decodes a merged document tree.
///
/// # Errors
///
/// Returns [`ComposeError::Decode`] if the tree does not fit the model.
pub fn decode(version: String, merged: Mapping) -> Result<Config> {
    let raw: RawConfig = serde_yaml::from_value(Value::Mapping(merged)).map_err(|e| ComposeError::Decode {
        message: e.to_string(),
    })?;
    let services = raw
        .services
        .unwrap_or_default()
        .into_iter()
        .map(|(name, service)| ServiceConfig { name, ..service })
        .collect();
    Ok(Config {
        version,
        services,
        networks: flatten(raw.networks),
        volumes: flatten(raw.volumes),
        secrets: raw.secrets.unwrap_or_default(),
        configs: raw.configs.unwrap_or_default(),
    })
}

/// A command in shell form or exec form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShellCommand {
    /// `command: run --fast`
    Shell(String),
    /// `command: ["run", "--fast"]`
    Exec(Vec<String>),
}

/// One service definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service name, taken from its key.
    #[serde(skip_deserializing)]
    pub name: String,
    /// Image reference.
    pub image: Option<String>,
    /// Command override.
    pub command: Option<ShellCommand>,
    /// Entrypoint override.
    pub entrypoint: Option<ShellCommand>,
    /// Environment; `None` values are taken from the deploying shell.
    #[serde(deserialize_with = "de::environment", skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, Option<String>>,
    /// Container labels.
    #[serde(deserialize_with = "de::labels", skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Published ports.
    #[serde(deserialize_with = "de::ports", skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ServicePortConfig>,
    /// Mounts.
    #[serde(deserialize_with = "de::volumes", skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<ServiceVolumeConfig>,
    /// Attached networks.
    #[serde(deserialize_with = "de::service_networks", skip_serializing_if = "BTreeMap::is_empty")]
    pub networks: BTreeMap<String, Option<ServiceNetworkConfig>>,
    /// Granted secrets.
    #[serde(deserialize_with = "de::object_references", skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<ServiceObjectReference>,
    /// Granted configs.
    #[serde(deserialize_with = "de::object_references", skip_serializing_if = "Vec::is_empty")]
    pub configs: Vec<ServiceObjectReference>,
    /// Swarm deployment settings.
    pub deploy: Option<DeployConfig>,
    /// Health check.
    pub healthcheck: Option<HealthCheckConfig>,
    /// Log driver settings.
    pub logging: Option<LoggingConfig>,
    /// DNS servers.
    #[serde(deserialize_with = "de::string_or_list", skip_serializing_if = "Vec::is_empty")]
    pub dns: Vec<String>,
    /// DNS search domains.
    #[serde(deserialize_with = "de::string_or_list", skip_serializing_if = "Vec::is_empty")]
    pub dns_search: Vec<String>,
    /// Extra `/etc/hosts` entries.
    #[serde(deserialize_with = "de::string_or_list", skip_serializing_if = "Vec::is_empty")]
    pub extra_hosts: Vec<String>,
    /// Container hostname.
    pub hostname: Option<String>,
    /// User the process runs as.
    pub user: Option<String>,
    /// Working directory.
    pub working_dir: Option<String>,
    /// Time to wait before killing the container.
    pub stop_grace_period: Option<String>,
    /// Signal used to stop the container.
    pub stop_signal: Option<String>,
    /// Run an init process.
    pub init: Option<bool>,
    /// Mount the root filesystem read-only.
    pub read_only: bool,
    /// Keep stdin open.
    pub stdin_open: bool,
    /// Allocate a TTY.
    pub tty: bool,
}

/// A published port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicePortConfig {
    /// `ingress` or `host`.
    pub mode: Option<String>,
    /// Host address the port binds to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,
    /// Container port.
    pub target: u16,
    /// Published port.
    pub published: Option<u16>,
    /// `tcp` or `udp`.
    pub protocol: Option<String>,
}

/// A service mount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceVolumeConfig {
    /// `volume`, `bind` or `tmpfs`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Volume name or host path.
    pub source: Option<String>,
    /// Path inside the container.
    pub target: String,
    /// Mount read-only.
    pub read_only: bool,
    /// Bind mount consistency.
    pub consistency: Option<String>,
    /// Bind mount options.
    pub bind: Option<VolumeBindOptions>,
    /// Volume options.
    pub volume: Option<VolumeOptions>,
}

/// Options for bind mounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeBindOptions {
    /// Mount propagation mode.
    pub propagation: Option<String>,
}

/// Options for volume mounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeOptions {
    /// Do not copy image data into a new volume.
    pub nocopy: bool,
}

/// Per-network settings of a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceNetworkConfig {
    /// Additional DNS names.
    pub aliases: Vec<String>,
    /// Static IPv4 address.
    pub ipv4_address: Option<String>,
    /// Static IPv6 address.
    pub ipv6_address: Option<String>,
}

/// A secret or config granted to a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceObjectReference {
    /// Top-level object name.
    pub source: String,
    /// File name inside the container.
    pub target: Option<String>,
    /// Owner user id.
    pub uid: Option<String>,
    /// Owner group id.
    pub gid: Option<String>,
    /// File mode.
    pub mode: Option<u32>,
}

/// Swarm deployment settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// `replicated` or `global`.
    pub mode: Option<String>,
    /// Number of tasks.
    pub replicas: Option<u64>,
    /// Service labels.
    #[serde(deserialize_with = "de::labels", skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Rolling update settings.
    pub update_config: Option<UpdateConfig>,
    /// Rollback settings.
    pub rollback_config: Option<UpdateConfig>,
    /// Resource limits and reservations.
    pub resources: Option<Resources>,
    /// Restart behaviour.
    pub restart_policy: Option<RestartPolicy>,
    /// Placement constraints.
    pub placement: Option<Placement>,
    /// `vip` or `dnsrr`.
    pub endpoint_mode: Option<String>,
}

/// Rolling update or rollback settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Tasks updated at once.
    pub parallelism: Option<u64>,
    /// Delay between batches.
    pub delay: Option<String>,
    /// `continue`, `rollback` or `pause`.
    pub failure_action: Option<String>,
    /// Time to monitor each task.
    pub monitor: Option<String>,
    /// Tolerated failure ratio.
    pub max_failure_ratio: Option<f64>,
    /// `start-first` or `stop-first`.
    pub order: Option<String>,
}

/// Resource limits and reservations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resources {
    /// Hard limits.
    pub limits: Option<Resource>,
    /// Guaranteed reservations.
    pub reservations: Option<Resource>,
}

/// CPU and memory amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resource {
    /// CPU count, e.g. `0.5`.
    #[serde(deserialize_with = "de::optional_scalar")]
    pub cpus: Option<String>,
    /// Memory amount, e.g. `512M`.
    #[serde(deserialize_with = "de::optional_scalar")]
    pub memory: Option<String>,
}

/// Restart behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartPolicy {
    /// `none`, `on-failure` or `any`.
    pub condition: Option<String>,
    /// Delay between attempts.
    pub delay: Option<String>,
    /// Maximum attempts.
    pub max_attempts: Option<u64>,
    /// Window used to evaluate the policy.
    pub window: Option<String>,
}

/// Placement constraints and preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    /// Node constraints.
    pub constraints: Vec<String>,
    /// Spread preferences.
    pub preferences: Vec<PlacementPreference>,
}

/// A spread preference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementPreference {
    /// Node label to spread over.
    pub spread: String,
}

/// Health check settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Check command.
    pub test: Option<ShellCommand>,
    /// Time between checks.
    pub interval: Option<String>,
    /// Time a check may take.
    pub timeout: Option<String>,
    /// Grace period after start.
    pub start_period: Option<String>,
    /// Failures before unhealthy.
    pub retries: Option<u64>,
    /// Disable the image's check.
    pub disable: bool,
}

/// Log driver settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Driver name.
    pub driver: Option<String>,
    /// Driver options.
    #[serde(deserialize_with = "de::labels")]
    pub options: BTreeMap<String, String>,
}

/// Marks an object managed outside the stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct External {
    /// Whether the object is external.
    pub external: bool,
    /// Name of the external object, if it differs from the key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// IPAM pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpamPool {
    /// Subnet in CIDR notation.
    pub subnet: Option<String>,
}

/// IPAM settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpamConfig {
    /// IPAM driver.
    pub driver: Option<String>,
    /// Address pools.
    pub config: Vec<IpamPool>,
}

/// A top-level network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Explicit network name.
    pub name: Option<String>,
    /// Network driver.
    pub driver: Option<String>,
    /// Driver options.
    #[serde(deserialize_with = "de::labels", skip_serializing_if = "BTreeMap::is_empty")]
    pub driver_opts: BTreeMap<String, String>,
    /// IP address management.
    pub ipam: Option<IpamConfig>,
    /// Managed outside the stack.
    #[serde(deserialize_with = "de::external")]
    pub external: External,
    /// Isolate from external networks.
    pub internal: bool,
    /// Allow standalone containers to attach.
    pub attachable: bool,
    /// Network labels.
    #[serde(deserialize_with = "de::labels", skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// A top-level volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Explicit volume name.
    pub name: Option<String>,
    /// Volume driver.
    pub driver: Option<String>,
    /// Driver options.
    #[serde(deserialize_with = "de::labels", skip_serializing_if = "BTreeMap::is_empty")]
    pub driver_opts: BTreeMap<String, String>,
    /// Managed outside the stack.
    #[serde(deserialize_with = "de::external")]
    pub external: External,
    /// Volume labels.
    #[serde(deserialize_with = "de::labels", skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// A top-level secret or config backed by a file or managed externally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileObjectConfig {
    /// Explicit object name.
    pub name: Option<String>,
    /// Source file.
    pub file: Option<String>,
    /// Managed outside the stack.
    #[serde(deserialize_with = "de::external")]
    pub external: External,
    /// Object labels.
    #[serde(deserialize_with = "de::labels", skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// A top-level secret.
pub type SecretConfig = FileObjectConfig;

/// A top-level config object.
pub type ConfigObjConfig = FileObjectConfig;
