//! Deserialization helpers for the flexible compose syntaxes.
//!
//! Compose accepts many fields as either a string or a list, or as either a
//! list of `KEY=VALUE` strings or a mapping. Every helper first reads a
//! generic [`Value`] and then normalises it.

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use super::types::{
    External, ServiceNetworkConfig, ServiceObjectReference, ServicePortConfig, ServiceVolumeConfig,
    VolumeBindOptions, VolumeOptions,
};

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn from_value<T: DeserializeOwned, E: Error>(value: Value) -> Result<T, E> {
    serde_yaml::from_value(value).map_err(E::custom)
}

/// A scalar of any kind read as a string (`cpus: 0.5`, `memory: 512M`).
pub fn optional_scalar<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        other => scalar(&other)
            .map(Some)
            .ok_or_else(|| D::Error::custom("expected a scalar value")),
    }
}

/// A single string or a list of strings.
pub fn string_or_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .iter()
            .map(|item| scalar(item).ok_or_else(|| D::Error::custom("expected a list of strings")))
            .collect(),
        other => scalar(&other)
            .map(|s| vec![s])
            .ok_or_else(|| D::Error::custom("expected a string or a list of strings")),
    }
}

fn mapping_or_list<E: Error>(value: Value) -> Result<BTreeMap<String, Option<String>>, E> {
    let mut out = BTreeMap::new();
    match value {
        Value::Null => {}
        Value::Sequence(items) => {
            for item in items {
                let entry = scalar(&item).ok_or_else(|| E::custom("expected KEY=VALUE strings"))?;
                let (key, value) = match entry.split_once('=') {
                    Some((key, value)) => (key.to_owned(), Some(value.to_owned())),
                    None => (entry, None),
                };
                let _ = out.insert(key, value);
            }
        }
        Value::Mapping(mapping) => {
            for (key, value) in mapping {
                let key = scalar(&key).ok_or_else(|| E::custom("mapping keys must be scalars"))?;
                let _ = out.insert(key, scalar(&value));
            }
        }
        _ => return Err(E::custom("expected a mapping or a list of KEY=VALUE strings")),
    }
    Ok(out)
}

/// Environment entries; a bare `KEY` has no value.
pub fn environment<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<BTreeMap<String, Option<String>>, D::Error> {
    mapping_or_list(Value::deserialize(d)?)
}

/// Label-like entries; a bare `KEY` maps to the empty string.
pub fn labels<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, String>, D::Error> {
    Ok(mapping_or_list::<D::Error>(Value::deserialize(d)?)?
        .into_iter()
        .map(|(key, value)| (key, value.unwrap_or_default()))
        .collect())
}

/// Service networks given as a list of names or a mapping of options.
pub fn service_networks<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<BTreeMap<String, Option<ServiceNetworkConfig>>, D::Error> {
    let mut out = BTreeMap::new();
    match Value::deserialize(d)? {
        Value::Null => {}
        Value::Sequence(items) => {
            for item in items {
                let name = scalar(&item).ok_or_else(|| D::Error::custom("expected network names"))?;
                let _ = out.insert(name, None);
            }
        }
        Value::Mapping(mapping) => {
            for (key, value) in mapping {
                let name = scalar(&key).ok_or_else(|| D::Error::custom("expected network names"))?;
                let _ = out.insert(name, from_value::<_, D::Error>(value)?);
            }
        }
        _ => return Err(D::Error::custom("expected a list or mapping of networks")),
    }
    Ok(out)
}

/// `external: true` or `external: { name: ... }`.
pub fn external<'de, D: Deserializer<'de>>(d: D) -> Result<External, D::Error> {
    match Value::deserialize(d)? {
        Value::Null | Value::Bool(false) => Ok(External::default()),
        Value::Bool(true) => Ok(External {
            external: true,
            name: None,
        }),
        Value::Mapping(mapping) => Ok(External {
            external: true,
            name: mapping.get("name").and_then(scalar),
        }),
        _ => Err(D::Error::custom("external must be a boolean or a mapping")),
    }
}

/// Secret or config references given by name or in long syntax.
pub fn object_references<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Vec<ServiceObjectReference>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Mapping(_) => from_value(item),
                other => scalar(&other)
                    .map(|source| ServiceObjectReference {
                        source,
                        ..ServiceObjectReference::default()
                    })
                    .ok_or_else(|| D::Error::custom("expected a name or a mapping")),
            })
            .collect(),
        _ => Err(D::Error::custom("expected a list of references")),
    }
}

/// Ports in short (`"8080:80/udp"`, `80`) or long syntax.
pub fn ports<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<ServicePortConfig>, D::Error> {
    let items = match Value::deserialize(d)? {
        Value::Null => return Ok(Vec::new()),
        Value::Sequence(items) => items,
        _ => return Err(D::Error::custom("ports must be a list")),
    };
    let mut out = Vec::new();
    for item in items {
        match item {
            Value::Mapping(_) => out.push(from_value::<_, D::Error>(item)?),
            other => {
                let spec = scalar(&other).ok_or_else(|| D::Error::custom("invalid port entry"))?;
                out.extend(parse_port_spec(&spec).map_err(D::Error::custom)?);
            }
        }
    }
    Ok(out)
}

/// Volumes in short (`"data:/var/lib/data:ro"`) or long syntax.
pub fn volumes<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<ServiceVolumeConfig>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Mapping(_) => from_value(item),
                other => scalar(&other)
                    .ok_or_else(|| D::Error::custom("invalid volume entry"))
                    .and_then(|spec| parse_volume_spec(&spec).map_err(D::Error::custom)),
            })
            .collect(),
        _ => Err(D::Error::custom("volumes must be a list")),
    }
}

fn parse_range(range: &str) -> Result<(u16, u16), String> {
    let parse = |s: &str| {
        s.parse::<u16>()
            .map_err(|_| format!("invalid port \"{s}\""))
    };
    match range.split_once('-') {
        Some((start, end)) => {
            let (start, end) = (parse(start)?, parse(end)?);
            if end < start {
                return Err(format!("invalid port range \"{range}\""));
            }
            Ok((start, end))
        }
        None => parse(range).map(|port| (port, port)),
    }
}

/// Expands a short-syntax port into one entry per target port.
///
/// Accepted forms: `TARGET`, `PUBLISHED:TARGET` and `IP:PUBLISHED:TARGET`,
/// each with an optional `/protocol` suffix; ports may be `START-END` ranges.
pub fn parse_port_spec(spec: &str) -> Result<Vec<ServicePortConfig>, String> {
    let (addresses, protocol) = match spec.rsplit_once('/') {
        Some((addresses, protocol)) => (addresses, protocol.to_owned()),
        None => (spec, "tcp".to_owned()),
    };
    let parts: Vec<&str> = addresses.split(':').collect();
    let (host_ip, published, target) = match parts.as_slice() {
        [target] => (None, None, *target),
        [published, target] => (None, Some(*published), *target),
        [ip, published, target] => (Some((*ip).to_owned()), Some(*published), *target),
        _ => return Err(format!("invalid port specification \"{spec}\"")),
    };
    let (target_start, target_end) = parse_range(target)?;
    let published = match published.filter(|p| !p.is_empty()) {
        Some(range) => Some(parse_range(range)?),
        None => None,
    };
    if let Some((start, end)) = published {
        if end - start != target_end - target_start {
            return Err(format!("port ranges don't match in \"{spec}\""));
        }
    }
    Ok((0..=target_end - target_start)
        .map(|offset| ServicePortConfig {
            mode: Some("ingress".to_owned()),
            host_ip: host_ip.clone(),
            target: target_start + offset,
            published: published.map(|(start, _)| start + offset),
            protocol: Some(protocol.clone()),
        })
        .collect())
}

fn is_bind_source(source: &str) -> bool {
    source.starts_with('.') || source.starts_with('/') || source.starts_with('~')
}

/// Parses `TARGET`, `SOURCE:TARGET` or `SOURCE:TARGET:MODE`.
pub fn parse_volume_spec(spec: &str) -> Result<ServiceVolumeConfig, String> {
    let parts: Vec<&str> = spec.split(':').collect();
    let (source, target, mode) = match parts.as_slice() {
        [target] => (None, *target, None),
        [source, target] => (Some(*source), *target, None),
        [source, target, mode] => (Some(*source), *target, Some(*mode)),
        _ => return Err(format!("invalid volume specification \"{spec}\"")),
    };
    if target.is_empty() {
        return Err(format!("invalid volume specification \"{spec}\": empty target"));
    }
    let mut volume = ServiceVolumeConfig {
        kind: "volume".to_owned(),
        source: source.map(str::to_owned),
        target: target.to_owned(),
        ..ServiceVolumeConfig::default()
    };
    if source.is_some_and(is_bind_source) {
        "bind".clone_into(&mut volume.kind);
    }
    for option in mode.into_iter().flat_map(|m| m.split(',')) {
        match option {
            "ro" => volume.read_only = true,
            "rw" => volume.read_only = false,
            "nocopy" => {
                volume.volume = Some(VolumeOptions { nocopy: true });
            }
            "consistent" | "cached" | "delegated" => volume.consistency = Some(option.to_owned()),
            "z" | "Z" | "private" | "rprivate" | "shared" | "rshared" | "slave" | "rslave" => {
                volume.bind = Some(VolumeBindOptions {
                    propagation: Some(option.to_owned()),
                });
            }
            other => return Err(format!("unknown volume mode \"{other}\" in \"{spec}\"")),
        }
    }
    Ok(volume)
}
