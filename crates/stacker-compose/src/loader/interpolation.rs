//! Recursive interpolation of a document tree.

use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};

use super::typecast::{ConfigPath, LIST_SEGMENT, TypeCastMapping};
use crate::error::{ComposeError, Result};
use crate::template::Substituter;

/// Everything the loader needs to substitute values into a tree.
pub struct InterpolateOptions<'a> {
    /// Resolves a variable name to its value; `None` when unset.
    pub lookup: &'a dyn Fn(&str) -> Option<String>,
    /// Casts applied to interpolated strings by path.
    pub type_casts: &'a TypeCastMapping,
    /// Placeholder substitution engine.
    pub substituter: &'a Substituter,
}

impl std::fmt::Debug for InterpolateOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterpolateOptions")
            .field("type_casts", &self.type_casts)
            .field("substituter", &self.substituter)
            .finish_non_exhaustive()
    }
}

/// Interpolates every string scalar of `config`.
///
/// # Errors
///
/// Returns [`ComposeError::Interpolation`] when substitution fails and
/// [`ComposeError::TypeCast`] when a value cannot take its required type.
pub fn interpolate(config: &Mapping, options: &InterpolateOptions<'_>) -> Result<Mapping> {
    interpolate_mapping(config, &ConfigPath::root(), options)
}

fn interpolate_mapping(
    mapping: &Mapping,
    path: &ConfigPath,
    options: &InterpolateOptions<'_>,
) -> Result<Mapping> {
    let mut out = Mapping::with_capacity(mapping.len());
    for (key, value) in mapping {
        let child = path.child(key_segment(key));
        let _ = out.insert(key.clone(), interpolate_value(value, &child, options)?);
    }
    Ok(out)
}

fn interpolate_value(value: &Value, path: &ConfigPath, options: &InterpolateOptions<'_>) -> Result<Value> {
    match value {
        Value::String(template) => interpolate_string(template, path, options),
        Value::Mapping(mapping) => interpolate_mapping(mapping, path, options).map(Value::Mapping),
        Value::Sequence(items) => {
            let child = path.child(LIST_SEGMENT);
            items
                .iter()
                .map(|item| interpolate_value(item, &child, options))
                .collect::<Result<Vec<_>>>()
                .map(Value::Sequence)
        }
        Value::Tagged(tagged) => Ok(Value::Tagged(Box::new(TaggedValue {
            tag: tagged.tag.clone(),
            value: interpolate_value(&tagged.value, path, options)?,
        }))),
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(value.clone()),
    }
}

fn interpolate_string(template: &str, path: &ConfigPath, options: &InterpolateOptions<'_>) -> Result<Value> {
    let substituted = options
        .substituter
        .substitute(template, options.lookup)
        .map_err(|source| ComposeError::Interpolation {
            path: path.to_string(),
            source,
        })?;
    match options.type_casts.cast_for(path) {
        Some(cast) => cast.apply(&substituted).ok_or_else(|| ComposeError::TypeCast {
            path: path.to_string(),
            value: substituted,
            expected: cast.expected(),
        }),
        None => Ok(Value::String(substituted)),
    }
}

fn key_segment(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => format!("{other:?}"),
    }
}
