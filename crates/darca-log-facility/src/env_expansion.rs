//! Environment variable expansion for settings files.
//!
//! `${env.VAR}` is replaced with the value of `VAR`, `${env.VAR:-fallback}`
//! falls back to `fallback` when `VAR` is unset or empty, and `$${env.VAR}`
//! is left as the literal `${env.VAR}`.

use serde_yaml::Value;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum EnvExpansionError {
    #[error("undefined environment variable '{name}' referenced in logging settings")]
    UndefinedVariable { name: String },

    #[error("environment variable '{name}' contains non-UTF8 data")]
    NonUnicodeValue { name: String },

    #[error("failed to parse settings YAML: {0}")]
    YamlParse(String),

    #[error("failed to serialize settings YAML: {0}")]
    YamlSerialize(String),
}

/// Expand environment references inside the string scalars of a YAML document.
///
/// Expansion happens after parsing so a value containing `:` or `#` cannot
/// change the document structure. Expanded scalars are re-typed, so
/// `"${env.JSON_LOGS}"` set to `true` becomes a boolean.
pub fn expand_yaml(yaml_content: &str) -> Result<String, EnvExpansionError> {
    let mut document: Value = serde_yaml::from_str(yaml_content)
        .map_err(|e| EnvExpansionError::YamlParse(e.to_string()))?;

    expand_node(&mut document)?;

    serde_yaml::to_string(&document).map_err(|e| EnvExpansionError::YamlSerialize(e.to_string()))
}

fn expand_node(node: &mut Value) -> Result<(), EnvExpansionError> {
    match node {
        Value::String(text) if text.contains("${") || text.contains("$$") => {
            let expanded = expand_placeholders(text)?;
            *node = coerce_scalar(&expanded);
        }
        Value::Sequence(items) => {
            for item in items {
                expand_node(item)?;
            }
        }
        Value::Mapping(entries) => {
            for (_, value) in entries {
                expand_node(value)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Re-type an expanded scalar. Only booleans, numbers and null are recognised;
/// anything that would parse as a mapping or sequence stays a string.
pub fn coerce_scalar(text: &str) -> Value {
    match serde_yaml::from_str(text) {
        Ok(Value::Bool(b)) => Value::Bool(b),
        Ok(Value::Number(n)) => Value::Number(n),
        Ok(Value::Null) => Value::Null,
        _ => Value::String(text.to_string()),
    }
}

pub(crate) fn expand_placeholders(text: &str) -> Result<String, EnvExpansionError> {
    shellexpand::env_with_context(text, lookup)
        .map(|expanded| expanded.into_owned())
        .map_err(|e| e.cause)
}

// References without the `env.` prefix are left untouched.
fn lookup(key: &str) -> Result<Option<String>, EnvExpansionError> {
    let Some(var_name) = key.strip_prefix("env.") else {
        return Ok(None);
    };

    match std::env::var(var_name) {
        Ok(value) if !value.is_empty() => Ok(Some(value)),
        Ok(_) | Err(std::env::VarError::NotPresent) => Err(EnvExpansionError::UndefinedVariable {
            name: var_name.to_string(),
        }),
        Err(std::env::VarError::NotUnicode(_)) => Err(EnvExpansionError::NonUnicodeValue {
            name: var_name.to_string(),
        }),
    }
}
