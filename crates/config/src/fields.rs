//! Single-pass key extraction over a YAML mapping.
//!
//! Each parser wraps a mapping in [`Fields`], takes the keys it knows about,
//! and then calls [`Fields::finish`] so that anything left over is reported
//! as an unknown key.

use crate::env::Env;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde_yaml::Value;
use std::path::Path;

/// Read and parse a YAML document from disk
pub(crate) fn read_document(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(e, path))?;
    parse_document(&text, &path.display().to_string())
}

/// Parse YAML text; `document` names the source in error messages
pub(crate) fn parse_document(text: &str, document: &str) -> Result<Value> {
    serde_yaml::from_str(text).map_err(|source| Error::Yaml {
        document: document.to_string(),
        source,
    })
}

/// The remaining, not yet consumed, keys of a mapping.
#[derive(Debug)]
pub(crate) struct Fields {
    context: String,
    entries: IndexMap<String, Value>,
}

impl Fields {
    /// Wrap `value`, which must be a mapping with string keys.
    pub(crate) fn new(value: &Value, context: impl Into<String>) -> Result<Self> {
        let context = context.into();
        let Value::Mapping(mapping) = value else {
            return Err(Error::invalid_type("<root>", context, "a mapping", value));
        };
        let mut entries = IndexMap::with_capacity(mapping.len());
        for (key, value) in mapping {
            let Value::String(key) = key else {
                return Err(Error::invalid_type("<key>", context, "a string", key));
            };
            entries.insert(key.clone(), value.clone());
        }
        Ok(Self { context, entries })
    }

    pub(crate) fn context(&self) -> &str {
        &self.context
    }

    /// Remove a key. Explicit nulls count as absent.
    pub(crate) fn take(&mut self, key: &str) -> Option<Value> {
        match self.entries.shift_remove(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    pub(crate) fn required(&mut self, key: &str) -> Result<Value> {
        self.take(key).ok_or_else(|| Error::MissingKey {
            key: key.to_string(),
            context: self.context.clone(),
        })
    }

    pub(crate) fn required_str(&mut self, key: &str) -> Result<String> {
        let value = self.required(key)?;
        self.expect_str(key, value)
    }

    pub(crate) fn optional_str(&mut self, key: &str) -> Result<Option<String>> {
        self.take(key).map(|v| self.expect_str(key, v)).transpose()
    }

    pub(crate) fn optional_bool(&mut self, key: &str) -> Result<Option<bool>> {
        match self.take(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(other) => Err(Error::invalid_type(
                key,
                self.context.as_str(),
                "a boolean",
                &other,
            )),
        }
    }

    pub(crate) fn optional_list(&mut self, key: &str) -> Result<Option<Vec<Value>>> {
        match self.take(key) {
            None => Ok(None),
            Some(Value::Sequence(items)) => Ok(Some(items)),
            Some(other) => Err(Error::invalid_type(
                key,
                self.context.as_str(),
                "a list",
                &other,
            )),
        }
    }

    pub(crate) fn optional_env(&mut self, key: &str) -> Result<Option<Env>> {
        self.take(key)
            .map(|v| parse_env(&v, &format!("'{key}' of {}", self.context)))
            .transpose()
    }

    /// `java-version` accepts a string or a bare number such as `17`
    pub(crate) fn java_version(&mut self) -> Result<Option<String>> {
        const KEY: &str = "java-version";
        match self.take(KEY) {
            None => Ok(None),
            Some(value) => scalar_string(&value).map(Some).ok_or_else(|| {
                Error::invalid_type(KEY, self.context.as_str(), "a string or a number", &value)
            }),
        }
    }

    /// `runs-on` accepts a single label or a list of labels
    pub(crate) fn runs_on(&mut self) -> Result<Option<Vec<String>>> {
        const KEY: &str = "runs-on";
        let Some(value) = self.take(KEY) else {
            return Ok(None);
        };
        let invalid = |v: &Value| {
            Error::invalid_type(KEY, self.context.as_str(), "a string or a list of strings", v)
        };
        let labels = match &value {
            Value::String(label) => vec![label.clone()],
            Value::Sequence(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(label) => Ok(label.clone()),
                    _ => Err(invalid(&value)),
                })
                .collect::<Result<Vec<_>>>()?,
            _ => return Err(invalid(&value)),
        };
        Ok((!labels.is_empty()).then_some(labels))
    }

    /// Fail if `key` is present; used for compiler-assigned keys.
    pub(crate) fn forbid(&mut self, key: &str) -> Result<()> {
        if self.take(key).is_some() {
            return Err(Error::invalid(format!(
                "{} should not have '{key}'",
                self.context
            )));
        }
        Ok(())
    }

    /// Report any keys that were never taken.
    pub(crate) fn finish(self) -> Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        Err(Error::UnknownKeys {
            context: self.context,
            keys: self.entries.into_keys().collect(),
        })
    }

    fn expect_str(&self, key: &str, value: Value) -> Result<String> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(Error::invalid_type(
                key,
                self.context.as_str(),
                "a string",
                &other,
            )),
        }
    }
}

/// Strings pass through, numbers are stringified
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse an env mapping, keeping document order
pub(crate) fn parse_env(value: &Value, context: &str) -> Result<Env> {
    let Value::Mapping(mapping) = value else {
        return Err(Error::invalid_type("env", context, "a mapping", value));
    };
    let mut env = Env::with_capacity(mapping.len());
    for (key, entry) in mapping {
        let Value::String(key) = key else {
            return Err(Error::invalid_type("<key>", context, "a string", key));
        };
        let entry = scalar_string(entry)
            .ok_or_else(|| Error::invalid_type(key, context, "a string or a number", entry))?;
        env.insert(key.clone(), entry);
    }
    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(yaml: &str) -> Fields {
        let value = parse_document(yaml, "test").unwrap();
        Fields::new(&value, "a test entry").unwrap()
    }

    #[test]
    fn test_finish_reports_leftover_keys_in_order() {
        let mut f = fields("a: 1\nzeta: 2\nbeta: 3\n");
        f.take("a");
        let err = f.finish().unwrap_err();
        match err {
            Error::UnknownKeys { keys, .. } => assert_eq!(keys, vec!["zeta", "beta"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_null_counts_as_absent() {
        let mut f = fields("name: ~\n");
        assert!(f.optional_str("name").unwrap().is_none());
        assert!(matches!(
            f.required_str("name"),
            Err(Error::MissingKey { .. })
        ));
    }

    #[test]
    fn test_wrong_type_names_key_and_context() {
        let mut f = fields("org: [a, b]\n");
        let err = f.required_str("org").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'org'"), "{msg}");
        assert!(msg.contains("a test entry"), "{msg}");
    }

    #[test]
    fn test_java_version_accepts_numbers() {
        let mut f = fields("java-version: 17\n");
        assert_eq!(f.java_version().unwrap().as_deref(), Some("17"));
    }

    #[test]
    fn test_runs_on_string_or_list() {
        let mut f = fields("runs-on: self-hosted\n");
        assert_eq!(f.runs_on().unwrap(), Some(vec!["self-hosted".to_string()]));

        let mut f = fields("runs-on: [linux, x64]\n");
        assert_eq!(
            f.runs_on().unwrap(),
            Some(vec!["linux".to_string(), "x64".to_string()])
        );

        let mut f = fields("runs-on: {a: b}\n");
        assert!(f.runs_on().is_err());
    }

    #[test]
    fn test_env_stringifies_numbers_and_rejects_bools() {
        let value = parse_document("A: 1\nB: text\n", "test").unwrap();
        let env = parse_env(&value, "env").unwrap();
        assert_eq!(env.get("A").map(String::as_str), Some("1"));
        assert_eq!(env.keys().collect::<Vec<_>>(), vec!["A", "B"]);

        let value = parse_document("A: true\n", "test").unwrap();
        assert!(parse_env(&value, "env").is_err());
    }

    #[test]
    fn test_forbid() {
        let mut f = fields("needs: [x]\n");
        let err = f.forbid("needs").unwrap_err();
        assert!(err.to_string().contains("should not have 'needs'"));
    }
}
