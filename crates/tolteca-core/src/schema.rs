//! Composable config schema
//!
//! A [`Schema`] maps keys (or key patterns) of a config mapping to [`Rule`]s.
//! Schemas are open: keys without a rule pass through unchanged. Profiles
//! and applications contribute extensions that are composed with
//! [`base_schema`] at construction time.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::{Error, Result};

/// Top-level key of the setup block.
pub const SETUP_KEY: &str = "setup";
/// Key of the software version inside the setup block.
pub const VERSION_KEY: &str = "version";
/// Key of the creation timestamp inside the setup block.
pub const CREATED_AT_KEY: &str = "created_at";

/// Values injected into validation, such as the running software version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationEnv {
    pub version: String,
}

impl ValidationEnv {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

/// Validating and normalizing function used by [`Rule::Transform`].
pub type TransformFn =
    dyn Fn(Value, &ValidationEnv) -> std::result::Result<Value, String> + Send + Sync;

/// Constraint applied to the value under a key.
#[derive(Clone)]
pub enum Rule {
    /// Any value is accepted.
    Any,
    /// Only null is accepted.
    Null,
    /// The value must equal one of the listed values.
    OneOf(Vec<Value>),
    /// The value is checked and possibly rewritten by a function.
    Transform(Arc<TransformFn>),
    /// The value must be a mapping (null counts as empty) validated by a schema.
    Nested(Schema),
    /// The first alternative that accepts the value wins.
    Or(Vec<Rule>),
}

impl Rule {
    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(Value, &ValidationEnv) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        Self::Transform(Arc::new(f))
    }

    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn string() -> Self {
        Self::transform(|value, _| match value {
            Value::String(_) => Ok(value),
            other => Err(format!("expected a string, got {}", describe(&other))),
        })
    }

    pub fn boolean() -> Self {
        Self::transform(|value, _| match value {
            Value::Bool(_) => Ok(value),
            other => Err(format!("expected a boolean, got {}", describe(&other))),
        })
    }

    pub fn integer() -> Self {
        Self::transform(|value, _| match &value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            other => Err(format!("expected an integer, got {}", describe(other))),
        })
    }

    /// Any number; integers are coerced to floats.
    pub fn number() -> Self {
        Self::transform(|value, _| match &value {
            Value::Number(n) => n
                .as_f64()
                .map(Value::from)
                .ok_or_else(|| format!("expected a number, got {}", describe(&value))),
            other => Err(format!("expected a number, got {}", describe(other))),
        })
    }

    /// A relative path string that stays inside its root.
    pub fn rel_path() -> Self {
        Self::transform(|value, _| match &value {
            Value::String(s) => tolteca_fs::validate_relative(s)
                .map(|()| value.clone())
                .map_err(|e| e.to_string()),
            other => Err(format!("expected a relative path, got {}", describe(other))),
        })
    }

    /// Accept null in addition to whatever this rule accepts.
    pub fn or_null(self) -> Self {
        Self::Or(vec![self, Self::Null])
    }

    fn apply(&self, value: Value, env: &ValidationEnv, path: &str) -> Result<Value> {
        match self {
            Self::Any => Ok(value),
            Self::Null => match value {
                Value::Null => Ok(value),
                other => Err(Error::validation(
                    path,
                    format!("expected null, got {}", describe(&other)),
                )),
            },
            Self::OneOf(allowed) => {
                if allowed.contains(&value) {
                    Ok(value)
                } else {
                    let choices: Vec<String> = allowed.iter().map(describe).collect();
                    Err(Error::validation(
                        path,
                        format!("{} is not one of {}", describe(&value), choices.join(", ")),
                    ))
                }
            }
            Self::Transform(f) => f(value, env).map_err(|message| Error::validation(path, message)),
            Self::Nested(schema) => match value {
                Value::Null => schema.validate_under(Mapping::new(), env, path).map(Value::Mapping),
                Value::Mapping(mapping) => {
                    schema.validate_under(mapping, env, path).map(Value::Mapping)
                }
                other => Err(Error::validation(
                    path,
                    format!("expected a mapping, got {}", describe(&other)),
                )),
            },
            Self::Or(rules) => {
                let mut reasons = Vec::with_capacity(rules.len());
                for rule in rules {
                    match rule.apply(value.clone(), env, path) {
                        Ok(value) => return Ok(value),
                        Err(Error::Validation { message, .. }) => reasons.push(message),
                        Err(e) => return Err(e),
                    }
                }
                Err(Error::validation(path, reasons.join("; or ")))
            }
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "Any"),
            Self::Null => write!(f, "Null"),
            Self::OneOf(values) => f.debug_tuple("OneOf").field(values).finish(),
            Self::Transform(_) => write!(f, "Transform(..)"),
            Self::Nested(schema) => f.debug_tuple("Nested").field(schema).finish(),
            Self::Or(rules) => f.debug_tuple("Or").field(rules).finish(),
        }
    }
}

/// Selects the keys a rule applies to.
#[derive(Debug, Clone)]
pub enum KeyMatcher {
    Exact(String),
    Pattern(Regex),
}

impl KeyMatcher {
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Exact(exact) => exact == key,
            Self::Pattern(pattern) => pattern.is_match(key),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    matcher: KeyMatcher,
    rule: Rule,
    required: bool,
}

/// Ordered set of key rules for one mapping level.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entries: Vec<Entry>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` and validate it with `rule`.
    pub fn required(self, key: impl Into<String>, rule: Rule) -> Self {
        self.with_entry(KeyMatcher::Exact(key.into()), rule, true)
    }

    /// Validate `key` with `rule` when it is present.
    pub fn optional(self, key: impl Into<String>, rule: Rule) -> Self {
        self.with_entry(KeyMatcher::Exact(key.into()), rule, false)
    }

    /// Validate every key matching `pattern` that has no exact rule.
    pub fn pattern(self, pattern: Regex, rule: Rule) -> Self {
        self.with_entry(KeyMatcher::Pattern(pattern), rule, false)
    }

    /// Compose `other` into this schema.
    ///
    /// Exact keys of `other` replace the same keys here; patterns append.
    pub fn extend(mut self, other: Schema) -> Self {
        for entry in other.entries {
            self = self.with_entry(entry.matcher, entry.rule, entry.required);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn with_entry(mut self, matcher: KeyMatcher, rule: Rule, required: bool) -> Self {
        if let KeyMatcher::Exact(key) = &matcher {
            self.entries
                .retain(|e| !matches!(&e.matcher, KeyMatcher::Exact(existing) if existing == key));
        }
        self.entries.push(Entry {
            matcher,
            rule,
            required,
        });
        self
    }

    fn rule_for(&self, key: &str) -> Option<&Rule> {
        let exact = self
            .entries
            .iter()
            .find(|e| matches!(&e.matcher, KeyMatcher::Exact(k) if k == key));
        exact
            .or_else(|| {
                self.entries.iter().find(|e| {
                    matches!(&e.matcher, KeyMatcher::Pattern(_)) && e.matcher.matches(key)
                })
            })
            .map(|e| &e.rule)
    }

    /// Validate a top-level mapping.
    pub fn validate(&self, mapping: Mapping, env: &ValidationEnv) -> Result<Mapping> {
        self.validate_under(mapping, env, "")
    }

    /// Validate a mapping found at dotted key path `prefix`.
    pub fn validate_under(
        &self,
        mapping: Mapping,
        env: &ValidationEnv,
        prefix: &str,
    ) -> Result<Mapping> {
        for entry in self.entries.iter().filter(|e| e.required) {
            if let KeyMatcher::Exact(key) = &entry.matcher {
                if !mapping.contains_key(key.as_str()) {
                    return Err(Error::validation(
                        join_path(prefix, key),
                        "missing required key",
                    ));
                }
            }
        }

        let mut validated = Mapping::with_capacity(mapping.len());
        for (key, value) in mapping {
            let value = match key.as_str().and_then(|name| Some((name, self.rule_for(name)?))) {
                Some((name, rule)) => rule.apply(value, env, &join_path(prefix, name))?,
                None => value,
            };
            validated.insert(key, value);
        }
        Ok(validated)
    }
}

/// A schema bound to its validation environment.
#[derive(Debug, Clone)]
pub struct Validator {
    schema: Schema,
    env: ValidationEnv,
}

impl Validator {
    pub fn new(schema: Schema, env: ValidationEnv) -> Self {
        Self { schema, env }
    }

    pub fn env(&self) -> &ValidationEnv {
        &self.env
    }

    pub fn validate(&self, mapping: Mapping) -> Result<Mapping> {
        self.schema.validate(mapping, &self.env)
    }
}

/// Rules every runtime context config follows.
pub fn base_schema() -> Schema {
    Schema::new().optional(SETUP_KEY, Rule::transform(validate_setup))
}

/// Normalize the setup block.
///
/// Null becomes an empty mapping. A missing version is filled in from the
/// environment and a version differing from the environment is kept; both
/// cases only log a warning. The version must be a string: an unquoted
/// YAML number such as `1.10` has already lost its text, so it is refused.
pub fn validate_setup(value: Value, env: &ValidationEnv) -> std::result::Result<Value, String> {
    let mut setup = match value {
        Value::Null => Mapping::new(),
        Value::Mapping(mapping) => mapping,
        other => return Err(format!("expected a mapping, got {}", describe(&other))),
    };

    let recorded = match setup.get(VERSION_KEY) {
        None | Some(Value::Null) => None,
        Some(Value::String(version)) => Some(version.clone()),
        Some(Value::Number(version)) => {
            return Err(format!(
                "{VERSION_KEY} must be a quoted string, got number {version}"
            ));
        }
        Some(other) => {
            return Err(format!(
                "{VERSION_KEY} must be a string, got {}",
                describe(other)
            ));
        }
    };

    match recorded {
        None => {
            tracing::warn!(version = %env.version, "no version info found in setup block");
            setup.insert(Value::from(VERSION_KEY), Value::from(env.version.clone()));
        }
        Some(recorded) => {
            if recorded != env.version {
                tracing::warn!(
                    recorded = %recorded,
                    running = %env.version,
                    "mismatch of tolteca version"
                );
            }
            setup.insert(Value::from(VERSION_KEY), Value::from(recorded));
        }
    }
    Ok(Value::Mapping(setup))
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Short human-readable description of a value for error messages.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{s}'"),
        Value::Sequence(_) => "a sequence".to_string(),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Tagged(tagged) => format!("a value tagged {}", tagged.tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn yaml(s: &str) -> Mapping {
        serde_yaml::from_str(s).unwrap()
    }

    fn env() -> ValidationEnv {
        ValidationEnv::new("1.2.0")
    }

    #[test]
    fn unknown_keys_pass_through() {
        let schema = base_schema();
        let input = yaml("notes: hello\nnested: {a: [1, 2]}\n");
        assert_eq!(schema.validate(input.clone(), &env()).unwrap(), input);
    }

    #[test]
    fn null_setup_gets_version() {
        let out = base_schema().validate(yaml("setup: ~\n"), &env()).unwrap();
        assert_eq!(out, yaml("setup: {version: 1.2.0}\n"));
    }

    #[test]
    fn absent_setup_stays_absent() {
        let out = base_schema().validate(yaml("a: 1\n"), &env()).unwrap();
        assert!(!out.contains_key(SETUP_KEY));
    }

    #[test]
    fn mismatched_version_is_kept() {
        let out = base_schema()
            .validate(yaml("setup: {version: 0.9.0, created_at: x}\n"), &env())
            .unwrap();
        assert_eq!(out["setup"]["version"], Value::from("0.9.0"));
        assert_eq!(out["setup"]["created_at"], Value::from("x"));
    }

    #[test]
    fn numeric_version_is_refused() {
        let err = base_schema().validate(yaml("setup: {version: 1.10}\n"), &env()).unwrap_err();
        match err {
            Error::Validation { path, message } => {
                assert_eq!(path, "setup");
                assert!(message.contains("must be a string"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn quoted_numeric_version_keeps_its_text() {
        let out = base_schema()
            .validate(yaml("setup: {version: '1.10'}\n"), &env())
            .unwrap();
        assert_eq!(out["setup"]["version"], Value::from("1.10"));
    }

    #[test]
    fn setup_must_be_a_mapping() {
        let err = base_schema().validate(yaml("setup: [1]\n"), &env()).unwrap_err();
        match err {
            Error::Validation { path, message } => {
                assert_eq!(path, "setup");
                assert!(message.contains("expected a mapping"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nested_errors_report_dotted_path() {
        let schema = Schema::new().optional(
            "apps",
            Rule::Nested(Schema::new().optional("site", Rule::one_of(["lmt"]))),
        );
        let err = schema.validate(yaml("apps: {site: gbt}\n"), &env()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid config at 'apps.site': 'gbt' is not one of 'lmt'"
        );
    }

    #[test]
    fn required_keys_are_enforced() {
        let schema = Schema::new().required("name", Rule::string());
        let err = schema.validate(yaml("other: 1\n"), &env()).unwrap_err();
        assert!(err.to_string().contains("'name': missing required key"));
    }

    #[test]
    fn extend_replaces_exact_keys() {
        let schema = Schema::new()
            .optional("mode", Rule::one_of(["a"]))
            .extend(Schema::new().optional("mode", Rule::one_of(["b"])));
        assert_eq!(schema.len(), 1);
        assert!(schema.validate(yaml("mode: b\n"), &env()).is_ok());
        assert!(schema.validate(yaml("mode: a\n"), &env()).is_err());
    }

    #[test]
    fn patterns_apply_to_unlisted_keys() {
        let schema = Schema::new()
            .optional("n_special", Rule::Any)
            .pattern(Regex::new(r"^n_").unwrap(), Rule::integer());
        assert!(schema.validate(yaml("n_a: 1\nn_special: x\n"), &env()).is_ok());
        assert!(schema.validate(yaml("n_b: x\n"), &env()).is_err());
    }

    #[test]
    fn number_coerces_integers() {
        let schema = Schema::new().optional("t", Rule::number());
        let out = schema.validate(yaml("t: 3\n"), &env()).unwrap();
        assert_eq!(out["t"], Value::from(3.0));
    }

    #[test]
    fn or_null_accepts_null_and_reports_both_reasons() {
        let schema = Schema::new().optional("path", Rule::rel_path().or_null());
        assert!(schema.validate(yaml("path: ~\n"), &env()).is_ok());
        assert!(schema.validate(yaml("path: data/cat.ecsv\n"), &env()).is_ok());

        let err = schema.validate(yaml("path: /abs\n"), &env()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("absolute"), "{message}");
        assert!(message.contains("expected null"), "{message}");
    }

    #[test]
    fn validator_uses_injected_version() {
        let validator = Validator::new(base_schema(), ValidationEnv::new("9.9.9"));
        let out = validator.validate(yaml("setup: {}\n")).unwrap();
        assert_eq!(out["setup"]["version"], Value::from("9.9.9"));
    }
}
