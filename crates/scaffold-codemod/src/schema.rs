//! Declarative option schemas for codemods.
//!
//! Raw options arrive from the command line as strings (or from tests as
//! JSON values). Validation coerces them to the declared kind, fills in
//! defaults and collects every failing field before returning.

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use crate::error::{FieldError, FieldProblem, ValidationError};

pub type RawOptions = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    String,
    Number,
    StringList,
}

impl FieldKind {
    fn expected(self) -> &'static str {
        match self {
            FieldKind::Bool => "a boolean",
            FieldKind::String => "a string",
            FieldKind::Number => "a number",
            FieldKind::StringList => "a list of strings",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
    pub description: &'static str,
    pub constraints: Constraints,
}

impl FieldSpec {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
            description: "",
            constraints: Constraints::default(),
        }
    }

    pub fn bool(name: &'static str) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn number(name: &'static str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn string_list(name: &'static str) -> Self {
        Self::new(name, FieldKind::StringList)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Character count bounds for string fields.
    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.constraints.min_length = Some(min);
        self.constraints.max_length = Some(max);
        self
    }

    /// Inclusive value bounds for number fields.
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.constraints.minimum = Some(min);
        self.constraints.maximum = Some(max);
        self
    }

    fn coerce(&self, raw: &Value) -> Result<Value, FieldProblem> {
        let invalid = FieldProblem::InvalidType {
            expected: self.kind.expected(),
        };
        match (self.kind, raw) {
            (FieldKind::Bool, Value::Bool(_)) => Ok(raw.clone()),
            (FieldKind::Bool, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err(invalid),
            },

            (FieldKind::Number, Value::Number(_)) => Ok(raw.clone()),
            (FieldKind::Number, Value::String(s)) => {
                let s = s.trim();
                if let Ok(i) = s.parse::<i64>() {
                    return Ok(Value::from(i));
                }
                s.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or(invalid)
            }

            (FieldKind::String, Value::String(_)) => Ok(raw.clone()),
            (FieldKind::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (FieldKind::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),

            (FieldKind::StringList, Value::Array(items)) => {
                if items.iter().all(Value::is_string) {
                    Ok(raw.clone())
                } else {
                    Err(invalid)
                }
            }
            (FieldKind::StringList, Value::String(s)) => Ok(Value::Array(
                s.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| Value::String(item.to_string()))
                    .collect(),
            )),

            _ => Err(invalid),
        }
    }

    fn check_constraints(&self, value: &Value) -> Option<FieldProblem> {
        let c = &self.constraints;
        if let Value::String(s) = value {
            let len = s.chars().count();
            if let Some(min) = c.min_length.filter(|min| len < *min) {
                return Some(FieldProblem::TooShort { min });
            }
            if let Some(max) = c.max_length.filter(|max| len > *max) {
                return Some(FieldProblem::TooLong { max });
            }
        }
        if let Some(n) = value.as_f64() {
            if let Some(min) = c.minimum.filter(|min| n < *min) {
                return Some(FieldProblem::BelowMinimum { min });
            }
            if let Some(max) = c.maximum.filter(|max| n > *max) {
                return Some(FieldProblem::AboveMaximum { max });
            }
        }
        None
    }
}

/// A command-line flag derived from a schema field, for help text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsSchema {
    fields: Vec<FieldSpec>,
}

impl OptionsSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn flags(&self) -> Vec<Flag> {
        self.fields
            .iter()
            .map(|f| Flag {
                name: f.name,
                required: f.required,
                description: f.description,
            })
            .collect()
    }

    /// Coerce and check `raw` against every field. Unknown keys are dropped.
    pub fn validate(&self, codemod: &str, raw: &RawOptions) -> Result<CodemodOptions, ValidationError> {
        let mut values = Map::new();
        let mut failures = Vec::new();

        for spec in &self.fields {
            let supplied = raw.get(spec.name).filter(|v| !v.is_null());
            let result = match (supplied, &spec.default) {
                (Some(raw_value), _) => spec.coerce(raw_value).and_then(|value| {
                    match spec.check_constraints(&value) {
                        Some(problem) => Err(problem),
                        None => Ok(Some(value)),
                    }
                }),
                (None, Some(default)) => Ok(Some(default.clone())),
                (None, None) if spec.required => Err(FieldProblem::Missing),
                (None, None) => Ok(None),
            };

            match result {
                Ok(Some(value)) => {
                    values.insert(spec.name.to_string(), value);
                }
                Ok(None) => {}
                Err(problem) => failures.push(FieldError {
                    field: spec.name.to_string(),
                    problem,
                }),
            }
        }

        if failures.is_empty() {
            Ok(CodemodOptions { values })
        } else {
            Err(ValidationError {
                codemod: codemod.to_string(),
                failures,
            })
        }
    }
}

/// Validated options handed to a codemod.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodemodOptions {
    values: Map<String, Value>,
}

impl CodemodOptions {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Deserialize the options into the codemod's own options type.
    pub fn parse<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_value(Value::Object(self.values.clone()))?)
    }
}

/// Codemods without a schema receive the raw options unchanged.
impl From<RawOptions> for CodemodOptions {
    fn from(values: RawOptions) -> Self {
        Self { values }
    }
}
