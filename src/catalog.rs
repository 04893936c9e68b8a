//! Method catalog
//!
//! Maps remote procedure names to their ordered parameter contracts. The
//! catalog is built once from a JSON description and never mutated
//! afterwards; clients share it read-only through an `Arc`.

use crate::error::{Result, RpcError};
use crate::validate;
use crate::value::Value;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Catalog of the management methods exposed by the appliance
const BUILTIN_METHODS: &str = include_str!("supported_methods.json");

/// Declared type of a parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Bool,
    Int,
    Float,
    Str,
    /// `list` or `list[T]`
    List(Option<Box<ParamType>>),
    /// `dict` or `dict[T]`; keys are always strings
    Dict(Option<Box<ParamType>>),
    Any,
}

impl ParamType {
    /// The item type of a container, if one was declared
    pub fn item_type(&self) -> Option<&ParamType> {
        match self {
            ParamType::List(item) | ParamType::Dict(item) => item.as_deref(),
            _ => None,
        }
    }

    /// Name of the base type without its item type
    pub fn base_name(&self) -> &'static str {
        match self {
            ParamType::Bool => "bool",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Str => "str",
            ParamType::List(_) => "list",
            ParamType::Dict(_) => "dict",
            ParamType::Any => "any",
        }
    }

    /// True when an empty value stands for "absent" on the wire
    pub fn is_sized(&self) -> bool {
        matches!(self, ParamType::Str | ParamType::List(_) | ParamType::Dict(_))
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.item_type() {
            Some(item) => write!(f, "{}[{}]", self.base_name(), item),
            None => f.write_str(self.base_name()),
        }
    }
}

impl FromStr for ParamType {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(open) = s.find('[') {
            let inner = s[open + 1..]
                .strip_suffix(']')
                .ok_or_else(|| RpcError::Config(format!("Unterminated item type in '{s}'")))?;
            let item = Some(Box::new(inner.parse::<ParamType>()?));
            return match &s[..open] {
                "list" => Ok(ParamType::List(item)),
                "dict" | "map" | "mapping" => Ok(ParamType::Dict(item)),
                other => Err(RpcError::Config(format!(
                    "Type '{other}' cannot declare an item type"
                ))),
            };
        }

        match s {
            "bool" | "boolean" => Ok(ParamType::Bool),
            "int" | "integer" => Ok(ParamType::Int),
            "float" | "double" => Ok(ParamType::Float),
            "str" | "string" => Ok(ParamType::Str),
            "list" => Ok(ParamType::List(None)),
            "dict" | "map" | "mapping" => Ok(ParamType::Dict(None)),
            "any" => Ok(ParamType::Any),
            other => Err(RpcError::Config(format!("Unknown parameter type '{other}'"))),
        }
    }
}

/// Contract for one argument position of one remote method
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterContract {
    /// Display name, also the keyword used for named arguments
    pub name: String,
    pub declared_type: ParamType,
    pub nullable: bool,
    pub required: bool,
    pub default: Option<Value>,
}

impl ParameterContract {
    pub fn new(name: impl Into<String>, declared_type: ParamType) -> Self {
        Self {
            name: name.into(),
            declared_type,
            nullable: false,
            required: true,
            default: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Whether an omitted argument can be filled in without the caller
    pub fn can_synthesize(&self) -> bool {
        self.required && (self.nullable || self.default.is_some())
    }
}

/// Ordered parameter contracts of one remote method
#[derive(Debug, Clone, PartialEq)]
pub struct MethodContract {
    pub name: String,
    pub params: Vec<ParameterContract>,
}

impl MethodContract {
    pub fn new(name: impl Into<String>, params: Vec<ParameterContract>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn param(&self, name: &str) -> Option<&ParameterContract> {
        self.params.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Deserialize)]
struct RawParam {
    name: String,
    #[serde(rename = "type")]
    declared_type: String,
    #[serde(rename = "null", default)]
    nullable: bool,
    #[serde(default = "default_required")]
    required: bool,
    #[serde(default)]
    default: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawMethod {
    #[serde(default)]
    params: Vec<RawParam>,
}

fn default_required() -> bool {
    true
}

impl TryFrom<RawParam> for ParameterContract {
    type Error = RpcError;

    fn try_from(raw: RawParam) -> Result<Self> {
        let contract = ParameterContract {
            declared_type: raw.declared_type.parse()?,
            nullable: raw.nullable,
            required: raw.required,
            // A JSON null default means "no default"
            default: raw
                .default
                .filter(|d| !d.is_null())
                .map(|d| Value::from_json(&d)),
            name: raw.name,
        };

        if let Some(default) = &contract.default {
            validate::validate(default, &contract).map_err(|e| {
                RpcError::Config(format!(
                    "Default for parameter '{}' is invalid: {e}",
                    contract.name
                ))
            })?;
        }

        Ok(contract)
    }
}

/// Immutable registry of method contracts keyed by method name
#[derive(Debug, Clone, Default)]
pub struct MethodCatalog {
    methods: HashMap<String, MethodContract>,
}

impl MethodCatalog {
    /// Build a catalog from already-constructed contracts
    pub fn new(methods: impl IntoIterator<Item = MethodContract>) -> Self {
        Self {
            methods: methods
                .into_iter()
                .map(|m| (m.name.clone(), m))
                .collect(),
        }
    }

    /// The catalog of management methods shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_str(BUILTIN_METHODS)
    }

    /// Load a catalog from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            RpcError::Config(format!(
                "Failed to read method catalog {}: {e}",
                path.display()
            ))
        })?;

        <Self as FromStr>::from_str(&contents)
    }

    /// Look up a method by name
    pub fn lookup(&self, name: &str) -> Result<&MethodContract> {
        self.methods
            .get(name)
            .ok_or_else(|| RpcError::MethodNotSupported(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Method names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl FromStr for MethodCatalog {
    type Err = RpcError;

    fn from_str(content: &str) -> Result<Self> {
        let raw: HashMap<String, RawMethod> = serde_json::from_str(content)?;
        let mut methods = Vec::with_capacity(raw.len());

        for (name, method) in raw {
            let params = method
                .params
                .into_iter()
                .map(ParameterContract::try_from)
                .collect::<Result<Vec<_>>>()
                .map_err(|e| RpcError::Config(format!("Method '{name}': {e}")))?;
            methods.push(MethodContract::new(name, params));
        }

        log::debug!("Loaded method catalog with {} methods", methods.len());
        Ok(Self::new(methods))
    }
}
