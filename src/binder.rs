//! Call binding
//!
//! Turns a caller's positional and named arguments into the ordered argument
//! vector the remote procedure expects, validating each value on the way and
//! synthesizing defaults for omitted parameters that allow it.

use crate::catalog::{MethodContract, ParameterContract};
use crate::error::{Result, RpcError};
use crate::validate;
use crate::value::Value;

/// Arguments supplied by a caller for one invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Append a named argument; order of insertion is kept
    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn named_args(&self) -> &[(String, Value)] {
        &self.named
    }

    /// Total number of supplied arguments
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<Value>> for Args {
    fn from(positional: Vec<Value>) -> Self {
        Self {
            positional,
            named: Vec::new(),
        }
    }
}

/// Fully resolved argument vector ready for the transport
///
/// Only [`bind`] produces one, so every call that reaches a transport has
/// passed catalog lookup and validation.
///
/// ```compile_fail
/// use vpnas_rpc::{BoundCall, Value};
///
/// let call = BoundCall {
///     method: "NotInCatalog".to_string(),
///     args: vec![Value::Nil],
///     slots: vec![0],
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BoundCall {
    method: String,
    args: Vec<Value>,
    // Contract index of the parameter each value fills
    slots: Vec<usize>,
}

impl BoundCall {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Pair each bound value with the name of the parameter it fills
    pub fn zip<'a>(&'a self, contract: &'a MethodContract) -> Vec<(&'a str, &'a Value)> {
        self.slots
            .iter()
            .zip(self.args.iter())
            .filter_map(|(&index, value)| {
                contract
                    .params
                    .get(index)
                    .map(|p| (p.name.as_str(), value))
            })
            .collect()
    }

    /// Render the arguments for logging with secrets masked
    pub fn redacted(&self, contract: &MethodContract) -> String {
        let rendered: Vec<String> = self
            .zip(contract)
            .into_iter()
            .map(|(name, value)| {
                if name.contains("pass") && !value.is_nil() {
                    format!("{name}=REDACTED")
                } else {
                    format!("{name}={value}")
                }
            })
            .collect();
        rendered.join(", ")
    }
}

/// Bind caller arguments against a method contract
pub fn bind(contract: &MethodContract, args: &Args) -> Result<BoundCall> {
    let params = &contract.params;
    let arity_error = || RpcError::Arity {
        method: contract.name.clone(),
        max: params.len(),
        got: args.len(),
    };

    // 1. Positional arguments fill parameters from the front
    if args.positional.len() > params.len() {
        return Err(arity_error());
    }
    for (value, param) in args.positional.iter().zip(params) {
        check(value, param)?;
    }
    let consumed = args.positional.len();

    // 2-3. Named arguments fill the remaining slots
    let remaining = &params[consumed..];
    let mut slots: Vec<Option<&Value>> = vec![None; remaining.len()];
    let mut filled = consumed;

    for (name, value) in &args.named {
        if filled == params.len() {
            return Err(arity_error());
        }

        if params[..consumed].iter().any(|p| &p.name == name) {
            return Err(RpcError::DuplicateArgument {
                method: contract.name.clone(),
                name: name.clone(),
            });
        }

        let index = remaining
            .iter()
            .position(|p| &p.name == name)
            .ok_or_else(|| RpcError::UnknownArgument {
                method: contract.name.clone(),
                name: name.clone(),
            })?;

        if slots[index].is_some() {
            return Err(RpcError::DuplicateArgument {
                method: contract.name.clone(),
                name: name.clone(),
            });
        }

        check(value, &remaining[index])?;
        slots[index] = Some(value);
        filled += 1;
    }

    // 4-5. Synthesize what may be synthesized, in contract order
    let mut bound: Vec<Value> = args.positional.clone();
    let mut bound_slots: Vec<usize> = (0..consumed).collect();
    let mut gap: Option<&ParameterContract> = None;

    for (offset, (param, slot)) in remaining.iter().zip(slots).enumerate() {
        let value = match slot {
            Some(value) => {
                // A supplied value after an omitted optional parameter would
                // land in the wrong position.
                if let Some(omitted) = gap {
                    return Err(missing(contract, omitted));
                }
                value.clone()
            }
            None if param.can_synthesize() => param.default.clone().unwrap_or(Value::Nil),
            None if param.required => {
                return Err(missing(contract, param));
            }
            None => {
                gap.get_or_insert(param);
                continue;
            }
        };

        bound.push(value);
        bound_slots.push(consumed + offset);
    }

    Ok(BoundCall {
        method: contract.name.clone(),
        args: bound,
        slots: bound_slots,
    })
}

fn check(value: &Value, param: &ParameterContract) -> Result<()> {
    validate::validate(value, param).map_err(RpcError::from)
}

fn missing(contract: &MethodContract, param: &ParameterContract) -> RpcError {
    RpcError::MissingRequiredArgument {
        method: contract.name.clone(),
        name: param.name.clone(),
    }
}
