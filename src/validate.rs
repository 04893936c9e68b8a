//! Parameter validation
//!
//! Checks a single argument against a single [`ParameterContract`]. Rules are
//! evaluated in order and the first one that decides wins:
//!
//! 1. a nil value for a nullable parameter is accepted, whatever its type
//! 2. the value's runtime type must match the declared base type
//! 3. every item of a typed container must match the item type
//! 4. a non-nullable string or container must not be empty
//!
//! Nullability is checked before emptiness on purpose: the appliance treats
//! an empty string or container the same as an absent one.

use crate::catalog::{ParamType, ParameterContract};
use crate::error::TypeMismatch;
use crate::value::Value;

/// Validate one argument against its contract
pub fn validate(value: &Value, contract: &ParameterContract) -> Result<(), TypeMismatch> {
    if value.is_nil() && contract.nullable {
        return Ok(());
    }

    let declared = &contract.declared_type;
    if !matches_base(value, declared) {
        return Err(TypeMismatch::WrongType {
            param: contract.name.clone(),
            expected: declared.to_string(),
            actual: value.type_name().to_string(),
        });
    }

    if !items_conform(value, declared) {
        return Err(TypeMismatch::WrongItemType {
            param: contract.name.clone(),
            expected: declared.to_string(),
        });
    }

    if declared.is_sized() && !contract.nullable && is_empty(value) {
        return Err(TypeMismatch::Empty {
            param: contract.name.clone(),
            kind: declared.base_name().to_string(),
        });
    }

    Ok(())
}

/// Whether a value's runtime type is the declared base type
fn matches_base(value: &Value, declared: &ParamType) -> bool {
    match (declared, value) {
        (ParamType::Any, Value::Nil) => false,
        (ParamType::Any, _) => true,
        (ParamType::Bool, Value::Bool(_))
        | (ParamType::Int, Value::Int(_))
        | (ParamType::Float, Value::Double(_))
        | (ParamType::Str, Value::String(_))
        | (ParamType::List(_), Value::Array(_))
        | (ParamType::Dict(_), Value::Struct(_)) => true,
        _ => false,
    }
}

/// Base type match plus, recursively, every declared item type
fn conforms(value: &Value, declared: &ParamType) -> bool {
    matches_base(value, declared) && items_conform(value, declared)
}

fn items_conform(value: &Value, declared: &ParamType) -> bool {
    let Some(item_type) = declared.item_type() else {
        return true;
    };
    match value {
        Value::Array(items) => items.iter().all(|item| conforms(item, item_type)),
        Value::Struct(members) => members.values().all(|item| conforms(item, item_type)),
        _ => true,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Struct(members) => members.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn param(name: &str, ty: &str) -> ParameterContract {
        ParameterContract::new(name, ty.parse().unwrap())
    }

    fn dict(entries: &[(&str, Value)]) -> Value {
        Value::Struct(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn test_scalar_params() {
        assert!(validate(&Value::from(true), &param("bool", "bool")).is_ok());
        assert!(validate(&Value::from(3), &param("int", "int")).is_ok());
        assert!(validate(&Value::from(3.2), &param("float", "float")).is_ok());
        assert!(validate(&Value::from("test"), &param("str", "str")).is_ok());

        let err = validate(&Value::from(3), &param("bool", "bool")).unwrap_err();
        assert_eq!(err.to_string(), "Expected bool for arg bool, got int");

        let err = validate(&Value::from("test"), &param("int", "int")).unwrap_err();
        assert_eq!(err.to_string(), "Expected int for arg int, got str");

        let err = validate(&Value::from(3), &param("float", "float")).unwrap_err();
        assert_eq!(err.to_string(), "Expected float for arg float, got int");
    }

    #[test]
    fn test_nil_for_non_nullable_param() {
        let err = validate(&Value::Nil, &param("str", "str")).unwrap_err();
        assert_eq!(err.to_string(), "Expected str for arg str, got None");
    }

    #[test]
    fn test_nil_accepted_for_every_nullable_type() {
        for ty in ["bool", "int", "float", "str", "list[str]", "dict[int]", "any"] {
            assert!(validate(&Value::Nil, &param("p", ty).nullable()).is_ok(), "{ty}");
        }
    }

    #[test]
    fn test_empty_string() {
        let err = validate(&Value::from(""), &param("str", "str")).unwrap_err();
        assert_eq!(err.to_string(), "Expected non-empty str for arg str, got empty str");
        assert!(validate(&Value::from(""), &param("str - null", "str").nullable()).is_ok());
    }

    #[test]
    fn test_list_params() {
        let p = param("list[str]", "list[str]");
        assert!(validate(&Value::from(vec!["test"]), &p).is_ok());

        let err = validate(&Value::from("test"), &p).unwrap_err();
        assert_eq!(err.to_string(), "Expected list[str] for arg list[str], got str");

        let mixed = Value::Array(vec![Value::from("test"), Value::from(3)]);
        let err = validate(&mixed, &p).unwrap_err();
        assert!(matches!(err, TypeMismatch::WrongItemType { .. }));
        assert_eq!(
            err.to_string(),
            "Expected list[str] for arg list[str], got wrong item type"
        );

        let err = validate(&Value::Array(vec![]), &p).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected non-empty list for arg list[str], got empty list"
        );
        assert!(validate(&Value::Array(vec![]), &p.clone().nullable()).is_ok());
    }

    #[test]
    fn test_dict_params() {
        let p = param("dict[str]", "dict[str]");
        assert!(validate(&dict(&[("test", Value::from("test"))]), &p).is_ok());

        let err = validate(&Value::from("test"), &p).unwrap_err();
        assert_eq!(err.to_string(), "Expected dict[str] for arg dict[str], got str");

        let mixed = dict(&[("test", Value::from("test")), ("n", Value::from(3))]);
        let err = validate(&mixed, &p).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected dict[str] for arg dict[str], got wrong item type"
        );

        let err = validate(&dict(&[]), &p).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected non-empty dict for arg dict[str], got empty dict"
        );
        assert!(validate(&dict(&[]), &p.clone().nullable()).is_ok());
    }

    #[test]
    fn test_untyped_containers_accept_any_items() {
        let mixed = Value::Array(vec![Value::from("a"), Value::from(1), Value::Nil]);
        assert!(validate(&mixed, &param("l", "list")).is_ok());
    }

    #[test]
    fn test_nested_item_types() {
        let p = param("rows", "list[list[int]]");
        let good = Value::Array(vec![Value::from(vec![1, 2]), Value::from(vec![3])]);
        assert!(validate(&good, &p).is_ok());

        let bad = Value::Array(vec![Value::from(vec![1]), Value::from(vec!["x"])]);
        assert!(matches!(
            validate(&bad, &p),
            Err(TypeMismatch::WrongItemType { .. })
        ));
    }

    #[test]
    fn test_any_param() {
        let p = param("value", "any");
        assert!(validate(&Value::from(1), &p).is_ok());
        assert!(validate(&Value::from(""), &p).is_ok());
        assert!(validate(&Value::Nil, &p).is_err());
    }
}
