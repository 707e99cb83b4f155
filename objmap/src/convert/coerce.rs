//! Runtime value conversion

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::error::ConversionError;
use crate::reflect::{Value, ValueType};

/// Convert `value` so it can be stored in a member of type `target`
///
/// A null only fits an `Optional` target; anything else is an error rather
/// than a silent default.
pub fn convert(value: Value, target: &ValueType) -> Result<Value, ConversionError> {
    match target {
        ValueType::Optional(inner) => match value {
            Value::Null => Ok(Value::Null),
            other => convert(other, inner),
        },
        _ if value.is_null() => Err(ConversionError::NullToNonNullable {
            target: target.clone(),
        }),
        ValueType::Bool => to_bool(value),
        ValueType::F32 | ValueType::F64 => to_float(value, target),
        ValueType::String => Ok(to_text(value)),
        ValueType::DateTime => to_datetime(value),
        ValueType::Guid => to_guid(value),
        ValueType::Object(handle) => match value {
            Value::Object(obj) if obj.type_info().type_id() == handle.get().type_id() => {
                Ok(Value::Object(obj))
            }
            Value::Object(obj) => Err(ConversionError::WrongObject {
                expected: handle.get().qualified_name(),
                found: obj.type_info().qualified_name(),
            }),
            other => Err(ConversionError::unsupported(&other, target)),
        },
        ValueType::List(element) => match value {
            Value::List(items) => items
                .into_iter()
                .map(|item| convert(item, element))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            other => Err(ConversionError::unsupported(&other, target)),
        },
        _ => to_integer(value, target),
    }
}

fn to_bool(value: Value) -> Result<Value, ConversionError> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(b)),
        Value::Int(i) => Ok(Value::Bool(i != 0)),
        Value::Float(f) => Ok(Value::Bool(f != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "0" => Ok(Value::Bool(false)),
            _ => Err(ConversionError::Parse {
                value: s,
                target: ValueType::Bool,
            }),
        },
        other => Err(ConversionError::unsupported(&other, &ValueType::Bool)),
    }
}

fn to_integer(value: Value, target: &ValueType) -> Result<Value, ConversionError> {
    let Some((min, max)) = target.integer_bounds() else {
        return Err(ConversionError::unsupported(&value, target));
    };

    let n: i128 = match value {
        Value::Int(i) => i as i128,
        Value::Bool(b) => b as i128,
        Value::Float(f) => {
            let rounded = f.round();
            if !rounded.is_finite() || rounded < min as f64 || rounded > max as f64 {
                return Err(ConversionError::Overflow {
                    value: f.to_string(),
                    target: target.clone(),
                });
            }
            rounded as i128
        }
        Value::String(s) => s.trim().parse::<i128>().map_err(|_| ConversionError::Parse {
            value: s.clone(),
            target: target.clone(),
        })?,
        other => return Err(ConversionError::unsupported(&other, target)),
    };

    if n < min || n > max {
        return Err(ConversionError::Overflow {
            value: n.to_string(),
            target: target.clone(),
        });
    }

    // only u64 can exceed i64; it travels as decimal text
    Ok(i64::try_from(n)
        .map(Value::Int)
        .unwrap_or_else(|_| Value::String(n.to_string())))
}

fn to_float(value: Value, target: &ValueType) -> Result<Value, ConversionError> {
    let f = match value {
        Value::Float(f) => f,
        Value::Int(i) => i as f64,
        Value::Bool(b) => {
            if b {
                1.0
            } else {
                0.0
            }
        }
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| ConversionError::Parse {
            value: s.clone(),
            target: target.clone(),
        })?,
        other => return Err(ConversionError::unsupported(&other, target)),
    };

    if matches!(target, ValueType::F32) && f.is_finite() && f.abs() > f32::MAX as f64 {
        return Err(ConversionError::Overflow {
            value: f.to_string(),
            target: target.clone(),
        });
    }
    Ok(Value::Float(f))
}

fn to_text(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s),
        other => Value::String(other.to_string()),
    }
}

fn to_datetime(value: Value) -> Result<Value, ConversionError> {
    match value {
        Value::DateTime(dt) => Ok(Value::DateTime(dt)),
        Value::String(s) => parse_datetime(s.trim())
            .map(Value::DateTime)
            .ok_or(ConversionError::Parse {
                value: s,
                target: ValueType::DateTime,
            }),
        other => Err(ConversionError::unsupported(&other, &ValueType::DateTime)),
    }
}

/// RFC 3339, then naive date-time, then plain date (all read as UTC)
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn to_guid(value: Value) -> Result<Value, ConversionError> {
    match value {
        Value::Guid(g) => Ok(Value::Guid(g)),
        Value::String(s) => Uuid::parse_str(s.trim())
            .map(Value::Guid)
            .map_err(|_| ConversionError::Parse {
                value: s,
                target: ValueType::Guid,
            }),
        other => Err(ConversionError::unsupported(&other, &ValueType::Guid)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_null_only_fits_optional() {
        assert_eq!(
            convert(Value::Null, &ValueType::optional(ValueType::I32)),
            Ok(Value::Null)
        );
        assert_eq!(
            convert(Value::Null, &ValueType::I32),
            Err(ConversionError::NullToNonNullable { target: ValueType::I32 })
        );
        assert!(convert(Value::Null, &ValueType::String).is_err());
    }

    #[test]
    fn test_integer_range_checks() {
        assert_eq!(convert(Value::Int(127), &ValueType::I8), Ok(Value::Int(127)));
        assert!(matches!(
            convert(Value::Int(128), &ValueType::I8),
            Err(ConversionError::Overflow { .. })
        ));
        assert!(matches!(
            convert(Value::Int(-1), &ValueType::U16),
            Err(ConversionError::Overflow { .. })
        ));
        assert_eq!(convert(Value::Bool(true), &ValueType::U8), Ok(Value::Int(1)));
    }

    #[test]
    fn test_float_to_integer_rounds() {
        assert_eq!(convert(Value::Float(2.6), &ValueType::I32), Ok(Value::Int(3)));
        assert!(convert(Value::Float(f64::NAN), &ValueType::I32).is_err());
        assert!(convert(Value::Float(1e20), &ValueType::I32).is_err());
    }

    #[test]
    fn test_u64_above_i64_is_text() {
        let big = u64::MAX.to_string();
        assert_eq!(
            convert(Value::String(big.clone()), &ValueType::U64),
            Ok(Value::String(big))
        );
    }

    #[test]
    fn test_string_parsing() {
        assert_eq!(convert(Value::from("1.5"), &ValueType::F64), Ok(Value::Float(1.5)));
        assert_eq!(convert(Value::from("No"), &ValueType::Bool), Ok(Value::Bool(false)));
        assert!(matches!(
            convert(Value::from("abc"), &ValueType::I32),
            Err(ConversionError::Parse { .. })
        ));

        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(
            convert(Value::from("2024-03-01T12:30:00Z"), &ValueType::DateTime),
            Ok(Value::DateTime(expected))
        );
        assert_eq!(
            convert(Value::from("2024-03-01 12:30:00"), &ValueType::DateTime),
            Ok(Value::DateTime(expected))
        );

        let id = Uuid::new_v4();
        assert_eq!(
            convert(Value::String(id.to_string()), &ValueType::Guid),
            Ok(Value::Guid(id))
        );
    }

    #[test]
    fn test_anything_to_text() {
        assert_eq!(convert(Value::Int(7), &ValueType::String), Ok(Value::from("7")));
        assert_eq!(convert(Value::Bool(false), &ValueType::String), Ok(Value::from("false")));
    }

    #[test]
    fn test_lists_convert_element_wise() {
        let list = Value::List(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(
            convert(list, &ValueType::list(ValueType::String)),
            Ok(Value::List(vec![Value::from("1"), Value::from("2")]))
        );

        let bad = Value::List(vec![Value::Int(1), Value::Null]);
        assert!(convert(bad, &ValueType::list(ValueType::I32)).is_err());
    }

    #[test]
    fn test_unsupported() {
        assert!(matches!(
            convert(Value::Int(1), &ValueType::Guid),
            Err(ConversionError::Unsupported { from: "int", .. })
        ));
    }
}
