//! Polymorphic comparable values used as B-tree keys.

use crate::types::TypeId;
use serde::{Deserialize, Serialize};

/// A single typed datum. Every key held by a LarchDB index is a `Value`.
///
/// `Null` doubles as the unbounded range sentinel: it sorts strictly before
/// every other variant, and the range API treats a `Null` bound as "no bound
/// on this side", so the same sentinel serves both ends of a window.
///
/// All keys stored in one tree must share a variant; comparing values of
/// mismatched non-null variants is a logic error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Char(char),
    Varchar(String),
    Composite(Vec<Value>),
}

impl Value {
    /// Returns the type identifier for this value's variant.
    pub fn type_id(&self) -> TypeId {
        match self {
            Value::Null => TypeId::Null,
            Value::Boolean(_) => TypeId::Boolean,
            Value::Int8(_) => TypeId::Int8,
            Value::Int16(_) => TypeId::Int16,
            Value::Int32(_) => TypeId::Int32,
            Value::Int64(_) => TypeId::Int64,
            Value::Float32(_) => TypeId::Float32,
            Value::Float64(_) => TypeId::Float64,
            Value::Char(_) => TypeId::Char,
            Value::Varchar(_) => TypeId::Varchar,
            Value::Composite(_) => TypeId::Composite,
        }
    }

    /// Returns true for the `Null` sentinel.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Strict ordering. `Null` sorts before every other variant; a non-null
    /// value is never less than `Null`.
    ///
    /// Composite values compare field-wise lexicographically. Mismatched
    /// non-null variants trip a debug assertion and fall back to the
    /// `TypeId` rank so the ordering stays deterministic in release builds.
    pub fn is_less(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => false,
            (Value::Null, _) => true,
            (_, Value::Null) => false,
            (Value::Boolean(a), Value::Boolean(b)) => a < b,
            (Value::Int8(a), Value::Int8(b)) => a < b,
            (Value::Int16(a), Value::Int16(b)) => a < b,
            (Value::Int32(a), Value::Int32(b)) => a < b,
            (Value::Int64(a), Value::Int64(b)) => a < b,
            (Value::Float32(a), Value::Float32(b)) => a < b,
            (Value::Float64(a), Value::Float64(b)) => a < b,
            (Value::Char(a), Value::Char(b)) => a < b,
            (Value::Varchar(a), Value::Varchar(b)) => a < b,
            (Value::Composite(a), Value::Composite(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    if x.is_less(y) {
                        return true;
                    }
                    if y.is_less(x) {
                        return false;
                    }
                }
                a.len() < b.len()
            }
            (a, b) => {
                debug_assert!(
                    false,
                    "comparing incompatible values: {} vs {}",
                    a.type_id(),
                    b.type_id()
                );
                (a.type_id() as u8) < (b.type_id() as u8)
            }
        }
    }

    /// Serialized size of this value in bytes.
    ///
    /// Scalars are fixed width; a varchar is a 4-byte length prefix plus two
    /// bytes per UTF-16 code unit; a composite sums its fields.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 4,
            Value::Int8(_) => 1,
            Value::Int16(_) => 2,
            Value::Int32(_) => 4,
            Value::Int64(_) => 8,
            Value::Float32(_) => 4,
            Value::Float64(_) => 8,
            Value::Char(_) => 2,
            Value::Varchar(s) => 4 + 2 * s.encode_utf16().count(),
            Value::Composite(fields) => fields.iter().map(Value::size_in_bytes).sum(),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "'{}'", v),
            Value::Varchar(v) => write!(f, "'{}'", v),
            Value::Composite(fields) => {
                write!(f, "(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sorts_before_everything() {
        let null = Value::Null;
        assert!(null.is_less(&Value::Int32(i32::MIN)));
        assert!(null.is_less(&Value::Boolean(false)));
        assert!(null.is_less(&Value::Varchar(String::new())));
        assert!(null.is_less(&Value::Composite(vec![])));
        assert!(!null.is_less(&Value::Null));

        assert!(!Value::Int32(i32::MIN).is_less(&null));
        assert!(!Value::Varchar(String::new()).is_less(&null));
    }

    #[test]
    fn test_integer_ordering() {
        assert!(Value::Int32(1).is_less(&Value::Int32(2)));
        assert!(!Value::Int32(2).is_less(&Value::Int32(1)));
        assert!(!Value::Int32(2).is_less(&Value::Int32(2)));
        assert!(Value::Int64(-5).is_less(&Value::Int64(0)));
        assert!(Value::Int8(-128).is_less(&Value::Int8(127)));
    }

    #[test]
    fn test_float_and_char_ordering() {
        assert!(Value::Float64(1.5).is_less(&Value::Float64(2.5)));
        assert!(Value::Float32(-0.5).is_less(&Value::Float32(0.5)));
        assert!(Value::Char('a').is_less(&Value::Char('b')));
        assert!(Value::Boolean(false).is_less(&Value::Boolean(true)));
    }

    #[test]
    fn test_varchar_ordering() {
        assert!(Value::Varchar("abc".into()).is_less(&Value::Varchar("abd".into())));
        assert!(Value::Varchar("ab".into()).is_less(&Value::Varchar("abc".into())));
        assert!(!Value::Varchar("b".into()).is_less(&Value::Varchar("ab".into())));
    }

    #[test]
    fn test_composite_lexicographic_ordering() {
        let a = Value::Composite(vec![Value::Int32(1), Value::Varchar("x".into())]);
        let b = Value::Composite(vec![Value::Int32(1), Value::Varchar("y".into())]);
        let c = Value::Composite(vec![Value::Int32(2), Value::Varchar("a".into())]);
        assert!(a.is_less(&b));
        assert!(b.is_less(&c));
        assert!(a.is_less(&c));
        assert!(!b.is_less(&a));

        // A prefix sorts before its extension.
        let short = Value::Composite(vec![Value::Int32(1)]);
        let long = Value::Composite(vec![Value::Int32(1), Value::Int32(0)]);
        assert!(short.is_less(&long));
        assert!(!long.is_less(&short));
    }

    #[test]
    fn test_equality_is_variant_aware() {
        assert_eq!(Value::Int32(5), Value::Int32(5));
        assert_ne!(Value::Int32(5), Value::Int32(6));
        assert_ne!(Value::Int32(5), Value::Int64(5));
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Null, Value::Int32(0));
        assert_eq!(
            Value::Composite(vec![Value::Int32(1)]),
            Value::Composite(vec![Value::Int32(1)])
        );
    }

    #[test]
    fn test_scalar_sizes() {
        assert_eq!(Value::Null.size_in_bytes(), 0);
        assert_eq!(Value::Boolean(true).size_in_bytes(), 4);
        assert_eq!(Value::Int8(0).size_in_bytes(), 1);
        assert_eq!(Value::Int16(0).size_in_bytes(), 2);
        assert_eq!(Value::Int32(0).size_in_bytes(), 4);
        assert_eq!(Value::Int64(0).size_in_bytes(), 8);
        assert_eq!(Value::Float32(0.0).size_in_bytes(), 4);
        assert_eq!(Value::Float64(0.0).size_in_bytes(), 8);
        assert_eq!(Value::Char('x').size_in_bytes(), 2);
    }

    #[test]
    fn test_varchar_size_counts_utf16_units() {
        assert_eq!(Value::Varchar("".into()).size_in_bytes(), 4);
        assert_eq!(Value::Varchar("abc".into()).size_in_bytes(), 4 + 6);
        // One code point outside the BMP takes a surrogate pair.
        assert_eq!(Value::Varchar("\u{1F600}".into()).size_in_bytes(), 4 + 4);
    }

    #[test]
    fn test_composite_size_recurses() {
        let v = Value::Composite(vec![
            Value::Int32(7),
            Value::Varchar("ab".into()),
            Value::Null,
            Value::Composite(vec![Value::Int64(1)]),
        ]);
        assert_eq!(v.size_in_bytes(), 4 + (4 + 4) + 0 + 8);
    }

    #[test]
    fn test_type_id_mapping() {
        assert_eq!(Value::Null.type_id(), TypeId::Null);
        assert_eq!(Value::Int32(1).type_id(), TypeId::Int32);
        assert_eq!(Value::Varchar("x".into()).type_id(), TypeId::Varchar);
        assert_eq!(Value::Composite(vec![]).type_id(), TypeId::Composite);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Int32(42).to_string(), "42");
        assert_eq!(Value::Varchar("hi".into()).to_string(), "'hi'");
        assert_eq!(
            Value::Composite(vec![Value::Int32(1), Value::Char('a')]).to_string(),
            "(1, 'a')"
        );
    }
}
