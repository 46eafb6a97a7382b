//! Field values and their textual form.

use std::fmt;

use crate::field::FieldType;

/// One parsed field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Uint(u64),
    Float(f64),
    Hex(u64),
    Word(String),
    Bool(bool),
}

impl Value {
    /// Parse `token` as `field_type`.
    ///
    /// Returns `None` when the token does not fit the type. `Skip` never
    /// parses: ignored slots consume no token.
    pub fn parse(field_type: FieldType, token: &str) -> Option<Self> {
        match field_type {
            FieldType::Int => token.parse().ok().map(Self::Int),
            FieldType::Uint => token.parse().ok().map(Self::Uint),
            FieldType::Float => token
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Self::Float),
            FieldType::Hex => parse_hex(token).map(Self::Hex),
            FieldType::Word => is_word(token).then(|| Self::Word(token.to_string())),
            FieldType::Bool => parse_bool(token).map(Self::Bool),
            FieldType::Skip => None,
        }
    }

    /// Whether `token` would parse as `field_type`, without allocating.
    pub fn accepts(field_type: FieldType, token: &str) -> bool {
        match field_type {
            FieldType::Word => is_word(token),
            FieldType::Skip => false,
            FieldType::Int => token.parse::<i64>().is_ok(),
            FieldType::Uint => token.parse::<u64>().is_ok(),
            FieldType::Float => token.parse::<f64>().is_ok_and(|f| f.is_finite()),
            FieldType::Hex => parse_hex(token).is_some(),
            FieldType::Bool => parse_bool(token).is_some(),
        }
    }

    /// The field type this value belongs to.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Int(_) => FieldType::Int,
            Self::Uint(_) => FieldType::Uint,
            Self::Float(_) => FieldType::Float,
            Self::Hex(_) => FieldType::Hex,
            Self::Word(_) => FieldType::Word,
            Self::Bool(_) => FieldType::Bool,
        }
    }

    /// Whether the value can be written as a single token that reads back
    /// to the same value.
    pub fn is_printable(&self) -> bool {
        match self {
            Self::Word(word) => is_word(word),
            Self::Float(f) => f.is_finite(),
            _ => true,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_word(&self) -> Option<&str> {
        match self {
            Self::Word(w) => Some(w),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Hex(v) => write!(f, "0x{v:x}"),
            Self::Word(w) => f.write_str(w),
            Self::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Word(v.to_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// Characters the reader strips or splits on; a word containing one would
/// not survive a write/read cycle.
fn is_reserved(c: char) -> bool {
    c.is_whitespace() || c.is_control() || matches!(c, ',' | '#' | ';')
}

fn is_word(token: &str) -> bool {
    !token.is_empty() && !token.chars().any(is_reserved)
}

fn parse_hex(token: &str) -> Option<u64> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    if digits.is_empty() || digits.starts_with('+') {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

fn parse_bool(token: &str) -> Option<bool> {
    if token == "1" || token.eq_ignore_ascii_case("true") {
        Some(true)
    } else if token == "0" || token.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FieldType::Int, "-42", Some(Value::Int(-42)))]
    #[case(FieldType::Int, "4.2", None)]
    #[case(FieldType::Uint, "-1", None)]
    #[case(FieldType::Uint, "18", Some(Value::Uint(18)))]
    #[case(FieldType::Float, "1.25", Some(Value::Float(1.25)))]
    #[case(FieldType::Float, "7", Some(Value::Float(7.0)))]
    #[case(FieldType::Float, "nan", None)]
    #[case(FieldType::Float, "inf", None)]
    #[case(FieldType::Hex, "0x1F", Some(Value::Hex(0x1f)))]
    #[case(FieldType::Hex, "ff", Some(Value::Hex(0xff)))]
    #[case(FieldType::Hex, "0x", None)]
    #[case(FieldType::Hex, "0xg1", None)]
    #[case(FieldType::Bool, "TRUE", Some(Value::Bool(true)))]
    #[case(FieldType::Bool, "0", Some(Value::Bool(false)))]
    #[case(FieldType::Bool, "yes", None)]
    #[case(FieldType::Word, "iron_sword", Some(Value::Word("iron_sword".into())))]
    #[case(FieldType::Skip, "anything", None)]
    fn parse_tokens(
        #[case] field_type: FieldType,
        #[case] token: &str,
        #[case] expected: Option<Value>,
    ) {
        assert_eq!(Value::parse(field_type, token), expected);
        assert_eq!(Value::accepts(field_type, token), expected.is_some());
    }

    #[rstest]
    #[case(Value::Int(-3), "-3")]
    #[case(Value::Float(0.5), "0.5")]
    #[case(Value::Float(3.0), "3")]
    #[case(Value::Hex(255), "0xff")]
    #[case(Value::Bool(true), "1")]
    #[case(Value::Word("gold".into()), "gold")]
    fn display_tokens(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
        assert_eq!(Value::parse(value.field_type(), expected), Some(value));
    }

    #[test]
    fn words_with_reserved_characters_are_not_printable() {
        assert!(!Value::Word("a b".into()).is_printable());
        assert!(!Value::Word("a,b".into()).is_printable());
        assert!(!Value::Word("a#b".into()).is_printable());
        assert!(!Value::Word(String::new()).is_printable());
        assert!(!Value::Float(f64::NAN).is_printable());
        assert!(Value::Word("a-b".into()).is_printable());
    }
}
