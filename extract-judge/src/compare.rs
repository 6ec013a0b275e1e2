//! Field comparison strategies

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::outcome::MismatchKind;
use crate::value::Value;

/// Decides whether a predicted value matches its expected value
pub trait FieldComparator: Send + Sync {
    fn name(&self) -> &'static str;

    fn compare(&self, expected: &Value, actual: &Value) -> bool;
}

/// Optional string normalization applied before text comparison.
///
/// The default is exact comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNormalization {
    /// Strip leading and trailing whitespace
    #[serde(default)]
    pub trim: bool,
    /// Collapse internal whitespace runs to a single space
    #[serde(default)]
    pub collapse_whitespace: bool,
    /// Compare case-insensitively
    #[serde(default)]
    pub case_insensitive: bool,
}

impl TextNormalization {
    pub fn exact() -> Self {
        Self::default()
    }

    /// Every normalization switched on
    pub fn lenient() -> Self {
        Self {
            trim: true,
            collapse_whitespace: true,
            case_insensitive: true,
        }
    }

    pub fn is_exact(&self) -> bool {
        *self == Self::exact()
    }

    pub fn apply<'a>(&self, s: &'a str) -> Cow<'a, str> {
        if self.is_exact() {
            return Cow::Borrowed(s);
        }

        let mut out: Cow<'a, str> = if self.trim {
            Cow::Borrowed(s.trim())
        } else {
            Cow::Borrowed(s)
        };
        if self.collapse_whitespace {
            let collapsed = out.split_whitespace().collect::<Vec<_>>().join(" ");
            // split_whitespace drops edge whitespace; keep one space per edge when trim is off
            out = if self.trim || out.trim() == out.as_ref() {
                Cow::Owned(collapsed)
            } else if collapsed.is_empty() {
                Cow::Borrowed(" ")
            } else {
                let lead = if out.starts_with(char::is_whitespace) { " " } else { "" };
                let trail = if out.ends_with(char::is_whitespace) { " " } else { "" };
                Cow::Owned(format!("{}{}{}", lead, collapsed, trail))
            };
        }
        if self.case_insensitive {
            out = Cow::Owned(out.to_lowercase());
        }
        out
    }
}

/// Structural, type-aware equality.
///
/// - strings compare after the configured [`TextNormalization`]
/// - `Int` and `Float` compare by numeric value
/// - a `Date` equals a string holding the same `YYYY-MM-DD` date
/// - `Null` equals only `Null`
/// - arrays compare element-wise in order
/// - objects compare key by key, an absent key reading as `Null`
#[derive(Debug, Clone, Copy, Default)]
pub struct TypedFieldComparator {
    text: TextNormalization,
}

impl TypedFieldComparator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text_normalization(mut self, text: TextNormalization) -> Self {
        self.text = text;
        self
    }

    pub fn text_normalization(&self) -> TextNormalization {
        self.text
    }

    /// Compare and say what kind of mismatch it is, or `None` when equal
    pub fn classify(&self, expected: &Value, actual: &Value) -> Option<MismatchKind> {
        if self.equal(expected, actual) {
            return None;
        }
        Some(mismatch_kind(expected, actual))
    }

    fn equal(&self, expected: &Value, actual: &Value) -> bool {
        match (expected, actual) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                expected.as_f64() == actual.as_f64()
            }
            (Value::String(a), Value::String(b)) => self.text.apply(a) == self.text.apply(b),
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Date(d), Value::String(s)) | (Value::String(s), Value::Date(d)) => {
                crate::value::parse_date(s) == Some(*d)
            }
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.equal(x, y))
            }
            (Value::Object(a), Value::Object(b)) => {
                let null = Value::Null;
                a.iter()
                    .all(|(k, v)| self.equal(v, b.get(k).unwrap_or(&null)))
                    && b.iter()
                        .filter(|(k, _)| !a.contains_key(k.as_str()))
                        .all(|(_, v)| v.is_null())
            }
            _ => false,
        }
    }
}

impl FieldComparator for TypedFieldComparator {
    fn name(&self) -> &'static str {
        "typed"
    }

    fn compare(&self, expected: &Value, actual: &Value) -> bool {
        self.equal(expected, actual)
    }
}

/// Kind of a disagreement already known to be one. A null or absent
/// prediction is `Missing`, whichever comparator found the difference.
pub fn mismatch_kind(expected: &Value, actual: &Value) -> MismatchKind {
    if actual.is_null() {
        MismatchKind::Missing
    } else if expected.is_null() || compatible_types(expected, actual) {
        MismatchKind::WrongValue
    } else {
        MismatchKind::TypeMismatch
    }
}

fn compatible_types(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => true,
        (Value::Date(_) | Value::String(_), Value::Date(_) | Value::String(_)) => true,
        _ => std::mem::discriminant(a) == std::mem::discriminant(b),
    }
}

/// Equality of flat string renderings (see [`Value::to_flat_string`]).
///
/// Used where heterogeneous candidates must be ranked uniformly. `Null`
/// renders as `null` but only equals `Null`, so the string `"null"` never
/// stands in for a missing value.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringEqualityComparator;

impl StringEqualityComparator {
    /// The comparable key of a value
    pub fn key(&self, value: &Value) -> String {
        value.to_flat_string()
    }
}

impl FieldComparator for StringEqualityComparator {
    fn name(&self) -> &'static str {
        "string"
    }

    fn compare(&self, expected: &Value, actual: &Value) -> bool {
        match (expected.is_null(), actual.is_null()) {
            (true, true) => true,
            (false, false) => self.key(expected) == self.key(actual),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn typed() -> TypedFieldComparator {
        TypedFieldComparator::new()
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert!(typed().compare(&Value::Int(10), &Value::Float(10.0)));
        assert!(!typed().compare(&Value::Int(10), &Value::Float(10.5)));
        assert!(!typed().compare(&Value::Int(1), &Value::Bool(true)));
    }

    #[test]
    fn test_strings_are_exact_by_default() {
        assert!(typed().compare(&Value::from("Email"), &Value::from("Email")));
        assert!(!typed().compare(&Value::from("Email"), &Value::from("email")));
        assert!(!typed().compare(&Value::from("Email"), &Value::from(" Email")));
    }

    #[test]
    fn test_text_normalization_options() {
        let lenient = typed().with_text_normalization(TextNormalization::lenient());
        assert!(lenient.compare(&Value::from("New  York "), &Value::from("new york")));

        let trim_only = typed().with_text_normalization(TextNormalization {
            trim: true,
            ..Default::default()
        });
        assert!(trim_only.compare(&Value::from(" ACME "), &Value::from("ACME")));
        assert!(!trim_only.compare(&Value::from("ACME"), &Value::from("acme")));
    }

    #[test]
    fn test_collapse_without_trim_keeps_edges() {
        let text = TextNormalization {
            collapse_whitespace: true,
            ..Default::default()
        };
        assert_eq!(text.apply(" a   b "), " a b ");
        assert_eq!(text.apply("\t\ta"), " a");
    }

    #[test]
    fn test_collapse_without_trim_on_blank_strings() {
        let text = TextNormalization {
            collapse_whitespace: true,
            ..Default::default()
        };
        assert_eq!(text.apply("  "), " ");
        assert_eq!(text.apply(" "), " ");
        assert_eq!(text.apply(" \n\t "), " ");
        assert_eq!(text.apply(""), "");

        let c = typed().with_text_normalization(text);
        assert!(c.compare(&Value::from("   "), &Value::from(" ")));
    }

    #[test]
    fn test_dates_compare_as_dates() {
        let date = Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(typed().compare(&date, &Value::from("2024-02-29")));
        assert!(!typed().compare(&date, &Value::from("2024-03-01")));
        assert!(!typed().compare(&date, &Value::from("29/02/2024")));
    }

    #[test]
    fn test_null_only_equals_null() {
        assert!(typed().compare(&Value::Null, &Value::Null));
        assert!(!typed().compare(&Value::Null, &Value::from("")));
        assert!(!typed().compare(&Value::from(""), &Value::Null));
    }

    #[test]
    fn test_containers_are_structural() {
        let a = Value::from(json!({"x": [1, 2], "y": null}));
        let b = Value::from(json!({"x": [1.0, 2]}));
        let c = Value::from(json!({"x": [2, 1]}));
        assert!(typed().compare(&a, &b));
        assert!(!typed().compare(&a, &c));
    }

    #[test]
    fn test_classify_kinds() {
        let c = typed();
        assert_eq!(c.classify(&Value::from("a"), &Value::from("a")), None);
        assert_eq!(c.classify(&Value::from("a"), &Value::Null), Some(MismatchKind::Missing));
        assert_eq!(
            c.classify(&Value::from("a"), &Value::from("b")),
            Some(MismatchKind::WrongValue)
        );
        assert_eq!(
            c.classify(&Value::Int(4), &Value::from("4")),
            Some(MismatchKind::TypeMismatch)
        );
    }

    #[test]
    fn test_string_equality_unifies_types() {
        let s = StringEqualityComparator;
        assert!(s.compare(&Value::Int(3), &Value::from("3")));
        assert!(s.compare(&Value::Float(3.0), &Value::Int(3)));
        assert!(!s.compare(&Value::from("Email"), &Value::from("email")));
    }

    #[test]
    fn test_string_equality_keeps_null_apart() {
        let s = StringEqualityComparator;
        assert!(s.compare(&Value::Null, &Value::Null));
        assert!(!s.compare(&Value::Null, &Value::from("null")));
        assert!(!s.compare(&Value::from("null"), &Value::Null));
        assert_eq!(s.key(&Value::Null), "null");
    }
}
