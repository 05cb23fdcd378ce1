//! Element conversion rules
//!
//! Crate-private: the public surface is `convert::convert`.

use super::spec::SemanticType;
use crate::value::Scalar;

/// Tokens read back as `true`
pub(crate) const TRUE_TOKENS: [&str; 3] = ["1", "True", "true"];

/// Tokens read back as `false`
pub(crate) const FALSE_TOKENS: [&str; 4] = ["0", "False", "false", ""];

pub(crate) fn is_bool_token(s: &str) -> bool {
    TRUE_TOKENS.contains(&s) || FALSE_TOKENS.contains(&s)
}

/// Convert one stored element, `None` when it does not fit the target.
///
/// Integers are truncated on the text: everything from the first `.` is
/// dropped before parsing, so `"-1.9"` becomes `-1`.
pub(crate) fn convert_element(raw: &str, target: SemanticType) -> Option<Scalar> {
    match target {
        SemanticType::Integer => {
            let digits = match raw.find('.') {
                Some(idx) => &raw[..idx],
                None => raw,
            };
            digits.parse::<i64>().ok().map(Scalar::Int)
        }
        SemanticType::Float => raw.parse::<f64>().ok().map(Scalar::Float),
        SemanticType::Boolean => {
            if TRUE_TOKENS.contains(&raw) {
                Some(Scalar::Bool(true))
            } else if FALSE_TOKENS.contains(&raw) {
                Some(Scalar::Bool(false))
            } else {
                None
            }
        }
    }
}

/// Bulk variant used by all-or-nothing collection conversion.
///
/// Integers go through the plain constructor here, without truncation.
pub(crate) fn convert_element_strict(raw: &str, target: SemanticType) -> Option<Scalar> {
    match target {
        SemanticType::Integer => raw.parse::<i64>().ok().map(Scalar::Int),
        _ => convert_element(raw, target),
    }
}

/// Per-element conversion that keeps the original on failure
pub(crate) fn convert_or_keep(item: &Scalar, target: SemanticType) -> Scalar {
    let raw = item.to_wire();
    convert_element(&raw, target).unwrap_or_else(|| item.clone())
}
