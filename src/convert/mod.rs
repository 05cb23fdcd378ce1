//! Type Converter
//!
//! Turns the strings a store hands back into typed values.
//!
//! ## Conversion Modes
//! - **All-or-nothing**: one bulk attempt over every element; if a single
//!   element does not fit, the whole original value is returned.
//! - **Per-element**: each element converted on its own; failures stay as
//!   their original string next to the converted ones.
//!
//! Per-element mode is selected by the `_any` modifier (`"int_any"`), or
//! automatically for boolean targets when a collection contains at least one
//! boolean token. Conversion never fails: the worst case is the input back.

mod element;
mod spec;

pub use spec::{Mode, SemanticType, TypeSpec};

pub(crate) use element::is_bool_token;

use std::collections::HashSet;

use crate::value::{Data, Scalar};
use element::{convert_element, convert_element_strict, convert_or_keep};

/// Convert `value` according to a textual type spec such as `"int"`,
/// `"float"`, `"bool_any"`. Unknown specs return the value unchanged.
pub fn convert(value: Data, spec: &str) -> Data {
    convert_with(value, TypeSpec::parse(spec))
}

/// Convert with an already parsed spec
pub fn convert_with(value: Data, spec: TypeSpec) -> Data {
    let Some(target) = spec.target else {
        return value;
    };

    match select_mode(&value, spec) {
        Mode::AllOrNothing => convert_all_or_nothing(value, target),
        Mode::PerElement => convert_per_element(value, target),
    }
}

/// Pick the mode a spec resolves to for this particular value
pub fn select_mode(value: &Data, spec: TypeSpec) -> Mode {
    if spec.per_element {
        return Mode::PerElement;
    }

    if spec.target == Some(SemanticType::Boolean) {
        let has_token = match value {
            Data::Scalar(_) => false,
            Data::List(items) => items.iter().any(is_token_element),
            Data::Set(items) => items.iter().any(is_token_element),
        };
        if has_token {
            return Mode::PerElement;
        }
    }

    Mode::AllOrNothing
}

fn is_token_element(item: &Scalar) -> bool {
    is_bool_token(&item.to_wire())
}

fn convert_all_or_nothing(value: Data, target: SemanticType) -> Data {
    match value {
        Data::Scalar(item) => {
            let converted = convert_or_keep(&item, target);
            Data::Scalar(converted)
        }
        Data::List(items) => {
            match items
                .iter()
                .map(|item| convert_element_strict(&item.to_wire(), target))
                .collect::<Option<Vec<_>>>()
            {
                Some(converted) => Data::List(converted),
                None => Data::List(items),
            }
        }
        Data::Set(items) => {
            match items
                .iter()
                .map(|item| convert_element_strict(&item.to_wire(), target))
                .collect::<Option<HashSet<_>>>()
            {
                Some(converted) => Data::Set(converted),
                None => Data::Set(items),
            }
        }
    }
}

fn convert_per_element(value: Data, target: SemanticType) -> Data {
    match value {
        Data::Scalar(item) => Data::Scalar(convert_or_keep(&item, target)),
        Data::List(items) => Data::List(
            items
                .iter()
                .map(|item| convert_or_keep(item, target))
                .collect(),
        ),
        Data::Set(items) => Data::Set(
            items
                .iter()
                .map(|item| convert_or_keep(item, target))
                .collect(),
        ),
    }
}
