//! Type spec parsing
//!
//! A type spec is `base[_modifier]`, split once on `_`.

/// Target type a stored string can be converted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticType {
    Integer,
    Float,
    Boolean,
}

impl SemanticType {
    /// Resolve a base token, `None` for anything unrecognized
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "int" | "integer" => Some(SemanticType::Integer),
            "float" | "double" | "numeric" => Some(SemanticType::Float),
            "bool" | "boolean" => Some(SemanticType::Boolean),
            _ => None,
        }
    }
}

/// How a collection is converted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every element converts or the original value comes back untouched
    AllOrNothing,
    /// Each element on its own; failures stay as strings
    PerElement,
}

/// Parsed form of a type spec such as `"int"` or `"bool_any"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSpec {
    /// `None` means identity: the value is returned unchanged
    pub target: Option<SemanticType>,
    /// `_any` modifier present
    pub per_element: bool,
}

impl TypeSpec {
    /// Modifier forcing per-element conversion
    pub const ANY_MODIFIER: &'static str = "any";

    pub fn parse(spec: &str) -> Self {
        let (base, modifier) = match spec.split_once('_') {
            Some((base, modifier)) => (base, Some(modifier)),
            None => (spec, None),
        };

        Self {
            target: SemanticType::from_token(base),
            per_element: modifier == Some(Self::ANY_MODIFIER),
        }
    }
}

impl From<&str> for TypeSpec {
    fn from(spec: &str) -> Self {
        TypeSpec::parse(spec)
    }
}
