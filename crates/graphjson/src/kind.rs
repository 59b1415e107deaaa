use std::fmt;

/// Structural category of a value, used for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Char,
    Int,
    Float,
    String,
    Array,
    Seq,
    Record,
    Set,
    Enum,
    Ref,
    Opaque,
    /// Subrange of an ordinal type; handled as its base kind.
    Range,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Bool => "boolean",
            Kind::Char => "character",
            Kind::Int => "integer",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Seq => "sequence",
            Kind::Record => "record",
            Kind::Set => "set",
            Kind::Enum => "enumeration",
            Kind::Ref => "reference",
            Kind::Opaque => "opaque address",
            Kind::Range => "range",
        }
    }

    /// Whether values of this kind have an integer ordinal.
    pub fn is_ordinal(self) -> bool {
        matches!(
            self,
            Kind::Bool | Kind::Char | Kind::Int | Kind::Enum | Kind::Range
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
