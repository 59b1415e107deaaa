/// What a bare identity token that was never allocated in the document
/// decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DanglingRefs {
    /// Decode to an empty reference.
    #[default]
    Nil,
    /// Fail with [`crate::MarshalError::DanglingRef`].
    Reject,
}

/// Knobs for [`crate::Codec`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Options {
    pub dangling_refs: DanglingRefs,
    /// Accept content after the document when loading from complete text.
    pub allow_trailing: bool,
    /// Maximum container nesting accepted while decoding.
    pub max_depth: Option<usize>,
}

impl Options {
    pub fn strict() -> Self {
        Self {
            dangling_refs: DanglingRefs::Reject,
            ..Self::default()
        }
    }
}
