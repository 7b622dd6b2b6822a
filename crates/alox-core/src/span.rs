/// A location of something in the source text: zero-based line, byte offset
/// from the start of the file, and length in bytes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SourceLocation {
    pub line: u32,
    pub offset: u32,
    pub length: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}+{}", self.line + 1, self.offset, self.length)
    }
}

impl SourceLocation {
    pub fn new(line: u32, offset: u32, length: u32) -> SourceLocation {
        SourceLocation {
            line,
            offset,
            length,
        }
    }

    /// End offset (exclusive).
    pub fn end(&self) -> u32 {
        self.offset.saturating_add(self.length)
    }
}
