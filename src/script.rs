use std::borrow::Cow;

/// Characters of script embedded in each image prompt.
pub const IMAGE_PROMPT_SCRIPT_CHARS: usize = 500;

const ELLIPSIS: &str = "...";

/// Script text supplied for one request. Leading and trailing whitespace is
/// dropped on construction; everything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Script(String);

impl Script {
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(text.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    /// First `limit` characters, with `...` appended when anything was cut.
    /// Counts chars, so multi-byte text is never split mid-codepoint.
    pub fn truncated(&self, limit: usize) -> Cow<'_, str> {
        match self.0.char_indices().nth(limit) {
            None => Cow::Borrowed(&self.0),
            Some((cut, _)) => Cow::Owned(format!("{}{ELLIPSIS}", &self.0[..cut])),
        }
    }
}
