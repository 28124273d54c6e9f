use super::{RefineError, Refiner};

const ZERO_WIDTH: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

/// Remove invisible characters that inflate token counts.
///
/// Zero-width characters are always removed. Control characters other than
/// `\n`, `\r` and `\t` are removed unless disabled.
#[derive(Debug, Clone, Copy)]
pub struct FixUnicode {
    remove_control_chars: bool,
}

impl FixUnicode {
    pub fn new() -> Self {
        Self {
            remove_control_chars: true,
        }
    }

    pub fn remove_control_chars(mut self, enabled: bool) -> Self {
        self.remove_control_chars = enabled;
        self
    }

    pub fn fix(&self, text: &str) -> String {
        text.chars()
            .filter(|c| !ZERO_WIDTH.contains(c))
            .filter(|c| {
                !self.remove_control_chars || !c.is_control() || matches!(c, '\n' | '\r' | '\t')
            })
            .collect()
    }
}

impl Default for FixUnicode {
    fn default() -> Self {
        Self::new()
    }
}

impl Refiner for FixUnicode {
    fn refine(&self, text: &str) -> Result<String, RefineError> {
        Ok(self.fix(text))
    }
}
