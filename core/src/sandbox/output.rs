/// In-memory replacement for standard output.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    text: String,
    limit: usize,
}

/// Writing would take the buffer past its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLimitReached {
    pub limit: usize,
}

impl OutputBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            text: String::new(),
            limit,
        }
    }

    /// Append `text`. On overflow the part that fits is kept, cut at a
    /// character boundary.
    pub fn write(&mut self, text: &str) -> Result<(), OutputLimitReached> {
        let room = self.limit.saturating_sub(self.text.len());
        if text.len() <= room {
            self.text.push_str(text);
            return Ok(());
        }
        let mut cut = room;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        self.text.push_str(&text[..cut]);
        Err(OutputLimitReached { limit: self.limit })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_within_limit() {
        let mut buffer = OutputBuffer::new(16);
        buffer.write("hello\n").unwrap();
        buffer.write("world\n").unwrap();
        assert_eq!(buffer.as_str(), "hello\nworld\n");
    }

    #[test]
    fn test_overflow_keeps_prefix() {
        let mut buffer = OutputBuffer::new(4);
        assert_eq!(buffer.write("héllo"), Err(OutputLimitReached { limit: 4 }));
        assert_eq!(buffer.into_string(), "hél");
    }
}
