//! Line assembly for raw process output.

/// Splits a byte stream into lines.
///
/// Reads from a pipe end wherever the OS decides, so a connection code or a
/// `1024/2048` ratio can arrive in two pieces. Lines end at `\n` or at `\r`,
/// which progress bars use to redraw in place.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();

        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                if !self.pending.is_empty() {
                    lines.push(String::from_utf8_lossy(&self.pending).into_owned());
                    self.pending.clear();
                }
            } else {
                self.pending.push(byte);
            }
        }

        lines
    }

    /// Take whatever is left once the stream hit EOF.
    pub fn finish(&mut self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_lines_are_held() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"Wormhole code is: 3-app").is_empty());
        assert!(!buffer.is_empty());

        let lines = buffer.push(b"le-banana\n45%\n");
        assert_eq!(lines, vec!["Wormhole code is: 3-apple-banana", "45%"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_carriage_return_ends_line() {
        let mut buffer = LineBuffer::new();
        let lines = buffer.push(b"10%\r20%\r30%\r\n");
        assert_eq!(lines, vec!["10%", "20%", "30%"]);
    }

    #[test]
    fn test_finish_flushes_remainder() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"connection refused").is_empty());
        assert_eq!(buffer.finish().as_deref(), Some("connection refused"));
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_split_utf8_sequence() {
        let mut buffer = LineBuffer::new();
        let bytes = "Receiving “report.pdf”\n".as_bytes();
        let (head, tail) = bytes.split_at(12);
        assert!(buffer.push(head).is_empty());
        assert_eq!(buffer.push(tail), vec!["Receiving “report.pdf”"]);
    }
}
