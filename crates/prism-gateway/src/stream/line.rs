//! Logical line reassembly over arbitrary byte frames

/// Reassembles complete lines from a stream of byte chunks
///
/// Network frames split records at arbitrary byte offsets; the
/// assembler buffers a trailing partial line across frames and yields
/// only complete lines, accepting both `\n` and `\r\n` endings.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buffer: Vec<u8>,
}

impl LineAssembler {
    /// Create an empty assembler
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte frame, returning every line it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop(); // the \n
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Bytes held back as an incomplete line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
