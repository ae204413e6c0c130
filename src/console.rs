//! Line assembly and tokenizing for the serial console.

use heapless::Vec;

/// Collects bytes from a serial stream into lines of at most `N` bytes.
pub struct LineReader<const N: usize> {
    buf: Vec<u8, N>,
    overflow: bool,
    complete: bool,
}

impl<const N: usize> Default for LineReader<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LineReader<N> {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            overflow: false,
            complete: false,
        }
    }

    /// Feeds one byte. Returns the completed line when `byte` is a newline; the line stays
    /// borrowed from the reader until the next call.
    ///
    /// `\r` is ignored. Bytes past the capacity are dropped, as are lines that are not UTF-8.
    pub fn push(&mut self, byte: u8) -> Option<&str> {
        if self.complete {
            self.buf.clear();
            self.overflow = false;
            self.complete = false;
        }

        match byte {
            b'\n' => {
                self.complete = true;

                #[cfg(feature = "defmt")]
                if self.overflow {
                    defmt::warn!("console: line truncated to {} bytes", N);
                }

                core::str::from_utf8(&self.buf).ok()
            }
            b'\r' => None,
            _ => {
                if self.buf.push(byte).is_err() {
                    self.overflow = true;
                }
                None
            }
        }
    }

    /// Bytes buffered for the current line.
    pub fn len(&self) -> usize {
        if self.complete { 0 } else { self.buf.len() }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Returns token `index` of `line` split on `sep`, or `""` if there is no such token.
pub fn token(line: &str, index: usize, sep: char) -> &str {
    line.split(sep).nth(index).unwrap_or("")
}
