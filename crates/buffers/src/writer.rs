//! Text buffer writer with auto-growing capacity.

use std::io;

/// A text sink that grows automatically as needed.
///
/// Fragments are appended at the cursor; [`Writer::flush`] hands back
/// everything written since the previous flush.
///
/// # Example
///
/// ```
/// use graphjson_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(b'[');
/// writer.ascii("1, 2");
/// writer.u8(b']');
/// assert_eq!(writer.flush_string(), "[1, 2]");
/// ```
pub struct Writer {
    /// The underlying byte buffer.
    pub uint8: Vec<u8>,
    /// Position where last flush happened.
    pub x0: usize,
    /// Current cursor position.
    pub x: usize,
    /// Allocation size when buffer needs to grow.
    alloc_size: usize,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// Creates a new writer with default allocation size (16KB).
    pub fn new() -> Self {
        Self::with_alloc_size(16 * 1024)
    }

    /// Creates a new writer with custom allocation size.
    pub fn with_alloc_size(alloc_size: usize) -> Self {
        let alloc_size = alloc_size.max(1);
        Self {
            uint8: vec![0u8; alloc_size],
            x0: 0,
            x: 0,
            alloc_size,
        }
    }

    /// Ensures the buffer has at least `capacity` bytes available.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        let remaining = self.uint8.len() - self.x;
        if remaining < capacity {
            let total = self.uint8.len() - self.x0;
            let required = capacity - remaining;
            let total_required = total + required;
            let new_size = if total_required <= self.alloc_size {
                self.alloc_size
            } else {
                total_required * 2
            };
            self.grow(new_size);
        }
    }

    fn grow(&mut self, new_size: usize) {
        let x0 = self.x0;
        let x = self.x;
        let mut new_buf = vec![0u8; new_size];
        new_buf[..x - x0].copy_from_slice(&self.uint8[x0..x]);
        self.uint8 = new_buf;
        self.x = x - x0;
        self.x0 = 0;
    }

    /// Drops anything written since the last flush.
    pub fn reset(&mut self) {
        self.x = self.x0;
    }

    /// Number of bytes written since the last flush.
    pub fn pending(&self) -> usize {
        self.x - self.x0
    }

    /// Returns the written data and advances the flush position.
    pub fn flush(&mut self) -> Vec<u8> {
        let result = self.uint8[self.x0..self.x].to_vec();
        self.x0 = self.x;
        result
    }

    /// Like [`Writer::flush`], but returns text.
    ///
    /// Everything the writer accepts through [`Writer::utf8`] and
    /// [`Writer::ascii`] is valid UTF-8; raw [`Writer::buf`] input that is not
    /// gets replacement characters.
    pub fn flush_string(&mut self) -> String {
        let bytes = self.flush();
        match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }

    /// Copies the pending data into `out` and advances the flush position.
    pub fn flush_to<W: io::Write>(&mut self, out: &mut W) -> io::Result<usize> {
        let len = self.pending();
        out.write_all(&self.uint8[self.x0..self.x])?;
        self.x0 = self.x;
        Ok(len)
    }

    /// Writes a single byte.
    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.ensure_capacity(1);
        self.uint8[self.x] = val;
        self.x += 1;
    }

    /// Writes a byte slice.
    pub fn buf(&mut self, buf: &[u8]) {
        let length = buf.len();
        self.ensure_capacity(length);
        self.uint8[self.x..self.x + length].copy_from_slice(buf);
        self.x += length;
    }

    /// Writes a UTF-8 string. Returns the number of bytes written.
    pub fn utf8(&mut self, s: &str) -> usize {
        self.buf(s.as_bytes());
        s.len()
    }

    /// Writes an ASCII string.
    pub fn ascii(&mut self, s: &str) {
        self.utf8(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8() {
        let mut writer = Writer::new();
        writer.u8(b'[');
        writer.u8(b']');
        assert_eq!(writer.flush(), b"[]");
    }

    #[test]
    fn test_utf8() {
        let mut writer = Writer::new();
        assert_eq!(writer.utf8("héllo"), 6);
        assert_eq!(writer.flush_string(), "héllo");
    }

    #[test]
    fn test_flush_multiple() {
        let mut writer = Writer::new();
        writer.ascii("null");
        assert_eq!(writer.flush(), b"null");
        writer.ascii("true");
        assert_eq!(writer.flush(), b"true");
    }

    #[test]
    fn test_grows_past_alloc_size() {
        let mut writer = Writer::with_alloc_size(4);
        writer.ascii("[1, 2, 3, 4, 5]");
        writer.ascii(", ");
        assert_eq!(writer.flush_string(), "[1, 2, 3, 4, 5], ");
    }

    #[test]
    fn test_grow_keeps_unflushed_tail_only() {
        let mut writer = Writer::with_alloc_size(8);
        writer.ascii("abc");
        writer.flush();
        writer.ascii("defghijklmnop");
        assert_eq!(writer.flush_string(), "defghijklmnop");
    }

    #[test]
    fn test_reset_discards_pending() {
        let mut writer = Writer::new();
        writer.ascii("kept");
        writer.flush();
        writer.ascii("dropped");
        writer.reset();
        assert_eq!(writer.pending(), 0);
        writer.ascii("x");
        assert_eq!(writer.flush_string(), "x");
    }

    #[test]
    fn test_flush_to_io() {
        let mut writer = Writer::new();
        writer.ascii("{\"a\": 1}");
        let mut out = Vec::new();
        assert_eq!(writer.flush_to(&mut out).expect("write"), 8);
        assert_eq!(out, b"{\"a\": 1}");
        assert_eq!(writer.pending(), 0);
    }

    #[test]
    fn test_flush_string_lossy_on_raw_bytes() {
        let mut writer = Writer::new();
        writer.buf(&[b'a', 0xff]);
        assert_eq!(writer.flush_string(), "a\u{fffd}");
    }
}
