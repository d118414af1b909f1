/// Append-only capture buffer shared between a worker and its readers.
///
/// Writers append raw bytes; readers take text snapshots at any time.
/// A snapshot never includes a trailing, partially-written UTF-8 sequence,
/// so successive snapshots always extend the previous one.
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

/// A cheaply-cloneable handle to one capture buffer.
#[derive(Clone, Debug, Default)]
pub struct CaptureBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes to the end of the buffer.
    pub fn append(&self, bytes: &[u8]) {
        self.inner.lock().extend_from_slice(bytes);
    }

    /// Text written so far. Non-destructive and repeatable.
    pub fn contents(&self) -> String {
        let bytes = self.inner.lock();
        let settled = settled_len(&bytes);
        String::from_utf8_lossy(&bytes[..settled]).into_owned()
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` if both handles point at the same underlying buffer.
    pub fn same_buffer(&self, other: &CaptureBuffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl io::Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Length of `bytes` excluding an incomplete UTF-8 sequence at the very end.
///
/// A writer may be caught between the bytes of a multi-byte character; that
/// tail is held back until the rest arrives.
fn settled_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    // A UTF-8 sequence is at most 4 bytes, so only the last 3 can be a
    // dangling prefix.
    for back in 1..=len.min(3) {
        let b = bytes[len - back];
        if b & 0b1100_0000 == 0b1000_0000 {
            // Continuation byte, keep looking for the lead byte.
            continue;
        }
        let width = match b {
            0x00..=0x7f => 1,
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => return len,
        };
        return if width > back { len - back } else { len };
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn new_buffer_is_empty() {
        let buf = CaptureBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.contents(), "");
    }

    #[test]
    fn clones_share_storage() {
        let buf = CaptureBuffer::new();
        let mut writer = buf.clone();
        writeln!(writer, "hello").unwrap();
        assert_eq!(buf.contents(), "hello\n");
        assert!(buf.same_buffer(&writer));
        assert!(!buf.same_buffer(&CaptureBuffer::new()));
    }

    #[test]
    fn reads_are_repeatable() {
        let buf = CaptureBuffer::new();
        buf.append(b"abc");
        assert_eq!(buf.contents(), "abc");
        assert_eq!(buf.contents(), "abc");
        assert_eq!(buf.len(), 3);
    }

    /// "é" is two bytes; after only the first one the snapshot must not
    /// contain a replacement character that would later be rewritten.
    #[test]
    fn incomplete_multibyte_tail_is_held_back() {
        let buf = CaptureBuffer::new();
        let bytes = "café".as_bytes();
        buf.append(&bytes[..bytes.len() - 1]);
        assert_eq!(buf.contents(), "caf");
        buf.append(&bytes[bytes.len() - 1..]);
        assert_eq!(buf.contents(), "café");
    }

    #[test]
    fn settled_len_handles_four_byte_sequences() {
        let crab = "🦀".as_bytes();
        assert_eq!(crab.len(), 4);
        for cut in 1..4 {
            assert_eq!(settled_len(&crab[..cut]), 0, "cut at {cut}");
        }
        assert_eq!(settled_len(crab), 4);
    }

    #[test]
    fn invalid_bytes_are_replaced_not_dropped() {
        let buf = CaptureBuffer::new();
        buf.append(&[b'a', 0xff, b'b']);
        assert_eq!(buf.contents(), "a\u{fffd}b");
    }
}
