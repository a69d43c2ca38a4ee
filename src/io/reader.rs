//! Reader
//!
//! Sequential cursor over a [`Source`].

use super::Source;

/// Bytes pulled per step when scanning for a line end without direct access
pub const DEFAULT_LINE_CHUNK: usize = 32;

/// Sequential cursor over a source
///
/// Each reader owns its offset; any number of readers may share a source.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    source: &'a Source,
    offset: u64,
    /// Chunk size for line scanning over sources without `data()`
    chunk_size: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader positioned at the start of `source`
    pub fn new(source: &'a Source) -> Self {
        Self::with_chunk_size(source, DEFAULT_LINE_CHUNK)
    }

    /// Create a reader that scans for line ends `chunk_size` bytes at a time
    pub fn with_chunk_size(source: &'a Source, chunk_size: usize) -> Self {
        Self {
            source,
            offset: 0,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn source(&self) -> &'a Source {
        self.source
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn size(&self) -> u64 {
        self.source.size()
    }

    fn remaining(&self) -> u64 {
        self.source.size() - self.offset
    }

    /// Copy up to `buf.len()` bytes and advance past them
    ///
    /// Returns the number of bytes read, 0 at the end.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let count = self.source.read_at(self.offset, buf);
        self.offset += count as u64;
        count
    }

    /// Fill all of `buf` or, if there is not enough data, leave the cursor alone
    pub fn read_all(&mut self, buf: &mut [u8]) -> bool {
        if (buf.len() as u64) > self.remaining() || !self.source.read_all_at(self.offset, buf) {
            return false;
        }
        self.offset += buf.len() as u64;
        true
    }

    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let mut bytes = [0u8; N];
        self.read_all(&mut bytes).then_some(bytes)
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|b| b[0])
    }

    pub fn read_u16_le(&mut self) -> Option<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    pub fn read_u32_le(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_u64_le(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Move the cursor to `offset`; fails past the end
    pub fn seek(&mut self, offset: u64) -> bool {
        if offset > self.source.size() {
            return false;
        }
        self.offset = offset;
        true
    }

    /// Advance the cursor by `count`; fails past the end
    pub fn skip(&mut self, count: u64) -> bool {
        if count > self.remaining() {
            return false;
        }
        self.offset += count;
        true
    }

    /// Read the next line into `line`, without its terminator
    ///
    /// `\r\n`, a lone `\r` and a lone `\n` each end a line. Returns `false`
    /// (with `line` empty) when the cursor is at the end, or when the source
    /// yields no more bytes before its recorded size. The last line may lack
    /// a terminator.
    pub fn read_line(&mut self, line: &mut String) -> bool {
        line.clear();
        if self.offset >= self.source.size() {
            return false;
        }

        let mut text = Vec::new();
        let consumed = match self.source.data() {
            Some(data) => scan_direct(&data[self.offset as usize..], &mut text),
            None => self.scan_chunked(&mut text),
        };
        if consumed == 0 {
            // The backing file ended before `size()`
            tracing::debug!(offset = self.offset, size = self.source.size(), "line read hit early end of data");
            return false;
        }
        self.offset += consumed;

        line.push_str(&String::from_utf8_lossy(&text));
        true
    }

    /// Pull chunks through `read_at` until a line end or the end of data
    ///
    /// Returns the bytes consumed including the terminator.
    fn scan_chunked(&self, text: &mut Vec<u8>) -> u64 {
        let mut chunk = vec![0u8; self.chunk_size];
        let mut position = self.offset;
        loop {
            let count = self.source.read_at(position, &mut chunk);
            if count == 0 {
                return position - self.offset;
            }
            let chunk = &chunk[..count];
            if let Some(end) = chunk.iter().position(|&b| is_line_end(b)) {
                text.extend_from_slice(&chunk[..end]);
                let terminator_at = position + end as u64;
                let next = match chunk.get(end + 1) {
                    Some(&b) => Some(b),
                    None => {
                        let mut peek = [0u8; 1];
                        (self.source.read_at(terminator_at + 1, &mut peek) == 1).then_some(peek[0])
                    }
                };
                return terminator_at + terminator_len(chunk[end], next) - self.offset;
            }
            text.extend_from_slice(chunk);
            position += count as u64;
        }
    }
}

fn is_line_end(byte: u8) -> bool {
    byte == b'\r' || byte == b'\n'
}

/// `\r\n` counts as one two-byte terminator
fn terminator_len(terminator: u8, next: Option<u8>) -> u64 {
    if terminator == b'\r' && next == Some(b'\n') {
        2
    } else {
        1
    }
}

fn scan_direct(rest: &[u8], text: &mut Vec<u8>) -> u64 {
    match rest.iter().position(|&b| is_line_end(b)) {
        Some(end) => {
            text.extend_from_slice(&rest[..end]);
            end as u64 + terminator_len(rest[end], rest.get(end + 1).copied())
        }
        None => {
            text.extend_from_slice(rest);
            rest.len() as u64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_advances() {
        let source = Source::from_static(b"abcdef");
        let mut reader = Reader::new(&source);
        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf), 4);
        assert_eq!(reader.offset(), 4);
        assert_eq!(reader.read(&mut buf), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(reader.read(&mut buf), 0);
    }

    #[test]
    fn test_read_all_is_all_or_nothing() {
        let source = Source::from_static(b"abc");
        let mut reader = Reader::new(&source);
        let mut buf = [0u8; 4];
        assert!(!reader.read_all(&mut buf));
        assert_eq!(reader.offset(), 0);
    }

    #[test]
    fn test_little_endian_helpers() {
        let source = Source::from_static(&[0x01, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00, 0xff]);
        let mut reader = Reader::new(&source);
        assert_eq!(reader.read_u8(), Some(1));
        assert_eq!(reader.read_u16_le(), Some(2));
        assert_eq!(reader.read_u32_le(), Some(3));
        assert_eq!(reader.read_u16_le(), None);
        assert_eq!(reader.read_u8(), Some(0xff));
        assert_eq!(reader.read_u8(), None);
    }

    #[test]
    fn test_peek_across_chunk_boundary() {
        // "\r" ends the first 4-byte chunk, "\n" starts the next
        let parent = Source::from_static(b"abc\r\nd");
        let source = Source::from_subrange(&parent, 0, parent.size());
        let mut reader = Reader::with_chunk_size(&source, 4);
        let mut line = String::new();
        assert!(reader.read_line(&mut line));
        assert_eq!(line, "abc");
        assert_eq!(reader.offset(), 5);
        assert!(reader.read_line(&mut line));
        assert_eq!(line, "d");
        assert!(!reader.read_line(&mut line));
    }

    #[test]
    fn test_empty_lines() {
        let source = Source::from_static(b"\n\n");
        let mut reader = Reader::new(&source);
        let mut line = String::from("stale");
        assert!(reader.read_line(&mut line));
        assert_eq!(line, "");
        assert!(reader.read_line(&mut line));
        assert_eq!(line, "");
        assert!(!reader.read_line(&mut line));
    }
}
