use crate::codec::{ByteSink, ByteSource, CodecError};

/// Appends encoded values to an owned buffer.
#[derive(Debug, Default, Clone)]
pub struct ZeroCopySink {
    buf: Vec<u8>,
}

impl ZeroCopySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity) }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl ByteSink for ZeroCopySink {
    fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }
}

/// Reads encoded values out of a borrowed buffer. The `next_*` methods hand out slices of the input
/// instead of copies.
#[derive(Debug, Clone)]
pub struct ZeroCopySource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ZeroCopySource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn next_raw(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if len > self.remaining() {
            return Err(CodecError::UnexpectedEof);
        }
        let data: &'a [u8] = self.data;
        let slice = &data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn next_var_bytes(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.read_compact_size()?;
        let len = usize::try_from(len).map_err(|_| CodecError::LengthOverflow(len))?;
        self.next_raw(len)
    }
}

impl ByteSource for ZeroCopySource<'_> {
    fn read_raw(&mut self, len: usize) -> Result<Vec<u8>, CodecError> {
        self.next_raw(len).map(<[u8]>::to_vec)
    }

    fn read_var_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        self.next_var_bytes().map(<[u8]>::to_vec)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn borrowed_slices() {
        let input = [0x03, b'a', b'b', b'c', 0x01, b'z'];
        let mut source = ZeroCopySource::new(&input);
        let first = source.next_var_bytes().unwrap();
        assert_eq!(first, b"abc");
        assert_eq!(source.position(), 4);
        assert_eq!(source.next_var_bytes().unwrap(), b"z");
        assert!(source.is_empty());
        assert_eq!(source.next_raw(1), Err(CodecError::UnexpectedEof));
    }

    #[test]
    fn sink_accumulates() {
        let mut sink = ZeroCopySink::with_capacity(16);
        assert!(sink.is_empty());
        sink.write_var_bytes(b"hi");
        sink.write_u64_le(1);
        assert_eq!(sink.len(), 11);
        assert_eq!(sink.into_bytes(), vec![2, b'h', b'i', 1, 0, 0, 0, 0, 0, 0, 0]);
    }
}
