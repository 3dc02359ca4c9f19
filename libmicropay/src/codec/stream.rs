use crate::codec::{ByteSink, ByteSource, CodecError};
use std::io::{ErrorKind, Read, Write};

/// Writes encoded values straight into an [`std::io::Write`].
///
/// Encoding itself cannot fail, so the first I/O error is latched and reported by [`StreamSink::finish`].
/// Nothing is written after an error.
pub struct StreamSink<W: Write> {
    writer: W,
    written: usize,
    error: Option<std::io::Error>,
}

impl<W: Write> StreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0, error: None }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> Result<W, CodecError> {
        if let Some(err) = self.error.take() {
            return Err(CodecError::Io(err.to_string()));
        }
        self.writer.flush().map_err(|e| CodecError::Io(e.to_string()))?;
        Ok(self.writer)
    }
}

impl<W: Write> ByteSink for StreamSink<W> {
    fn write_raw(&mut self, bytes: &[u8]) {
        if self.error.is_some() {
            return;
        }
        match self.writer.write_all(bytes) {
            Ok(()) => self.written += bytes.len(),
            Err(err) => self.error = Some(err),
        }
    }
}

/// Reads encoded values from an [`std::io::Read`].
pub struct StreamSource<R: Read> {
    reader: R,
}

impl<R: Read> StreamSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteSource for StreamSource<R> {
    fn read_raw(&mut self, len: usize) -> Result<Vec<u8>, CodecError> {
        // Read through `take` so a hostile length prefix cannot force a huge allocation up front.
        let mut buf = Vec::new();
        let limit = u64::try_from(len).map_err(|_| CodecError::LengthOverflow(u64::MAX))?;
        let read = (&mut self.reader).take(limit).read_to_end(&mut buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => CodecError::UnexpectedEof,
            _ => CodecError::Io(e.to_string()),
        })?;
        if read != len {
            return Err(CodecError::UnexpectedEof);
        }
        Ok(buf)
    }
}
