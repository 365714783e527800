//! Byte-counting reader for progress reporting.

use std::io::Read;

/// Wraps a reader and reports the cumulative byte count to a callback
/// after every read. The pipeline wires the callback to a progress bar
/// sized by the input file length, so progress tracks compressed bytes
/// even when the stream is decompressed downstream.
pub struct ProgressReader<R: Read> {
    reader: R,
    callback: Box<dyn Fn(u64)>,
    bytes_read: u64,
}

impl<R: Read> ProgressReader<R> {
    pub fn new<F>(reader: R, callback: F) -> Self
    where
        F: Fn(u64) + 'static,
    {
        Self {
            reader,
            callback: Box::new(callback),
            bytes_read: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.reader.read(buf)?;
        self.bytes_read += n as u64;
        (self.callback)(self.bytes_read);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_reports_cumulative_bytes() {
        let seen = Rc::new(Cell::new(0u64));
        let seen_cb = Rc::clone(&seen);
        let mut reader =
            ProgressReader::new(&b"0123456789"[..], move |bytes| seen_cb.set(bytes));

        let mut buf = [0u8; 4];
        reader.read(&mut buf).unwrap();
        assert_eq!(seen.get(), 4);
        reader.read(&mut buf).unwrap();
        assert_eq!(seen.get(), 8);
        assert_eq!(reader.bytes_read(), 8);
    }
}
