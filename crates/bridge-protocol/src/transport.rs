//! Blocking primitive transport.
//!
//! The codec is written against [`Transport`], which only knows how to
//! move single primitives: bytes, 32/64-bit integers, 64-bit floats and
//! length-prefixed strings. Everything is big-endian; strings are a
//! `u16` byte length followed by UTF-8.
//!
//! [`StreamTransport`] is the production implementation over any
//! `Read`/`Write` pair (a `TcpStream` and its clone, or in-memory buffers
//! in tests). Writes are staged in a buffer and pushed out before every
//! blocking read, so a request always reaches the terminal before the
//! host waits for the answer.

use std::io::{BufReader, Read, Write};
use std::net::TcpStream;

use byteorder::{BigEndian, ReadBytesExt};
use bytes::{BufMut, BytesMut};

use crate::error::TransportError;

pub trait Transport {
    fn read_u8(&mut self) -> Result<u8, TransportError>;
    fn read_i32(&mut self) -> Result<i32, TransportError>;
    fn read_i64(&mut self) -> Result<i64, TransportError>;
    fn read_f64(&mut self) -> Result<f64, TransportError>;
    fn read_string(&mut self) -> Result<String, TransportError>;

    fn write_u8(&mut self, v: u8) -> Result<(), TransportError>;
    fn write_i32(&mut self, v: i32) -> Result<(), TransportError>;
    fn write_i64(&mut self, v: i64) -> Result<(), TransportError>;
    fn write_f64(&mut self, v: f64) -> Result<(), TransportError>;
    fn write_string(&mut self, v: &str) -> Result<(), TransportError>;

    /// Push every staged write to the peer.
    fn flush(&mut self) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn read_u8(&mut self) -> Result<u8, TransportError> {
        (**self).read_u8()
    }
    fn read_i32(&mut self) -> Result<i32, TransportError> {
        (**self).read_i32()
    }
    fn read_i64(&mut self) -> Result<i64, TransportError> {
        (**self).read_i64()
    }
    fn read_f64(&mut self) -> Result<f64, TransportError> {
        (**self).read_f64()
    }
    fn read_string(&mut self) -> Result<String, TransportError> {
        (**self).read_string()
    }
    fn write_u8(&mut self, v: u8) -> Result<(), TransportError> {
        (**self).write_u8(v)
    }
    fn write_i32(&mut self, v: i32) -> Result<(), TransportError> {
        (**self).write_i32(v)
    }
    fn write_i64(&mut self, v: i64) -> Result<(), TransportError> {
        (**self).write_i64(v)
    }
    fn write_f64(&mut self, v: f64) -> Result<(), TransportError> {
        (**self).write_f64(v)
    }
    fn write_string(&mut self, v: &str) -> Result<(), TransportError> {
        (**self).write_string(v)
    }
    fn flush(&mut self) -> Result<(), TransportError> {
        (**self).flush()
    }
}

/// Buffered [`Transport`] over a reader and a writer.
pub struct StreamTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
    pending: BytesMut,
}

impl<R: Read, W: Write> StreamTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        StreamTransport {
            reader: BufReader::new(reader),
            writer,
            pending: BytesMut::with_capacity(1200),
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_writer(mut self) -> Result<W, TransportError> {
        self.flush()?;
        Ok(self.writer)
    }
}

impl StreamTransport<TcpStream, TcpStream> {
    /// Use one half of a cloned socket for each direction.
    pub fn from_tcp(stream: TcpStream) -> Result<Self, TransportError> {
        let reader = stream.try_clone().map_err(TransportError::io)?;
        Ok(StreamTransport::new(reader, stream))
    }
}

impl<R: Read, W: Write> Transport for StreamTransport<R, W> {
    fn read_u8(&mut self) -> Result<u8, TransportError> {
        self.flush()?;
        Ok(self.reader.read_u8()?)
    }

    fn read_i32(&mut self) -> Result<i32, TransportError> {
        self.flush()?;
        Ok(self.reader.read_i32::<BigEndian>()?)
    }

    fn read_i64(&mut self) -> Result<i64, TransportError> {
        self.flush()?;
        Ok(self.reader.read_i64::<BigEndian>()?)
    }

    fn read_f64(&mut self) -> Result<f64, TransportError> {
        self.flush()?;
        Ok(self.reader.read_f64::<BigEndian>()?)
    }

    fn read_string(&mut self) -> Result<String, TransportError> {
        self.flush()?;
        let len = self.reader.read_u16::<BigEndian>()? as usize;
        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf)?;
        String::from_utf8(buf).map_err(|_| TransportError::InvalidUtf8)
    }

    fn write_u8(&mut self, v: u8) -> Result<(), TransportError> {
        self.pending.put_u8(v);
        Ok(())
    }

    fn write_i32(&mut self, v: i32) -> Result<(), TransportError> {
        self.pending.put_i32(v);
        Ok(())
    }

    fn write_i64(&mut self, v: i64) -> Result<(), TransportError> {
        self.pending.put_i64(v);
        Ok(())
    }

    fn write_f64(&mut self, v: f64) -> Result<(), TransportError> {
        self.pending.put_f64(v);
        Ok(())
    }

    fn write_string(&mut self, v: &str) -> Result<(), TransportError> {
        let bytes = v.as_bytes();
        let len = u16::try_from(bytes.len()).map_err(|_| TransportError::StringTooLong(bytes.len()))?;
        self.pending.put_u16(len);
        self.pending.put_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let staged = self.pending.split();
        self.writer.write_all(&staged).map_err(TransportError::io)?;
        self.writer.flush().map_err(TransportError::io)?;
        Ok(())
    }
}
