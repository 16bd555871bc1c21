//! Byte I/O hooks used by the Output and Input instructions.
//!
//! The interpreter never touches a stream directly. Each `.` hands one byte
//! to an [`OutputHook`] and each `,` asks an [`InputHook`] for one byte.
//! Closures implement the hooks directly, so any state a host needs travels
//! in the closure's captures.

use std::io::{self, Read, Write};

/// Byte returned by the stream-backed input hooks once input is exhausted.
pub const EOF_BYTE: u8 = 0xFF;

/// Receives bytes produced by the Output instruction.
pub trait OutputHook {
    fn put(&mut self, byte: u8) -> io::Result<()>;
}

/// Supplies bytes consumed by the Input instruction.
pub trait InputHook {
    fn get(&mut self) -> io::Result<u8>;
}

impl<F> OutputHook for F
where
    F: FnMut(u8),
{
    fn put(&mut self, byte: u8) -> io::Result<()> {
        self(byte);
        Ok(())
    }
}

impl<F> InputHook for F
where
    F: FnMut() -> u8,
{
    fn get(&mut self) -> io::Result<u8> {
        Ok(self())
    }
}

/// Writes output bytes to any [`Write`] implementor.
#[derive(Debug)]
pub struct WriteHook<W>(pub W);

impl<W: Write> OutputHook for WriteHook<W> {
    fn put(&mut self, byte: u8) -> io::Result<()> {
        self.0.write_all(&[byte])
    }
}

/// Reads input bytes from any [`Read`] implementor.
#[derive(Debug)]
pub struct ReadHook<R>(pub R);

impl<R: Read> InputHook for ReadHook<R> {
    fn get(&mut self) -> io::Result<u8> {
        read_byte(&mut self.0)
    }
}

/// Default output hook: process standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutHook;

impl OutputHook for StdoutHook {
    fn put(&mut self, byte: u8) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&[byte])?;
        if byte == b'\n' {
            stdout.flush()?;
        }
        Ok(())
    }
}

/// Default input hook: process standard input.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinHook;

impl InputHook for StdinHook {
    fn get(&mut self) -> io::Result<u8> {
        // Prompts written without a newline must be visible before blocking.
        io::stdout().flush()?;
        read_byte(&mut io::stdin().lock())
    }
}

fn read_byte<R: Read + ?Sized>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(EOF_BYTE),
            Ok(_) => return Ok(buf[0]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_hooks() {
        let mut seen = Vec::new();
        {
            let mut out = |byte: u8| seen.push(byte);
            out.put(b'a').unwrap();
            out.put(b'b').unwrap();
        }
        assert_eq!(seen, b"ab");

        let mut next = 10u8;
        let mut input = || {
            next += 1;
            next
        };
        assert_eq!(input.get().unwrap(), 11);
        assert_eq!(input.get().unwrap(), 12);
    }

    #[test]
    fn test_stream_hooks() {
        let mut out = WriteHook(Vec::new());
        out.put(b'x').unwrap();
        assert_eq!(out.0, b"x");

        let mut input = ReadHook(&b"hi"[..]);
        assert_eq!(input.get().unwrap(), b'h');
        assert_eq!(input.get().unwrap(), b'i');
        assert_eq!(input.get().unwrap(), EOF_BYTE);
        assert_eq!(input.get().unwrap(), EOF_BYTE);
    }
}
