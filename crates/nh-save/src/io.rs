//! Fixed-width little-endian reader and writer
//!
//! Integers are written at their natural width, booleans as one byte and
//! strings as a `u16` byte length followed by UTF-8. Optional strings carry
//! a presence byte first.
//!
//! The writer refuses anything the reader would reject, so a save that
//! succeeds can always be read back.

use crate::error::{SaveError, SaveResult};
use crate::magic::Magic;

/// Append-only save stream
#[derive(Debug, Default)]
pub struct SaveWriter {
    buf: Vec<u8>,
    section: &'static str,
}

macro_rules! write_int {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self, v: $ty) {
                self.buf.extend_from_slice(&v.to_le_bytes());
            }
        )*
    };
}

impl SaveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    write_int! {
        u8: u8,
        i8: i8,
        u16: u16,
        i16: i16,
        u32: u32,
        i32: i32,
        u64: u64,
        i64: i64,
        u128: u128,
    }

    pub fn bool(&mut self, v: bool) {
        self.u8(v as u8);
    }

    /// Write a section tag; later refusals are reported against it
    pub fn magic(&mut self, m: Magic) {
        self.section = m.name();
        self.u32(m.0);
    }

    /// Length-prefixed string
    pub fn str(&mut self, s: &str) -> SaveResult<()> {
        let len = u16::try_from(s.len()).map_err(|_| {
            SaveError::unsavable(self.section, format!("{}-byte string", s.len()))
        })?;
        self.u16(len);
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    pub fn opt_str(&mut self, s: Option<&str>) -> SaveResult<()> {
        self.bool(s.is_some());
        match s {
            Some(s) => self.str(s),
            None => Ok(()),
        }
    }

    /// Element count, refused above the limit the reader enforces
    pub fn count(&mut self, n: usize, max: usize) -> SaveResult<()> {
        let width = u32::try_from(n).ok();
        match width.filter(|_| n <= max) {
            Some(n) => {
                self.u32(n);
                Ok(())
            }
            None => Err(SaveError::unsavable(
                self.section,
                format!("{n} entries (limit {max})"),
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a save stream
#[derive(Debug)]
pub struct SaveReader<'a> {
    data: &'a [u8],
    pos: usize,
    section: &'static str,
}

macro_rules! read_int {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self) -> SaveResult<$ty> {
                let bytes = self.take(std::mem::size_of::<$ty>())?;
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                Ok(<$ty>::from_le_bytes(raw))
            }
        )*
    };
}

impl<'a> SaveReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            section: "header",
        }
    }

    /// Name the section being read, for error reports
    pub fn section(&mut self, name: &'static str) {
        self.section = name;
    }

    fn take(&mut self, n: usize) -> SaveResult<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.data.len());
        let Some(end) = end else {
            tracing::error!(section = self.section, offset = self.pos, "unexpected end of save");
            return Err(SaveError::UnexpectedEof {
                section: self.section,
            });
        };
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    read_int! {
        u8: u8,
        i8: i8,
        u16: u16,
        i16: i16,
        u32: u32,
        i32: i32,
        u64: u64,
        i64: i64,
        u128: u128,
    }

    pub fn bool(&mut self) -> SaveResult<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(SaveError::corrupt(format!(
                "boolean byte {b} in {}",
                self.section
            ))),
        }
    }

    /// Check the next tag, and name the section after it
    pub fn expect_magic(&mut self, m: Magic) -> SaveResult<()> {
        self.section = m.name();
        let found = self.u32()?;
        if found != m.0 {
            tracing::error!(section = m.name(), found, "magic mismatch");
            return Err(SaveError::BadMagic {
                section: m.name(),
                expected: m.name(),
                found,
            });
        }
        Ok(())
    }

    pub fn str(&mut self) -> SaveResult<String> {
        let len = self.u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| SaveError::corrupt(format!("invalid UTF-8 in {}", self.section)))
    }

    pub fn opt_str(&mut self) -> SaveResult<Option<String>> {
        if self.bool()? { self.str().map(Some) } else { Ok(None) }
    }

    /// Element count, bounded by `max` to stop garbage from allocating
    pub fn count(&mut self, max: usize) -> SaveResult<usize> {
        let n = self.u32()? as usize;
        if n > max {
            return Err(SaveError::corrupt(format!(
                "{n} entries in {} (limit {max})",
                self.section
            )));
        }
        Ok(n)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos == self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_layout() {
        let mut w = SaveWriter::new();
        w.u16(0x0102);
        w.i32(-2);
        w.bool(true);
        assert_eq!(w.into_bytes(), vec![0x02, 0x01, 0xfe, 0xff, 0xff, 0xff, 1]);
    }

    #[test]
    fn test_eof_names_section() {
        let data = [1u8, 2];
        let mut r = SaveReader::new(&data);
        r.section("traps");
        match r.u32() {
            Err(SaveError::UnexpectedEof { section }) => assert_eq!(section, "traps"),
            other => panic!("expected EOF, got {other:?}"),
        }
    }

    #[test]
    fn test_strings() {
        let mut w = SaveWriter::new();
        w.str("Izchak").unwrap();
        w.opt_str(None).unwrap();
        w.opt_str(Some("")).unwrap();
        w.opt_str(Some("Sting")).unwrap();
        let bytes = w.into_bytes();
        let mut r = SaveReader::new(&bytes);
        assert_eq!(r.str().unwrap(), "Izchak");
        assert_eq!(r.opt_str().unwrap(), None);
        assert_eq!(r.opt_str().unwrap(), Some(String::new()));
        assert_eq!(r.opt_str().unwrap().as_deref(), Some("Sting"));
        assert!(r.is_at_end());
    }

    #[test]
    fn test_long_string_refused() {
        let mut w = SaveWriter::new();
        w.magic(Magic::ENGR);
        let long = "x".repeat(u16::MAX as usize + 1);
        assert!(matches!(
            w.str(&long),
            Err(SaveError::Unsavable { section: "ENGR", .. })
        ));
        assert!(w.str(&long[1..]).is_ok());
    }

    #[test]
    fn test_bad_magic() {
        let mut w = SaveWriter::new();
        w.magic(Magic::TRPS);
        let bytes = w.into_bytes();
        let mut r = SaveReader::new(&bytes);
        assert!(matches!(
            r.expect_magic(Magic::ENGR),
            Err(SaveError::BadMagic { section: "ENGR", .. })
        ));
    }

    #[test]
    fn test_bad_bool_is_corrupt() {
        let data = [7u8];
        let mut r = SaveReader::new(&data);
        assert!(matches!(r.bool(), Err(SaveError::Corrupt(_))));
    }

    #[test]
    fn test_count_limit() {
        let mut w = SaveWriter::new();
        w.u32(5000);
        let bytes = w.into_bytes();
        assert!(SaveReader::new(&bytes).count(100).is_err());
    }

    #[test]
    fn test_writer_refuses_what_reader_rejects() {
        let mut w = SaveWriter::new();
        w.magic(Magic::STRS);
        assert!(w.count(8, 8).is_ok());
        assert!(matches!(
            w.count(9, 8),
            Err(SaveError::Unsavable { section: "STRS", .. })
        ));
    }
}
