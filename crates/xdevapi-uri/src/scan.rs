//! Character-level scanner with percent-decoding folded in.
//!
//! URIs are parsed one decoded unit at a time. A `%XX` sequence decodes
//! to a single byte before any structure is recognized, and the unit
//! remembers that it was encoded: a percent-encoded `/` or `@` is data,
//! never a delimiter. The scanner is cheap to clone, which is how the
//! parser looks ahead (scan a clone, then rescan for real).

use crate::error::{UriError, UriErrorKind};

/// One decoded character of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Unit {
    /// The decoded character.
    pub ch: char,
    /// True when the character came from a `%XX` sequence.
    pub encoded: bool,
}

impl Unit {
    /// True for a plain (not percent-encoded) occurrence of `ch`.
    pub fn is_raw(self, ch: char) -> bool {
        !self.encoded && self.ch == ch
    }

    /// True for a plain occurrence of any character in `set`.
    pub fn is_raw_any(self, set: &[char]) -> bool {
        !self.encoded && set.contains(&self.ch)
    }
}

/// Forward-only scanner over the raw input.
#[derive(Debug, Clone)]
pub(crate) struct Scan<'s> {
    input: &'s str,
    pos: usize,
}

impl<'s> Scan<'s> {
    pub fn new(input: &'s str) -> Self {
        Self { input, pos: 0 }
    }

    /// The raw input being scanned.
    pub fn input(&self) -> &'s str {
        self.input
    }

    /// Byte offset of the next unit in the raw input.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Decodes the next unit without consuming it.
    pub fn peek(&self) -> Result<Option<Unit>, UriError> {
        Ok(self.decode_at(self.pos)?.map(|(unit, _)| unit))
    }

    /// Decodes and consumes the next unit.
    pub fn next(&mut self) -> Result<Option<Unit>, UriError> {
        match self.decode_at(self.pos)? {
            Some((unit, width)) => {
                self.pos += width;
                Ok(Some(unit))
            }
            None => Ok(None),
        }
    }

    /// Consumes the next unit when it is a plain `ch`.
    pub fn eat_raw(&mut self, ch: char) -> Result<bool, UriError> {
        if self.peek()?.is_some_and(|u| u.is_raw(ch)) {
            self.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// True when the next unit is a plain `ch`.
    pub fn looking_at_raw(&self, ch: char) -> Result<bool, UriError> {
        Ok(self.peek()?.is_some_and(|u| u.is_raw(ch)))
    }

    /// Decodes units into a string until a plain character from `stops`
    /// or the end of input. The stop character is not consumed.
    pub fn take_until_raw(&mut self, stops: &[char]) -> Result<String, UriError> {
        let mut out = String::new();
        while let Some(unit) = self.peek()? {
            if unit.is_raw_any(stops) {
                break;
            }
            self.next()?;
            out.push(unit.ch);
        }
        Ok(out)
    }

    /// Looks ahead for a plain `target` before any plain stop character
    /// or the end of input. Consumes nothing.
    pub fn raw_ahead(&self, target: char, stops: &[char]) -> Result<bool, UriError> {
        let mut probe = self.clone();
        while let Some(unit) = probe.next()? {
            if unit.is_raw(target) {
                return Ok(true);
            }
            if unit.is_raw_any(stops) {
                return Ok(false);
            }
        }
        Ok(false)
    }

    /// Takes the raw (undecoded) input up to `stop` and consumes the
    /// stop character. Parenthesized groups carry their content
    /// literally, percent signs included. `None` when `stop` is absent.
    pub fn take_raw_until(&mut self, stop: char) -> Option<&'s str> {
        let rest = &self.input[self.pos..];
        let idx = rest.find(stop)?;
        let taken = &rest[..idx];
        self.pos += idx + stop.len_utf8();
        Some(taken)
    }

    /// Error anchored at the next unit.
    pub fn error(&self, kind: UriErrorKind) -> UriError {
        UriError::at(self.input, self.pos, kind)
    }

    fn decode_at(&self, pos: usize) -> Result<Option<(Unit, usize)>, UriError> {
        let rest = &self.input[pos..];
        let Some(ch) = rest.chars().next() else {
            return Ok(None);
        };
        if ch != '%' {
            return Ok(Some((Unit { ch, encoded: false }, ch.len_utf8())));
        }
        let hex = rest.get(1..3).filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()));
        let Some(hex) = hex else {
            return Err(UriError::at(self.input, pos, UriErrorKind::BadPercentEncoding));
        };
        // Always in [0, 256), one decoded byte per escape.
        let byte = u8::from_str_radix(hex, 16).map_err(|_| {
            UriError::at(self.input, pos, UriErrorKind::BadPercentEncoding)
        })?;
        Ok(Some((
            Unit {
                ch: char::from(byte),
                encoded: true,
            },
            3,
        )))
    }
}
