//! implements a parser for the line-oriented spool command script.
use std::fmt;

use crate::fan_out::Submission;
use crate::types::protocol::{SpoolCommand, SpoolResponse};
use crate::types::serialisable::SpoolSerialisable;

/// Longest owner or label accepted, in bytes.
pub const MAX_NAME_LEN: usize = 64;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParsingError {
    BadFormat,
    UnknownCommand,
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::BadFormat => "bad format",
            Self::UnknownCommand => "unknown command",
        })
    }
}

impl std::error::Error for ParsingError {}

impl SpoolSerialisable for ParsingError {
    fn serialise_spool(&self) -> Vec<u8> {
        match self {
            ParsingError::BadFormat => SpoolResponse::BadFormat,
            ParsingError::UnknownCommand => SpoolResponse::UnknownCommand,
        }
        .serialise_spool()
    }
}

/// Provides a custom, minimal, zero-copy parser of byte slices.
struct ParseState<'a> {
    from: &'a [u8],
}

impl ParseState<'_> {
    /// Asserts there's no more input to take, returning `result` if so, and a
    /// `BadFormat` error otherwise.
    fn expect_done_and<R>(&self, result: R) -> Result<R, ParsingError> {
        if self.is_done() {
            Ok(result)
        } else {
            Err(ParsingError::BadFormat)
        }
    }

    fn is_done(&self) -> bool {
        self.from.is_empty()
    }

    /// Consumes from the input, expecting a token of non-zero length.
    fn expect_next_token(&mut self) -> Result<&[u8], ParsingError> {
        match self.next_token() {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ParsingError::BadFormat),
        }
    }

    /// Consumes from the input, expecting a space then a u64.
    fn expect_next_u64(&mut self) -> Result<u64, ParsingError> {
        self.expect_space()?;

        let token = self.expect_next_token()?;

        token.iter().try_fold(0u64, |r, v| match v {
            b'0'..=b'9' => r
                .checked_mul(10)
                .and_then(|r| r.checked_add((v - b'0') as u64))
                .ok_or(ParsingError::BadFormat),
            _ => Err(ParsingError::BadFormat),
        })
    }

    /// Consumes from the input, expecting a space then a u32.
    fn expect_next_u32(&mut self) -> Result<u32, ParsingError> {
        u32::try_from(self.expect_next_u64()?)
            .map_err(|_| ParsingError::BadFormat)
    }

    /// Consumes from the input, expecting a space then a u32, unless the input
    /// is already exhausted.
    fn maybe_next_u32(&mut self) -> Result<Option<u32>, ParsingError> {
        if self.is_done() {
            Ok(None)
        } else {
            self.expect_next_u32().map(Some)
        }
    }

    /// Consumes from the input, expecting a space then an owner or label.
    fn expect_next_name(&mut self) -> Result<String, ParsingError> {
        self.expect_space()?;

        let token = self.expect_next_token()?;

        fn char_is_name_safe(c: u8, is_first: bool) -> bool {
            match c {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' => true,
                b'+' | b'/' | b'.' | b'_' | b'(' | b')' | b'@' | b':' => true,
                b'-' => !is_first, // - is only name safe outside first position
                _ => false,
            }
        }

        if token.len() <= MAX_NAME_LEN
            && token
                .iter()
                .enumerate()
                .all(|(i, c)| char_is_name_safe(*c, i == 0))
        {
            // Every accepted byte is ASCII.
            Ok(token.iter().map(|&c| c as char).collect())
        } else {
            Err(ParsingError::BadFormat)
        }
    }

    /// Consumes a space.
    fn expect_space(&mut self) -> Result<(), ParsingError> {
        match self.from.first() {
            Some(b' ') => {
                self.from = &self.from[1..];
                Ok(())
            },
            _ => Err(ParsingError::BadFormat),
        }
    }

    /// Consumes from this ParseState until reaching a space byte or the end of
    /// the input. It returns None at the end of the input. On consecutive space
    /// bytes, it returns a zero-length slice.
    fn next_token(&mut self) -> Option<&[u8]> {
        if self.from.is_empty() {
            return None;
        }

        let idx = self
            .from
            .iter()
            .position(|c| *c == b' ')
            .unwrap_or(self.from.len());

        let (token, rest) = self.from.split_at(idx);
        self.from = rest;

        Some(token)
    }
}

impl<'a> From<&'a [u8]> for ParseState<'a> {
    fn from(from: &'a [u8]) -> Self {
        ParseState { from }
    }
}

// Parsing is implemented to fulfil the TryFrom trait.
impl TryFrom<&[u8]> for SpoolCommand {
    type Error = ParsingError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        use SpoolCommand::*;

        let mut ps: ParseState = value.into();

        let cmd = match ps.expect_next_token()? {
            // <cmd>
            b"select" => Select,
            b"status" => Status,
            b"snapshot" => Snapshot,
            b"stats" => Stats,
            b"quit" => Quit,

            // <cmd> [<units>]
            b"tick" => Tick {
                units: if ps.is_done() { 1 } else { ps.expect_next_u64()? },
            },

            // <cmd> <owner> <label> [<pri>]
            b"submit" => Submit {
                owner: ps.expect_next_name()?,
                label: ps.expect_next_name()?,
                priority: ps.maybe_next_u32()?,
            },

            // <cmd> (<owner> <label> <pri>)+
            b"burst" => {
                let mut jobs = Vec::new();
                loop {
                    jobs.push(Submission {
                        owner: ps.expect_next_name()?,
                        label: ps.expect_next_name()?,
                        priority: Some(ps.expect_next_u32()?),
                    });
                    if ps.is_done() {
                        break;
                    }
                }
                Burst { jobs }
            },

            _ => return Err(ParsingError::UnknownCommand),
        };

        ps.expect_done_and(cmd)
    }
}
