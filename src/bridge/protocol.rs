//! Line protocol of the local control bridge.
//!
//! Wire format, one request per line:
//! ```text
//! GET On                 → VALUE On true
//! GET Brightness         → VALUE Brightness 42
//! SET On off             → OK
//! SET Brightness 30      → OK
//! STATUS                 → STATUS {"on":true,...}
//! <anything else>        → ERR <message>
//! ```
//!
//! Lines end with `\n`; a `\r` anywhere is dropped. Keywords are
//! case-insensitive. The decoder accumulates bytes from partial reads
//! and yields complete lines, so one `read` may carry half a line or
//! several lines.

use core::fmt;
use core::str::FromStr;

use heapless::{String, Vec};

/// Longest accepted line, excluding the terminator.
pub const MAX_LINE: usize = 128;

// ───────────────────────────────────────────────────────────────
// Decoder
// ───────────────────────────────────────────────────────────────

/// One decoder result.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded {
    Line(String<MAX_LINE>),
    TooLong,
    NotUtf8,
}

/// Streaming line decoder.
pub struct LineDecoder {
    buf: Vec<u8, MAX_LINE>,
    discarding: bool,
}

impl LineDecoder {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            discarding: false,
        }
    }

    /// Feed one byte. Returns a result when the byte ends a line.
    ///
    /// Bytes past [`MAX_LINE`] are dropped until the next newline,
    /// which then yields [`Decoded::TooLong`].
    pub fn push(&mut self, byte: u8) -> Option<Decoded> {
        match byte {
            b'\r' => None,
            b'\n' => {
                let buf = core::mem::take(&mut self.buf);
                if core::mem::take(&mut self.discarding) {
                    return Some(Decoded::TooLong);
                }
                Some(match String::from_utf8(buf) {
                    Ok(line) => Decoded::Line(line),
                    Err(_) => Decoded::NotUtf8,
                })
            }
            _ if self.discarding => None,
            _ => {
                if self.buf.push(byte).is_err() {
                    self.buf.clear();
                    self.discarding = true;
                }
                None
            }
        }
    }

    /// Feed a chunk, collecting every line it completes.
    pub fn feed(&mut self, data: &[u8]) -> std::vec::Vec<Decoded> {
        data.iter().filter_map(|&b| self.push(b)).collect()
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Requests
// ───────────────────────────────────────────────────────────────

/// Accessory property addressed by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Characteristic {
    On,
    Brightness,
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::On => "On",
            Self::Brightness => "Brightness",
        })
    }
}

impl FromStr for Characteristic {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("on") {
            Ok(Self::On)
        } else if s.eq_ignore_ascii_case("brightness") {
            Ok(Self::Brightness)
        } else {
            Err(ProtocolError::UnknownCharacteristic(s.to_owned()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Get(Characteristic),
    SetOn(bool),
    /// Unclamped; the accessory clamps into 0-100.
    SetBrightness(i64),
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty request")]
    Empty,
    #[error("unknown command {0:?}")]
    UnknownCommand(std::string::String),
    #[error("unknown characteristic {0:?}")]
    UnknownCharacteristic(std::string::String),
    #[error("missing value")]
    MissingValue,
    #[error("not a boolean: {0:?}")]
    InvalidBool(std::string::String),
    #[error("not an integer: {0:?}")]
    InvalidInteger(std::string::String),
    #[error("unexpected trailing input")]
    TrailingInput,
}

fn parse_bool(s: &str) -> Result<bool, ProtocolError> {
    const TRUE: [&str; 3] = ["true", "on", "1"];
    const FALSE: [&str; 3] = ["false", "off", "0"];
    if TRUE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        Ok(true)
    } else if FALSE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        Ok(false)
    } else {
        Err(ProtocolError::InvalidBool(s.to_owned()))
    }
}

impl FromStr for Request {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_ascii_whitespace();
        let command = words.next().ok_or(ProtocolError::Empty)?;

        let request = if command.eq_ignore_ascii_case("get") {
            let characteristic = words.next().ok_or(ProtocolError::MissingValue)?;
            Self::Get(characteristic.parse()?)
        } else if command.eq_ignore_ascii_case("set") {
            let characteristic: Characteristic =
                words.next().ok_or(ProtocolError::MissingValue)?.parse()?;
            let value = words.next().ok_or(ProtocolError::MissingValue)?;
            match characteristic {
                Characteristic::On => Self::SetOn(parse_bool(value)?),
                Characteristic::Brightness => Self::SetBrightness(
                    value
                        .parse()
                        .map_err(|_| ProtocolError::InvalidInteger(value.to_owned()))?,
                ),
            }
        } else if command.eq_ignore_ascii_case("status") {
            Self::Status
        } else {
            return Err(ProtocolError::UnknownCommand(command.to_owned()));
        };

        if words.next().is_some() {
            return Err(ProtocolError::TrailingInput);
        }
        Ok(request)
    }
}

// ───────────────────────────────────────────────────────────────
// Responses
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    On(bool),
    Brightness(u8),
    Ok,
    /// Serialized status object.
    Status(std::string::String),
    Err(std::string::String),
}

impl Response {
    pub fn error(e: impl fmt::Display) -> Self {
        Self::Err(e.to_string())
    }

    /// Wire form including the trailing newline.
    pub fn to_line(&self) -> std::string::String {
        format!("{self}\n")
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On(on) => write!(f, "VALUE {} {}", Characteristic::On, on),
            Self::Brightness(b) => write!(f, "VALUE {} {}", Characteristic::Brightness, b),
            Self::Ok => f.write_str("OK"),
            Self::Status(json) => write!(f, "STATUS {json}"),
            Self::Err(msg) => write!(f, "ERR {msg}"),
        }
    }
}
