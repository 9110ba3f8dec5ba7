//! Command parser
//!
//! Turns one text line into a [`Command`]. Parsing never fails: anything
//! that does not match a known form becomes [`Command::Unknown`].

use alloc::string::String;
use core::str::SplitAsciiWhitespace;

use crate::color::{Color, color_from};

pub const USAGE_BRIGHT: &str = "usage: BRIGHT <0-255>";
pub const USAGE_FILL: &str = "usage: FILL <r> <g> <b>";
pub const USAGE_SET: &str = "usage: SET <index> <r> <g> <b>";
pub const USAGE_SETN: &str = "usage: SETN <index> <r> <g> <b>";
pub const USAGE_FRAME: &str = "usage: FRAME <hex rgb payload of length ledCount*6>";

/// Channel values as sent by the client, clamped only when applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawColor {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

impl RawColor {
    pub fn clamped(self) -> Color {
        color_from(self.r, self.g, self.b)
    }
}

/// One parsed protocol command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Info,
    SetBrightness(i32),
    Fill(RawColor),
    /// `SET` / `SETN`. With `persist` set the pixel is only written to the
    /// buffer and shows on the next `SHOW`.
    SetPixel {
        index: i32,
        color: RawColor,
        persist: bool,
    },
    ShowFrame,
    ClearStrip,
    /// Hex payload with whitespace removed, uppercased
    DecodeFrame(String),
    /// Trimmed original line
    Unknown(String),
}

/// Parse one line.
pub fn parse(line: &str) -> Command {
    let raw = line.trim();
    let upper = raw.to_ascii_uppercase();
    let mut tokens = upper.split_ascii_whitespace();

    let parsed = match tokens.next() {
        Some("PING") => no_args(&mut tokens, Command::Ping),
        Some("INFO") => no_args(&mut tokens, Command::Info),
        Some("SHOW") => no_args(&mut tokens, Command::ShowFrame),
        Some("CLEAR") => no_args(&mut tokens, Command::ClearStrip),
        Some("BRIGHT") => int_args::<1>(&mut tokens).map(|[level]| Command::SetBrightness(level)),
        Some("FILL") => {
            int_args::<3>(&mut tokens).map(|[r, g, b]| Command::Fill(RawColor { r, g, b }))
        }
        Some(keyword @ ("SET" | "SETN")) => {
            int_args::<4>(&mut tokens).map(|[index, r, g, b]| Command::SetPixel {
                index,
                color: RawColor { r, g, b },
                persist: keyword == "SETN",
            })
        }
        Some("FRAME") => frame_payload(&upper["FRAME".len()..]).map(Command::DecodeFrame),
        _ => None,
    };

    parsed.unwrap_or_else(|| Command::Unknown(String::from(raw)))
}

/// Usage text for a line whose keyword is known but whose arguments are not.
pub fn usage(raw: &str) -> Option<&'static str> {
    let keyword = raw.split_ascii_whitespace().next()?;
    let usage = match keyword.to_ascii_uppercase().as_str() {
        "BRIGHT" => USAGE_BRIGHT,
        "FILL" => USAGE_FILL,
        "SET" => USAGE_SET,
        "SETN" => USAGE_SETN,
        "FRAME" => USAGE_FRAME,
        _ => return None,
    };
    Some(usage)
}

fn no_args(tokens: &mut SplitAsciiWhitespace<'_>, command: Command) -> Option<Command> {
    tokens.next().is_none().then_some(command)
}

/// Exactly `N` integer tokens.
fn int_args<const N: usize>(tokens: &mut SplitAsciiWhitespace<'_>) -> Option<[i32; N]> {
    let mut values = [0i32; N];
    for value in values.iter_mut() {
        *value = tokens.next()?.parse().ok()?;
    }
    if tokens.next().is_some() {
        return None;
    }
    Some(values)
}

fn frame_payload(rest: &str) -> Option<String> {
    if !rest.starts_with(|c: char| c.is_ascii_whitespace()) {
        return None;
    }
    let payload: String = rest.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    (!payload.is_empty()).then_some(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unknown(text: &str) -> Command {
        Command::Unknown(String::from(text))
    }

    #[test]
    fn keywords_are_case_insensitive() {
        for line in ["ping", "Ping", "PING", "  pInG \r"] {
            assert_eq!(parse(line), Command::Ping);
        }
        assert_eq!(parse("info"), Command::Info);
        assert_eq!(parse("show"), Command::ShowFrame);
        assert_eq!(parse("Clear"), Command::ClearStrip);
    }

    #[test]
    fn parses_numeric_forms() {
        assert_eq!(parse("BRIGHT 300"), Command::SetBrightness(300));
        assert_eq!(
            parse("fill 300 -5 10"),
            Command::Fill(RawColor { r: 300, g: -5, b: 10 })
        );
        assert_eq!(
            parse("SET 2 1 2 3"),
            Command::SetPixel {
                index: 2,
                color: RawColor { r: 1, g: 2, b: 3 },
                persist: false
            }
        );
        assert_eq!(
            parse("setn -1 0 0 +7"),
            Command::SetPixel {
                index: -1,
                color: RawColor { r: 0, g: 0, b: 7 },
                persist: true
            }
        );
    }

    #[test]
    fn wrong_arity_or_non_numeric_is_unknown() {
        assert_eq!(parse("BRIGHT abc"), unknown("BRIGHT abc"));
        assert_eq!(parse("BRIGHT"), unknown("BRIGHT"));
        assert_eq!(parse("BRIGHT 1 2"), unknown("BRIGHT 1 2"));
        assert_eq!(parse("FILL 1 2"), unknown("FILL 1 2"));
        assert_eq!(parse("SET 1 2 3"), unknown("SET 1 2 3"));
        assert_eq!(parse("SETN 1 2 3 4 5"), unknown("SETN 1 2 3 4 5"));
        assert_eq!(parse("PING now"), unknown("PING now"));
        assert_eq!(parse("FILL 99999999999 0 0"), unknown("FILL 99999999999 0 0"));
    }

    #[test]
    fn blank_and_garbage_lines_are_unknown() {
        assert_eq!(parse(""), unknown(""));
        assert_eq!(parse("   "), unknown(""));
        assert_eq!(parse("hello world"), unknown("hello world"));
        assert_eq!(parse("SETX 1 2 3 4"), unknown("SETX 1 2 3 4"));
    }

    #[test]
    fn unknown_keeps_original_casing() {
        assert_eq!(parse("  bright Lots "), unknown("bright Lots"));
    }

    #[test]
    fn frame_payload_is_uppercased_and_compacted() {
        assert_eq!(
            parse("frame ff0000 00FF00 0000ff"),
            Command::DecodeFrame(String::from("FF000000FF000000FF"))
        );
        assert_eq!(parse("FRAME"), unknown("FRAME"));
        assert_eq!(parse("FRAMEFF0000"), unknown("FRAMEFF0000"));
    }

    #[test]
    fn usage_lookup_by_keyword() {
        assert_eq!(usage("bright abc"), Some(USAGE_BRIGHT));
        assert_eq!(usage("FILL"), Some(USAGE_FILL));
        assert_eq!(usage("SET 1"), Some(USAGE_SET));
        assert_eq!(usage("setn"), Some(USAGE_SETN));
        assert_eq!(usage("FRAME"), Some(USAGE_FRAME));
        assert_eq!(usage("PING 1"), None);
        assert_eq!(usage(""), None);
    }
}
