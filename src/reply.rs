//! Response formatter
//!
//! The only place the `OK ...` / `ERR ...` wire text is produced.

use alloc::format;
use alloc::string::String;

/// Outcome of one command
pub type Reply = Result<Option<String>, CommandError>;

/// Everything a transport can answer with `ERR`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    IndexOutOfRange,
    Usage(&'static str),
    UnknownCommand,
    LineTooLong,
    MissingPayload,
    NotFound,
    StripWrite,
}

impl core::fmt::Display for CommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CommandError::IndexOutOfRange => f.write_str("index out of range"),
            CommandError::Usage(usage) => f.write_str(usage),
            CommandError::UnknownCommand => f.write_str("unknown command"),
            CommandError::LineTooLong => f.write_str("line too long"),
            CommandError::MissingPayload => f.write_str("missing payload"),
            CommandError::NotFound => f.write_str("not found"),
            CommandError::StripWrite => f.write_str("led write failed"),
        }
    }
}

/// Render a reply as one protocol line, without line terminator.
pub fn format_reply(reply: &Reply) -> String {
    match reply {
        Ok(None) => String::from("OK"),
        Ok(Some(message)) => format!("OK {}", message),
        Err(err) => format!("ERR {}", err),
    }
}

/// Whether a formatted line reports success
pub fn is_ok_line(line: &str) -> bool {
    line == "OK" || line.starts_with("OK ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::USAGE_FILL;

    #[test]
    fn formats_success() {
        assert_eq!(format_reply(&Ok(None)), "OK");
        assert_eq!(
            format_reply(&Ok(Some(String::from("NUM_LEDS 3 BRIGHT 32")))),
            "OK NUM_LEDS 3 BRIGHT 32"
        );
    }

    #[test]
    fn formats_errors() {
        assert_eq!(
            format_reply(&Err(CommandError::IndexOutOfRange)),
            "ERR index out of range"
        );
        assert_eq!(
            format_reply(&Err(CommandError::Usage(USAGE_FILL))),
            "ERR usage: FILL <r> <g> <b>"
        );
        assert_eq!(
            format_reply(&Err(CommandError::UnknownCommand)),
            "ERR unknown command"
        );
        assert_eq!(format_reply(&Err(CommandError::LineTooLong)), "ERR line too long");
    }

    #[test]
    fn ok_line_detection() {
        assert!(is_ok_line("OK"));
        assert!(is_ok_line("OK NUM_LEDS 3 BRIGHT 1"));
        assert!(!is_ok_line("OKAY"));
        assert!(!is_ok_line("ERR unknown command"));
    }
}
