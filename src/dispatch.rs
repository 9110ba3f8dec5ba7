//! Command dispatcher
//!
//! Executes a [`Command`] against a [`PixelSink`]. Every outcome, including
//! hardware write failures, comes back as a [`Reply`].

use alloc::format;

use crate::color::clamp8;
use crate::command::{self, Command, USAGE_FRAME};
use crate::frame;
use crate::reply::{CommandError, Reply};
use crate::sink::PixelSink;

/// Strip-wide state owned by the run loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripContext {
    pub brightness: u8,
    pub led_count: usize,
}

impl StripContext {
    pub fn new(led_count: usize, brightness: u8) -> Self {
        Self {
            brightness,
            led_count,
        }
    }
}

/// Execute one command.
pub fn dispatch<S: PixelSink>(command: Command, sink: &mut S, ctx: &mut StripContext) -> Reply {
    match command {
        Command::Ping => Ok(None),

        Command::Info => Ok(Some(format!(
            "NUM_LEDS {} BRIGHT {}",
            ctx.led_count, ctx.brightness
        ))),

        Command::SetBrightness(level) => {
            ctx.brightness = clamp8(level);
            show(sink, ctx)
        }

        Command::Fill(color) => {
            sink.fill(color.clamped());
            show(sink, ctx)
        }

        Command::SetPixel {
            index,
            color,
            persist,
        } => {
            let index = usize::try_from(index)
                .ok()
                .filter(|&i| i < ctx.led_count)
                .ok_or(CommandError::IndexOutOfRange)?;
            sink.set(index, color.clamped());
            if persist { Ok(None) } else { show(sink, ctx) }
        }

        Command::ShowFrame => show(sink, ctx),

        Command::ClearStrip => {
            sink.clear();
            show(sink, ctx)
        }

        Command::DecodeFrame(hex) => {
            let colors = frame::decode(&hex, ctx.led_count).map_err(|err| {
                log::debug!("[CMD] Rejected frame: {:?}", err);
                CommandError::Usage(USAGE_FRAME)
            })?;
            for (index, color) in colors.into_iter().enumerate() {
                sink.set(index, color);
            }
            show(sink, ctx)
        }

        Command::Unknown(raw) => Err(command::usage(&raw)
            .map(CommandError::Usage)
            .unwrap_or(CommandError::UnknownCommand)),
    }
}

fn show<S: PixelSink>(sink: &mut S, ctx: &StripContext) -> Reply {
    sink.flush(ctx.brightness).map_err(|err| {
        log::error!("[LED] Strip write failed: {}", err);
        CommandError::StripWrite
    })?;
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoardError;
    use crate::color::Color;
    use crate::command::{USAGE_BRIGHT, USAGE_SET, parse};
    use crate::sink::MemoryStrip;

    fn setup() -> (MemoryStrip<3>, StripContext) {
        (MemoryStrip::new(), StripContext::new(3, 32))
    }

    fn run(line: &str, strip: &mut MemoryStrip<3>, ctx: &mut StripContext) -> Reply {
        dispatch(parse(line), strip, ctx)
    }

    #[test]
    fn ping_and_info() {
        let (mut strip, mut ctx) = setup();
        assert_eq!(run("PING", &mut strip, &mut ctx), Ok(None));
        assert_eq!(
            run("INFO", &mut strip, &mut ctx),
            Ok(Some(String::from("NUM_LEDS 3 BRIGHT 32")))
        );
        assert_eq!(strip.flush_count(), 0);
    }

    #[test]
    fn brightness_is_clamped_and_shown() {
        let (mut strip, mut ctx) = setup();
        assert_eq!(run("BRIGHT 999", &mut strip, &mut ctx), Ok(None));
        assert_eq!(ctx.brightness, 255);
        assert_eq!(strip.shown_brightness(), 255);
        run("BRIGHT -4", &mut strip, &mut ctx).unwrap();
        assert_eq!(ctx.brightness, 0);
    }

    #[test]
    fn fill_clamps_channels() {
        let (mut strip, mut ctx) = setup();
        assert_eq!(run("FILL 300 -5 10", &mut strip, &mut ctx), Ok(None));
        assert_eq!(strip.shown(), &[Color::new(255, 0, 10); 3]);
    }

    #[test]
    fn set_shows_immediately_setn_waits_for_show() {
        let (mut strip, mut ctx) = setup();
        run("SET 0 1 2 3", &mut strip, &mut ctx).unwrap();
        assert_eq!(strip.shown()[0], Color::new(1, 2, 3));

        let flushes = strip.flush_count();
        run("SETN 1 4 5 6", &mut strip, &mut ctx).unwrap();
        assert_eq!(strip.flush_count(), flushes);
        assert_eq!(strip.shown()[1], Color::default());
        assert_eq!(strip.pixels()[1], Color::new(4, 5, 6));

        run("SHOW", &mut strip, &mut ctx).unwrap();
        assert_eq!(strip.shown()[1], Color::new(4, 5, 6));
    }

    #[test]
    fn index_must_be_in_range() {
        let (mut strip, mut ctx) = setup();
        for line in ["SET 3 1 2 3", "SET -1 1 2 3", "SETN 5 1 2 3"] {
            assert_eq!(
                run(line, &mut strip, &mut ctx),
                Err(CommandError::IndexOutOfRange)
            );
        }
        assert_eq!(strip.pixels(), &[Color::default(); 3]);
        assert_eq!(strip.flush_count(), 0);
    }

    #[test]
    fn arity_is_checked_before_range() {
        let (mut strip, mut ctx) = setup();
        assert_eq!(
            run("SET 99 1 2", &mut strip, &mut ctx),
            Err(CommandError::Usage(USAGE_SET))
        );
    }

    #[test]
    fn clear_blanks_the_strip() {
        let (mut strip, mut ctx) = setup();
        run("FILL 9 9 9", &mut strip, &mut ctx).unwrap();
        run("CLEAR", &mut strip, &mut ctx).unwrap();
        assert_eq!(strip.shown(), &[Color::default(); 3]);
    }

    #[test]
    fn frame_applies_all_pixels() {
        let (mut strip, mut ctx) = setup();
        assert_eq!(
            run("FRAME FF0000 00FF00 0000FF", &mut strip, &mut ctx),
            Ok(None)
        );
        assert_eq!(
            strip.shown(),
            &[
                Color::new(255, 0, 0),
                Color::new(0, 255, 0),
                Color::new(0, 0, 255)
            ]
        );
    }

    #[test]
    fn bad_frame_leaves_strip_untouched() {
        let (mut strip, mut ctx) = setup();
        run("FILL 1 1 1", &mut strip, &mut ctx).unwrap();
        for line in ["FRAME FF00", "FRAME FF0000FF0000FF000G", "FRAME"] {
            assert_eq!(
                run(line, &mut strip, &mut ctx),
                Err(CommandError::Usage(USAGE_FRAME))
            );
        }
        assert_eq!(strip.pixels(), &[Color::new(1, 1, 1); 3]);
    }

    #[test]
    fn unknown_and_usage_errors() {
        let (mut strip, mut ctx) = setup();
        assert_eq!(
            run("BRIGHT abc", &mut strip, &mut ctx),
            Err(CommandError::Usage(USAGE_BRIGHT))
        );
        assert_eq!(
            run("DANCE", &mut strip, &mut ctx),
            Err(CommandError::UnknownCommand)
        );
        assert_eq!(run("", &mut strip, &mut ctx), Err(CommandError::UnknownCommand));
    }

    struct BrokenStrip;

    impl PixelSink for BrokenStrip {
        fn set(&mut self, _index: usize, _color: Color) {}
        fn fill(&mut self, _color: Color) {}
        fn clear(&mut self) {}
        fn flush(&mut self, _brightness: u8) -> Result<(), BoardError> {
            Err(BoardError::LedError)
        }
    }

    #[test]
    fn flush_failure_is_reported() {
        let mut ctx = StripContext::new(3, 32);
        assert_eq!(
            dispatch(Command::ShowFrame, &mut BrokenStrip, &mut ctx),
            Err(CommandError::StripWrite)
        );
        assert_eq!(dispatch(Command::Ping, &mut BrokenStrip, &mut ctx), Ok(None));
    }
}
