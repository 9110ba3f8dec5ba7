//! On-device protocol self test
//!
//! Runs the command protocol and the connectivity supervisor against
//! in-memory doubles and prints the result of each step.

#![no_std]
#![no_main]

extern crate alloc;

use esp_hal::clock::CpuClock;
use esp_println::println;
use ledwall_rs::color::Color;
use ledwall_rs::connectivity::{
    ConnectivityState, ConnectivitySupervisor, Credentials, StationLink,
};
use ledwall_rs::line_reader::LineReader;
use ledwall_rs::{BoardError, MemoryStrip, StripContext, config, frame, handle_line};

esp_bootloader_esp_idf::esp_app_desc!();

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    println!("❌ {}", info);
    loop {}
}

/// Link that associates on the second status check
struct SlowLink {
    checks: u32,
}

impl StationLink for SlowLink {
    fn begin_association(&mut self, _credentials: &Credentials) -> Result<(), BoardError> {
        self.checks = 0;
        Ok(())
    }

    fn is_associated(&mut self) -> bool {
        self.checks += 1;
        self.checks >= 2
    }
}

fn expect(
    line: &str,
    reply: &str,
    strip: &mut MemoryStrip<{ config::NUM_LEDS }>,
    ctx: &mut StripContext,
) {
    let got = handle_line(line, strip, ctx);
    assert_eq!(got, reply, "line {:?}", line);
    println!("✅ {:<28} -> {}", line, got);
}

#[esp_hal::main]
fn main() -> ! {
    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let _peripherals = esp_hal::init(hal_config);

    esp_alloc::heap_allocator!(size: 32 * 1024);

    println!("=== Protocol self test ===");

    let mut strip = MemoryStrip::<{ config::NUM_LEDS }>::new();
    let mut ctx = StripContext::new(config::NUM_LEDS, config::DEFAULT_BRIGHTNESS);

    println!("\n1. Basic commands");
    expect("PING", "OK", &mut strip, &mut ctx);
    expect("info", "OK NUM_LEDS 15 BRIGHT 32", &mut strip, &mut ctx);
    expect("BRIGHT 999", "OK", &mut strip, &mut ctx);
    assert_eq!(ctx.brightness, 255);

    println!("\n2. Pixel writes");
    expect("FILL 300 -5 10", "OK", &mut strip, &mut ctx);
    assert!(strip.shown().iter().all(|&c| c == Color::new(255, 0, 10)));
    expect("SET 15 1 2 3", "ERR index out of range", &mut strip, &mut ctx);
    expect("SETN 0 1 2 3", "OK", &mut strip, &mut ctx);
    assert_eq!(strip.shown()[0], Color::new(255, 0, 10));
    expect("SHOW", "OK", &mut strip, &mut ctx);
    assert_eq!(strip.shown()[0], Color::new(1, 2, 3));

    println!("\n3. Frames");
    let mut pixels = [Color::default(); config::NUM_LEDS];
    pixels[0] = Color::new(0xFF, 0, 0);
    pixels[config::NUM_LEDS - 1] = Color::new(0, 0, 0xFF);
    let mut line = alloc::string::String::from("FRAME ");
    line.push_str(&frame::encode(&pixels));
    expect(&line, "OK", &mut strip, &mut ctx);
    assert_eq!(strip.shown(), &pixels);
    expect(
        "FRAME FF00",
        "ERR usage: FRAME <hex rgb payload of length ledCount*6>",
        &mut strip,
        &mut ctx,
    );
    assert_eq!(strip.shown(), &pixels);

    println!("\n4. Errors");
    expect("FILL 1 2", "ERR usage: FILL <r> <g> <b>", &mut strip, &mut ctx);
    expect("DANCE", "ERR unknown command", &mut strip, &mut ctx);
    expect("CLEAR", "OK", &mut strip, &mut ctx);
    assert!(strip.shown().iter().all(|&c| c == Color::default()));

    println!("\n5. Line assembly");
    let mut reader = LineReader::<{ config::MAX_LINE_LEN }>::new();
    let mut too_long = 0;
    for _ in 0..config::MAX_LINE_LEN + 10 {
        if let Some(Err(_)) = reader.push(b'A') {
            too_long += 1;
        }
    }
    assert_eq!(too_long, 1);
    assert!(reader.push(b'\n').is_none());
    println!("✅ Overlong line reported once and discarded");

    println!("\n6. Connectivity supervisor");
    let mut offline = ConnectivitySupervisor::new(None, 10_000, 5_000);
    let mut link = SlowLink { checks: 0 };
    for now in [0, 10_000, 60_000] {
        assert_eq!(offline.poll(&mut link, now), ConnectivityState::Disconnected);
    }
    println!("✅ No credentials: stays {:?}", offline.get_current_state());

    let mut supervisor =
        ConnectivitySupervisor::new(Credentials::new("selftest", "selftest"), 10_000, 5_000);
    assert_eq!(supervisor.poll(&mut link, 0), ConnectivityState::Connecting);
    assert_eq!(supervisor.poll(&mut link, 5), ConnectivityState::Connecting);
    assert_eq!(supervisor.poll(&mut link, 10), ConnectivityState::Connected);
    assert!(supervisor.network_enabled());
    println!("✅ Association: {:?}", supervisor.get_current_state());

    println!("\n=== All protocol checks passed ===");

    loop {
        core::hint::spin_loop();
    }
}
