#![no_std]
#![no_main]

use embassy_net::{Config, StackResources};
use embassy_time::{Duration, Instant, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::rmt::Rmt;
use esp_hal::rng::Rng;
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::usb_serial_jtag::UsbSerialJtag;
use esp_hal_embassy::Executor;
use esp_hal_smartled::{SmartLedsAdapter, smart_led_buffer};
use esp_wifi::wifi;
use log::{LevelFilter, error, info, warn};
use static_cell::StaticCell;

extern crate alloc;

use ledwall_rs::config;
use ledwall_rs::connectivity::{ConnectivitySupervisor, Credentials};
use ledwall_rs::dispatch::StripContext;
use ledwall_rs::http_server::HttpEndpoint;
use ledwall_rs::led_control::StripDriver;
use ledwall_rs::serial::SerialPort;
use ledwall_rs::sink::PixelSink;
use ledwall_rs::wifi::WiFiManager;

esp_bootloader_esp_idf::esp_app_desc!();

/// RMT pulse buffer length for the strip: 24 pulses per pixel plus the end marker
const RMT_BUFFER_SIZE: usize = config::NUM_LEDS * 24 + 1;

type LedAdapter = SmartLedsAdapter<esp_hal::rmt::Channel<esp_hal::Blocking, 0>, RMT_BUFFER_SIZE>;
type Strip = StripDriver<LedAdapter, { config::NUM_LEDS }>;

static WIFI_INIT_CELL: StaticCell<esp_wifi::EspWifiController<'static>> = StaticCell::new();
static STACK_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
static HTTP_RX_BUFFER: StaticCell<[u8; config::MAX_HTTP_REQUEST]> = StaticCell::new();
static HTTP_TX_BUFFER: StaticCell<[u8; config::MAX_HTTP_REQUEST]> = StaticCell::new();
static EXECUTOR: StaticCell<Executor> = StaticCell::new();

/// Everything the run loop owns
struct Board {
    strip: Strip,
    ctx: StripContext,
    serial: SerialPort<'static>,
    http: HttpEndpoint,
    wifi: WiFiManager<'static>,
    supervisor: ConnectivitySupervisor,
}

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    esp_println::println!("[MAIN] Panic: {}", info);
    loop {}
}

fn halt(what: &str) -> ! {
    error!("[MAIN] {} - halting", what);
    loop {}
}

#[embassy_executor::task]
async fn net_task(
    mut runner: embassy_net::Runner<'static, esp_wifi::wifi::WifiDevice<'static>>,
) -> ! {
    runner.run().await
}

/// Supervisor poll, then HTTP (only while connected), then serial.
#[embassy_executor::task]
async fn run_loop_task(mut board: Board) -> ! {
    info!("[MAIN] Run loop started");

    loop {
        let now_ms = Instant::now().as_millis();
        let was_enabled = board.supervisor.network_enabled();
        board.supervisor.poll(&mut board.wifi, now_ms);

        if board.supervisor.network_enabled() {
            board
                .http
                .serve_once(&mut board.strip, &mut board.ctx)
                .await;
        } else if was_enabled {
            board.http.reset().await;
        }

        board.serial.poll(&mut board.strip, &mut board.ctx);

        Timer::after(Duration::from_millis(config::POLL_INTERVAL_MS)).await;
    }
}

#[esp_hal::main]
fn main() -> ! {
    esp_println::logger::init_logger(LevelFilter::Info);
    info!("[MAIN] ledwall-rs v{} starting", ledwall_rs::VERSION);

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    esp_alloc::heap_allocator!(size: 72 * 1024);

    let timer_group0 = TimerGroup::new(peripherals.TIMG0);
    esp_hal_embassy::init(timer_group0.timer0);

    // Strip first so it is dark before anything else can fail.
    info!(
        "[LED] Initializing {} pixel strip on GPIO{}",
        config::NUM_LEDS,
        config::LED_DATA_PIN
    );
    let rmt = match Rmt::new(peripherals.RMT, Rate::from_mhz(80)) {
        Ok(rmt) => rmt,
        Err(e) => {
            error!("[LED] Failed to initialize RMT: {:?}", e);
            halt("RMT initialization failed")
        }
    };
    let adapter = SmartLedsAdapter::new(
        rmt.channel0,
        peripherals.GPIO4,
        smart_led_buffer!(config::NUM_LEDS),
    );
    let mut strip: Strip = StripDriver::new(adapter, config::COLOR_ORDER);
    let ctx = StripContext::new(config::NUM_LEDS, config::DEFAULT_BRIGHTNESS);
    strip.clear();
    if let Err(e) = strip.flush(ctx.brightness) {
        warn!("[LED] Initial clear failed: {}", e);
    }

    let mut serial = SerialPort::new(UsbSerialJtag::new(peripherals.USB_DEVICE));

    let timer_group1 = TimerGroup::new(peripherals.TIMG1);
    let mut rng = Rng::new(peripherals.RNG);
    let net_seed = (u64::from(rng.random()) << 32) | u64::from(rng.random());
    let wifi_init = match esp_wifi::init(timer_group1.timer0, rng, peripherals.RADIO_CLK) {
        Ok(wifi_init) => wifi_init,
        Err(e) => {
            error!("[WIFI] Driver init failed: {:?}", e);
            halt("WiFi driver initialization failed")
        }
    };
    let wifi_init = WIFI_INIT_CELL.init(wifi_init);

    let (wifi_controller, wifi_interfaces) = match wifi::new(wifi_init, peripherals.WIFI) {
        Ok(pair) => pair,
        Err(e) => {
            error!("[WIFI] Controller creation failed: {:?}", e);
            halt("WiFi controller creation failed")
        }
    };

    let (stack, runner) = embassy_net::new(
        wifi_interfaces.sta,
        Config::dhcpv4(Default::default()),
        STACK_RESOURCES.init(StackResources::new()),
        net_seed,
    );

    let mut wifi_manager = WiFiManager::new(wifi_controller);
    wifi_manager.set_stack(stack);
    info!("[WIFI] WiFi driver and embassy-net stack ready");

    let http = HttpEndpoint::new(
        stack,
        HTTP_RX_BUFFER.init([0; config::MAX_HTTP_REQUEST]),
        HTTP_TX_BUFFER.init([0; config::MAX_HTTP_REQUEST]),
    );

    let credentials = match Credentials::from_config(config::WIFI_SSID, config::WIFI_PASSWORD) {
        Ok(credentials) => credentials,
        Err(e) => {
            error!("[WIFI] WiFi credentials rejected: {}", e);
            None
        }
    };
    let supervisor = ConnectivitySupervisor::new(
        credentials,
        config::WIFI_CONNECT_TIMEOUT_MS,
        config::WIFI_RECONNECT_INTERVAL_MS,
    );

    if let Err(e) = serial.announce_ready() {
        warn!("[SERIAL] Could not send READY: {}", e);
    }

    let board = Board {
        strip,
        ctx,
        serial,
        http,
        wifi: wifi_manager,
        supervisor,
    };

    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        info!("[MAIN] Spawning network task...");
        if let Err(e) = spawner.spawn(net_task(runner)) {
            error!("[MAIN] Failed to spawn network task: {:?}", e);
        }

        info!("[MAIN] Spawning run loop task...");
        if let Err(e) = spawner.spawn(run_loop_task(board)) {
            error!("[MAIN] Failed to spawn run loop task: {:?}", e);
        }
    });
}
