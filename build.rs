fn main() {
    // Load .env file for WiFi configuration
    load_env_config();

    // Host builds only compile the protocol core; the ESP linker setup is
    // for the firmware images.
    if std::env::var_os("CARGO_FEATURE_FIRMWARE").is_some() {
        linker_be_nice();
        // make sure linkall.x is the last linker script (otherwise might cause problems with flip-link)
        println!("cargo:rustc-link-arg-bins=-Tlinkall.x");
    }
}

/// Load environment configuration from .env file
/// Environment variables take priority over .env file values
fn load_env_config() {
    use std::env;
    use std::path::Path;

    println!("cargo:rerun-if-changed=.env");
    println!("cargo:rerun-if-env-changed=WIFI_SSID");
    println!("cargo:rerun-if-env-changed=WIFI_PASSWORD");

    if Path::new(".env").exists() {
        match dotenvy::dotenv() {
            Ok(_) => println!("cargo:warning=Loaded .env file"),
            Err(e) => println!("cargo:warning=Failed to load .env file: {}", e),
        }
    }

    // Empty values are treated the same as missing ones: the firmware then
    // stays serial-only.
    let wifi_ssid = env::var("WIFI_SSID").unwrap_or_default().trim().to_string();
    let wifi_password = env::var("WIFI_PASSWORD")
        .unwrap_or_default()
        .trim()
        .to_string();

    println!("cargo:rustc-env=WIFI_SSID={}", wifi_ssid);
    println!("cargo:rustc-env=WIFI_PASSWORD={}", wifi_password);

    if wifi_ssid.is_empty() {
        println!("cargo:warning=WIFI_SSID is empty - network transport will stay disabled");
    } else {
        println!("cargo:warning=WIFI_SSID configured: {}", wifi_ssid);
    }

    if !wifi_ssid.is_empty() && wifi_password.is_empty() {
        println!("cargo:warning=WIFI_PASSWORD is empty - joining as an open network");
    }
}

fn linker_be_nice() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 2 {
        let kind = &args[1];
        let what = &args[2];

        match kind.as_str() {
            "undefined-symbol" => match what.as_str() {
                "_stack_start" => {
                    eprintln!();
                    eprintln!("💡 Is the linker script `linkall.x` missing?");
                    eprintln!();
                }
                "esp_wifi_preempt_enable"
                | "esp_wifi_preempt_yield_task"
                | "esp_wifi_preempt_task_create" => {
                    eprintln!();
                    eprintln!("💡 `esp-wifi` has no scheduler enabled. Make sure you have the `builtin-scheduler` feature enabled, or that you provide an external scheduler.");
                    eprintln!();
                }
                _ => (),
            },
            _ => {
                std::process::exit(1);
            }
        }

        std::process::exit(0);
    }

    if let Ok(exe) = std::env::current_exe() {
        println!(
            "cargo:rustc-link-arg-bins=--error-handling-script={}",
            exe.display()
        );
    }
}
