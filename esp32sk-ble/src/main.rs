//! BLE scanner for ESP32-SK environmental sensors
//!
//! Listens for the sensor's manufacturer-specific advertisements, decodes them
//! and prints one JSON line per value. Also decodes and builds payloads offline.

mod host;
mod scanner;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use esp32sk_proto::{
    DEVICE_NAME, Payload, Reading, build_advertisement, find_manufacturer_data, local_name,
    parse_advertisement,
};
use esp32sk_sensor::{Config, Esp32Sk, Monitor, validate};
use log::*;

use crate::host::JsonHost;

#[derive(Parser)]
#[command(name = "esp32sk-ble")]
#[command(about = "Decode ESP32-SK environmental sensor advertisements")]
struct Cli {
    /// Config file (default: $ESP32SK_HOME/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for BLE devices and mark ESP32-SK sensors
    Scan {
        /// Scan duration in seconds (default from config)
        #[arg(short, long)]
        duration: Option<u64>,
    },
    /// Print a JSON line for every value advertised by ESP32-SK sensors
    Watch {
        /// Only devices whose name or address contains this
        #[arg(short, long)]
        device: Option<String>,
    },
    /// Decode a hex payload
    Decode {
        /// Manufacturer payload (without company id), or a raw advertisement with --adv
        hex: String,
        /// Input is complete advertising data
        #[arg(long)]
        adv: bool,
    },
    /// Build the payload the firmware would broadcast
    Encode {
        /// Temperature in °C
        #[arg(short, long, allow_negative_numbers = true)]
        temperature: Option<f64>,
        /// Relative humidity in %
        #[arg(short = 'H', long)]
        humidity: Option<f64>,
        /// Pressure in Pa
        #[arg(short, long)]
        pressure: Option<f64>,
        /// Print complete advertising data instead of the bare payload
        #[arg(long)]
        adv: bool,
        /// Local name for --adv
        #[arg(short, long, default_value = DEVICE_NAME)]
        name: String,
    },
    /// Write a config file with default settings
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)?;

    match cli.command {
        Commands::Scan { duration } => {
            scan_devices(&config, duration.unwrap_or(config.scan_secs)).await?;
        }
        Commands::Watch { device } => {
            watch_devices(config, device.as_deref()).await?;
        }
        Commands::Decode { hex, adv } => {
            decode_hex(&config, &hex, adv)?;
        }
        Commands::Encode {
            temperature,
            humidity,
            pressure,
            adv,
            name,
        } => {
            let payload = Payload::from_measurements(temperature, humidity, pressure).to_bytes();
            let bytes = if adv {
                build_advertisement(&name, config.manufacturer_id, &payload)?
            } else {
                payload
            };
            println!("{}", HEXLOWER.encode(&bytes));
        }
        Commands::InitConfig => {
            if config_path.exists() {
                eprintln!("Config already exists at {}", config_path.display());
                std::process::exit(1);
            }
            config.save(&config_path)?;
            println!("Created config at {}", config_path.display());
        }
    }

    Ok(())
}

async fn scan_devices(config: &Config, duration: u64) -> Result<(), Box<dyn std::error::Error>> {
    println!("Scanning for BLE devices ({} seconds)...", duration);

    let adapter = scanner::get_adapter().await?;
    let sensor = Esp32Sk::new(config.manufacturer_id);
    let devices = scanner::scan(&adapter, &sensor, duration).await?;

    println!("\nFound {} devices:", devices.len());
    for device in &devices {
        let rssi = device
            .rssi
            .map(|r| format!("{} dBm", r))
            .unwrap_or_else(|| "N/A".to_string());
        let marker = if device.is_esp32sk() { " [ESP32-SK]" } else { "" };

        println!("  {} ({}) RSSI: {}{}", device.name, device.address, rssi, marker);
        if let Some(reading) = &device.reading {
            println!("    {}", summary(reading));
        }
    }

    Ok(())
}

async fn watch_devices(
    config: Config,
    target: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let adapter = scanner::get_adapter().await?;
    let config = Arc::new(config);
    let manufacturer_id = config.manufacturer_id;

    let mut monitor = Monitor::new(manufacturer_id, move |device: &String| {
        JsonHost::new(device.as_str(), config.clone(), std::io::stdout())
    });

    scanner::watch(&adapter, &mut monitor, target).await?;
    info!("{} ESP32-SK device(s) seen", monitor.active_count());
    Ok(())
}

fn decode_hex(config: &Config, hex: &str, adv: bool) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = HEXLOWER_PERMISSIVE.decode(hex.trim().as_bytes())?;

    let payload = if adv {
        let structures = parse_advertisement(&bytes)?;
        if let Some(name) = local_name(&structures) {
            info!("advertised name: {name}");
        }
        find_manufacturer_data(&structures, config.manufacturer_id)
            .ok_or_else(|| {
                format!(
                    "no manufacturer data for company id {:#06x}",
                    config.manufacturer_id
                )
            })?
            .to_vec()
    } else {
        bytes
    };

    let reading = Reading::decode(Some(payload.as_slice()));
    for (field, value) in validate::out_of_range(&reading) {
        warn!("{} out of range: {value}", field.key());
    }
    println!("{}", serde_json::to_string_pretty(&reading)?);
    Ok(())
}

fn summary(reading: &Reading) -> String {
    let show = |v: Option<f64>, unit: &str| match v {
        Some(v) => format!("{v}{unit}"),
        None => "-".to_string(),
    };
    format!(
        "T={} H={} P={}",
        show(reading.temperature_celsius(), "°C"),
        show(reading.humidity_percent(), "%"),
        show(reading.pressure_pa, "Pa"),
    )
}
