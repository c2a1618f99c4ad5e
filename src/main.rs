mod chord;
mod config;
mod controller;
mod keyboard;
mod mapping;
mod session;
mod virtual_pad;

use clap::Parser;
use config::Config;
use controller::Controller;
use evdev::Device;
use session::Session;
use virtual_pad::VirtualPad;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = Config::parse();

    if config.list {
        keyboard::list_keyboards();
        return;
    }

    println!("kb2joy - Keyboard-to-gamepad injector");
    println!();

    let device_path = match &config.device {
        Some(path) => path.clone(),
        None => match keyboard::find_keyboard_device() {
            Some(path) => path.to_string_lossy().to_string(),
            None => {
                log::error!("No keyboard device found. Are you in the 'input' group?");
                log::error!("Try: sudo usermod -aG input $USER (then re-login)");
                std::process::exit(1);
            }
        },
    };

    let keyboard = match Device::open(&device_path) {
        Ok(device) => {
            log::info!(
                "Opened keyboard device: {} ({})",
                device.name().unwrap_or("unknown"),
                device_path
            );
            device
        }
        Err(e) => {
            log::error!("Failed to open keyboard device {}: {}", device_path, e);
            log::error!("Check permissions on {}", device_path);
            std::process::exit(1);
        }
    };

    // The Enter that launched us may still be down; a stuck press must
    // never leak into translation.
    if let Err(e) = keyboard::wait_for_release(&keyboard) {
        log::error!("Failed to read keyboard state: {}", e);
        std::process::exit(1);
    }

    let supported = match keyboard.supported_keys() {
        Some(keys) => keys,
        None => {
            log::error!("{} reports no key capabilities", device_path);
            std::process::exit(1);
        }
    };

    let mut specs = Vec::new();
    for path in &config.configs {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                log::error!("Failed to read config {}: {}", path, e);
                std::process::exit(1);
            }
        };
        match mapping::parse(&source, supported) {
            Ok(spec) => specs.push(spec),
            Err(e) => {
                log::error!("{}: {}", path, e);
                std::process::exit(1);
            }
        }
    }

    // All sinks come up before dispatch starts, or none stay.
    let mut controllers = Vec::new();
    for spec in specs {
        let pad = match VirtualPad::create(&spec) {
            Ok(pad) => pad,
            Err(e) => {
                log::error!(
                    "Failed to create virtual controller {}: {}",
                    spec.identity.name,
                    e
                );
                log::error!("Do you have /dev/uinput access? Try: sudo modprobe uinput");
                std::process::exit(1);
            }
        };
        controllers.push((Controller::new(spec.bindings), pad));
    }

    println!();
    println!("Press Ctrl+F1 to toggle grabbing the keyboard.");
    println!("Press Ctrl+Escape to quit.");
    println!();

    let mut session = Session::new(keyboard, controllers);
    if let Err(e) = session.run() {
        log::error!("Error reading keyboard events: {}", e);
        std::process::exit(1);
    }
    log::info!("Done");
}
