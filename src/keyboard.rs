use evdev::{Device, Key};
use std::path::PathBuf;
use std::time::Duration;

/// Alphabetic keys every real keyboard has; devices advertising all of
/// them are treated as keyboards.
const PROBE_KEYS: [Key; 5] = [
    Key::KEY_P,
    Key::KEY_Y,
    Key::KEY_K,
    Key::KEY_E,
    Key::KEY_N,
];

fn looks_like_keyboard(device: &Device) -> bool {
    device
        .supported_keys()
        .is_some_and(|keys| PROBE_KEYS.iter().all(|&key| keys.contains(key)))
}

/// Find a keyboard by enumerating /dev/input.
/// Returns the first device that passes the probe-key check.
pub fn find_keyboard_device() -> Option<PathBuf> {
    for (path, device) in evdev::enumerate() {
        if looks_like_keyboard(&device) {
            log::info!(
                "Found keyboard: {} at {}",
                device.name().unwrap_or("unknown"),
                path.display()
            );
            return Some(path);
        }
    }
    None
}

/// Listing mode: print identity and driver metadata for every device
/// that passes the probe-key check. Read-only, never grabs anything.
pub fn list_keyboards() {
    println!("Finding all available keyboards...");
    for (path, device) in evdev::enumerate() {
        if !looks_like_keyboard(&device) {
            continue;
        }
        let id = device.input_id();
        println!();
        println!("DEVICE: {}", path.display());
        println!("  Name: {}", device.name().unwrap_or("unknown"));
        println!(
            "    ID: bus {:?} vendor {:#x} product {:#x} version {:#x}",
            id.bus_type(),
            id.vendor(),
            id.product(),
            id.version()
        );
        let (major, minor, patch) = device.driver_version();
        println!("        Input driver version is {}.{}.{}", major, minor, patch);
    }
}

/// Wait until no key is down. The key that launched the program
/// (usually Enter) is often still held when the device opens, and
/// translating its release would inject a phantom event.
pub fn wait_for_release(device: &Device) -> std::io::Result<()> {
    loop {
        if device.get_key_state()?.iter().next().is_none() {
            return Ok(());
        }
        spin_sleep::sleep(Duration::from_millis(10));
    }
}
