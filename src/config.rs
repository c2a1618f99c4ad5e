use clap::Parser;

/// Linux keyboard-to-gamepad injector (evdev/uinput).
/// Turns one keyboard into one or more virtual game controllers.
#[derive(Parser, Debug)]
#[command(name = "kb2joy")]
pub struct Config {
    /// Mapping config files, one per virtual controller
    #[arg(value_name = "CONFIG", required_unless_present = "list")]
    pub configs: Vec<String>,

    /// Specific evdev device path of the keyboard (e.g. /dev/input/event3)
    #[arg(short, long)]
    pub device: Option<String>,

    /// List available keyboards and exit
    #[arg(short, long, default_value_t = false)]
    pub list: bool,
}
