use evdev::{AbsInfo, AbsoluteAxisType, AttributeSet, AttributeSetRef, Key};
use std::collections::HashMap;
use thiserror::Error;

/// Range every virtual axis is declared with.
pub const AXIS_MIN: i32 = -1000;
pub const AXIS_MAX: i32 = 1000;

const KEY_CODE_MAX: u16 = 0x2ff;
const ABS_CODE_MAX: u16 = 0x3f;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("line {line}: expected exactly one '=' in {text:?}")]
    MalformedLine { line: usize, text: String },

    #[error("line {line}: {field} is not a valid number: {text:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        text: String,
    },
}

/// Identity of one virtual controller, fixed at parse time.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub name: String,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

/// One capability the virtual controller exposes, in declaration order.
#[derive(Clone, Copy)]
pub enum Capability {
    Button(Key),
    Axis(AbsoluteAxisType, AbsInfo),
}

// `AbsInfo` (evdev 0.12) does not implement `Debug`, so the derive cannot
// be used on `Capability`. Format it through its public accessors.
impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Button(key) => f.debug_tuple("Button").field(key).finish(),
            Capability::Axis(axis, info) => f
                .debug_tuple("Axis")
                .field(axis)
                .field(&(info.minimum(), info.maximum()))
                .finish(),
        }
    }
}

/// Output address of a binding: which event the controller emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Button(u16),
    Axis(u16),
}

/// One keyboard key bound to one capability. Release always emits 0,
/// press emits `press` (1 for buttons, the negotiated step for axes).
#[derive(Debug, Clone, Copy)]
pub struct Binding {
    pub target: Target,
    pub press: i32,
}

/// Everything one config file declares: who the controller is, what it
/// exposes, and which keyboard keys drive it.
#[derive(Debug)]
pub struct ControllerSpec {
    pub identity: Identity,
    pub capabilities: Vec<Capability>,
    pub bindings: HashMap<u16, Binding>,
}

/// Parse one controller config against the physical keyboard's key set.
///
/// Unknown capability names and keys the keyboard cannot deliver are
/// skipped, not errors: configs are shared across machines with
/// different keyboards.
pub fn parse(source: &str, keyboard: &AttributeSetRef<Key>) -> Result<ControllerSpec, MappingError> {
    let mut identity = Identity::default();
    let mut capabilities = Vec::new();
    let mut bindings = HashMap::new();

    for (idx, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (name, value) = match line.split_once('=') {
            Some((name, value)) if !value.contains('=') => (name.trim(), value.trim()),
            _ => {
                return Err(MappingError::MalformedLine {
                    line: idx + 1,
                    text: raw.to_string(),
                })
            }
        };
        match name {
            "NAME" => identity.name = value.to_string(),
            "VENDOR" => identity.vendor = parse_id(value, "VENDOR", idx + 1)?,
            "PRODUCT" => identity.product = parse_id(value, "PRODUCT", idx + 1)?,
            "VERSION" => identity.version = parse_id(value, "VERSION", idx + 1)?,
            _ => bind_capability(name, value, keyboard, &mut capabilities, &mut bindings),
        }
    }

    Ok(ControllerSpec {
        identity,
        capabilities,
        bindings,
    })
}

/// Identity numbers accept hex (0x...) or decimal, like the kernel's own
/// id files.
fn parse_id(text: &str, field: &'static str, line: usize) -> Result<u16, MappingError> {
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16)
    } else {
        text.parse()
    };
    parsed.map_err(|_| MappingError::InvalidNumber {
        line,
        field,
        text: text.to_string(),
    })
}

/// Register one declared capability and bind its comma-listed keys.
/// Whether the capability is an axis or a button comes from the event
/// code registry, never from the config syntax.
fn bind_capability(
    name: &str,
    value: &str,
    keyboard: &AttributeSetRef<Key>,
    capabilities: &mut Vec<Capability>,
    bindings: &mut HashMap<u16, Binding>,
) {
    let (capability, target) = if let Some(axis) = lookup_axis(name) {
        let info = AbsInfo::new(0, AXIS_MIN, AXIS_MAX, 0, 0, 0);
        (Capability::Axis(axis, info), Target::Axis(axis.0))
    } else if let Some(button) = lookup_key(name) {
        (Capability::Button(button), Target::Button(button.code()))
    } else {
        log::info!("unknown capability {}, skipping", name);
        return;
    };
    capabilities.push(capability);

    let names: Vec<&str> = value.split(',').map(str::trim).collect();
    for (i, key_name) in names.iter().enumerate() {
        let key = match lookup_key(key_name) {
            Some(key) => key,
            None => {
                log::info!("unknown key {}, skipping", key_name);
                continue;
            }
        };
        if !keyboard.contains(key) {
            log::info!("keyboard does not support {:?}, skipping", key);
            continue;
        }
        let press = match capability {
            Capability::Axis(_, info) => axis_step(&info, names.len(), i),
            Capability::Button(_) => 1,
        };
        bindings.insert(key.code(), Binding { target, press });
        log::info!("mapping {:?} -> {}, {}", key, name, press);
    }
}

/// Spread a group of N keys over an axis: N evenly spaced values with
/// the exact midpoint left unassigned, so neutral is only ever reached
/// by releasing. Skipped keys keep their slot, declared order decides
/// which side of center a key lands on.
fn axis_step(info: &AbsInfo, group: usize, index: usize) -> i32 {
    let step = (info.maximum() - info.minimum()) / group as i32;
    let slot = if index >= group / 2 { index + 1 } else { index };
    info.minimum() + step * slot as i32
}

/// Resolve a `KEY_*`/`BTN_*` name against the codes evdev knows.
fn lookup_key(name: &str) -> Option<Key> {
    // input-event-codes.h gamepad aliases hidden behind evdev's
    // canonical names
    let name = match name {
        "BTN_A" => "BTN_SOUTH",
        "BTN_B" => "BTN_EAST",
        "BTN_X" => "BTN_NORTH",
        "BTN_Y" => "BTN_WEST",
        other => other,
    };
    (0..=KEY_CODE_MAX)
        .map(Key::new)
        .find(|key| format!("{:?}", key) == name)
}

fn lookup_axis(name: &str) -> Option<AbsoluteAxisType> {
    (0..=ABS_CODE_MAX)
        .map(AbsoluteAxisType)
        .find(|axis| format!("{:?}", axis) == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyboard(keys: &[Key]) -> AttributeSet<Key> {
        let mut set = AttributeSet::new();
        for &key in keys {
            set.insert(key);
        }
        set
    }

    #[test]
    fn button_binding_presses_to_one() {
        let kb = keyboard(&[Key::KEY_SPACE]);
        let spec = parse("NAME=Pad1\nBTN_A=KEY_SPACE\n", &kb).unwrap();
        assert_eq!(spec.identity.name, "Pad1");
        let binding = spec.bindings[&Key::KEY_SPACE.code()];
        assert_eq!(binding.target, Target::Button(Key::BTN_SOUTH.code()));
        assert_eq!(binding.press, 1);
    }

    #[test]
    fn two_key_axis_spreads_around_midpoint() {
        let kb = keyboard(&[Key::KEY_LEFT, Key::KEY_RIGHT]);
        let spec = parse("ABS_X=KEY_LEFT,KEY_RIGHT\n", &kb).unwrap();
        assert_eq!(spec.bindings[&Key::KEY_LEFT.code()].press, -1000);
        assert_eq!(spec.bindings[&Key::KEY_RIGHT.code()].press, 1000);
    }

    #[test]
    fn four_key_axis_values_are_distinct_and_symmetric() {
        let kb = keyboard(&[Key::KEY_A, Key::KEY_S, Key::KEY_D, Key::KEY_F]);
        let spec = parse("ABS_X=KEY_A,KEY_S,KEY_D,KEY_F\n", &kb).unwrap();
        let values: Vec<i32> = [Key::KEY_A, Key::KEY_S, Key::KEY_D, Key::KEY_F]
            .iter()
            .map(|key| spec.bindings[&key.code()].press)
            .collect();
        assert_eq!(values, vec![-1000, -500, 500, 1000]);
        assert!(!values.contains(&0));
    }

    #[test]
    fn skipped_key_keeps_its_step_slot() {
        // KEY_RIGHT is not on this keyboard, but the group still counts
        // two declared keys, so KEY_LEFT stays at full deflection.
        let kb = keyboard(&[Key::KEY_LEFT]);
        let spec = parse("ABS_X=KEY_LEFT,KEY_RIGHT\n", &kb).unwrap();
        assert_eq!(spec.bindings.len(), 1);
        assert_eq!(spec.bindings[&Key::KEY_LEFT.code()].press, -1000);
    }

    #[test]
    fn axis_capability_declares_full_range() {
        let kb = keyboard(&[Key::KEY_LEFT]);
        let spec = parse("ABS_X=KEY_LEFT\n", &kb).unwrap();
        match spec.capabilities[0] {
            Capability::Axis(axis, info) => {
                assert_eq!(axis, AbsoluteAxisType::ABS_X);
                assert_eq!(info.minimum(), AXIS_MIN);
                assert_eq!(info.maximum(), AXIS_MAX);
            }
            Capability::Button(_) => panic!("expected an axis capability"),
        }
    }

    #[test]
    fn unknown_capability_is_skipped() {
        let kb = keyboard(&[Key::KEY_SPACE]);
        let spec = parse("FOO_BAR=KEY_SPACE\n", &kb).unwrap();
        assert!(spec.capabilities.is_empty());
        assert!(spec.bindings.is_empty());
    }

    #[test]
    fn unsupported_key_is_skipped_but_capability_stays() {
        let kb = keyboard(&[]);
        let spec = parse("BTN_A=KEY_SPACE\n", &kb).unwrap();
        assert_eq!(spec.capabilities.len(), 1);
        assert!(spec.bindings.is_empty());
    }

    #[test]
    fn last_declaration_wins_per_key() {
        let kb = keyboard(&[Key::KEY_SPACE]);
        let spec = parse("BTN_A=KEY_SPACE\nBTN_B=KEY_SPACE\n", &kb).unwrap();
        let binding = spec.bindings[&Key::KEY_SPACE.code()];
        assert_eq!(binding.target, Target::Button(Key::BTN_EAST.code()));
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let kb = keyboard(&[Key::KEY_SPACE]);
        let spec = parse("# a pad\n\n  \nNAME=Pad1\n", &kb).unwrap();
        assert_eq!(spec.identity.name, "Pad1");
    }

    #[test]
    fn identity_numbers_accept_hex_and_decimal() {
        let kb = keyboard(&[]);
        let spec = parse("VENDOR=0x45e\nPRODUCT=654\nVERSION=0x110\n", &kb).unwrap();
        assert_eq!(spec.identity.vendor, 0x45e);
        assert_eq!(spec.identity.product, 654);
        assert_eq!(spec.identity.version, 0x110);
    }

    #[test]
    fn line_without_separator_is_rejected() {
        let kb = keyboard(&[]);
        let err = parse("BTN_A\n", &kb).unwrap_err();
        assert!(matches!(err, MappingError::MalformedLine { line: 1, .. }));
    }

    #[test]
    fn line_with_two_separators_is_rejected() {
        let kb = keyboard(&[]);
        let err = parse("NAME=a=b\n", &kb).unwrap_err();
        assert!(matches!(err, MappingError::MalformedLine { line: 1, .. }));
    }

    #[test]
    fn bad_identity_number_is_rejected() {
        let kb = keyboard(&[]);
        let err = parse("NAME=Pad1\nVENDOR=xyz\n", &kb).unwrap_err();
        assert!(matches!(
            err,
            MappingError::InvalidNumber {
                line: 2,
                field: "VENDOR",
                ..
            }
        ));
    }

    #[test]
    fn gamepad_alias_names_resolve() {
        assert_eq!(lookup_key("BTN_A"), Some(Key::BTN_SOUTH));
        assert_eq!(lookup_key("BTN_Y"), Some(Key::BTN_WEST));
        assert_eq!(lookup_key("KEY_SPACE"), Some(Key::KEY_SPACE));
        assert_eq!(lookup_key("KEY_NOPE"), None);
        assert_eq!(lookup_axis("ABS_RX"), Some(AbsoluteAxisType::ABS_RX));
        assert_eq!(lookup_axis("KEY_SPACE"), None);
    }
}
