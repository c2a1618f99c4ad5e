use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, BusType, EventType, InputEvent, InputId, Key, UinputAbsSetup};

use crate::controller::OutputEvent;
use crate::mapping::{Capability, ControllerSpec, Target};

/// One uinput sink, built from a parsed controller spec.
pub struct VirtualPad {
    device: VirtualDevice,
}

impl VirtualPad {
    pub fn create(spec: &ControllerSpec) -> std::io::Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for capability in &spec.capabilities {
            if let Capability::Button(key) = capability {
                keys.insert(*key);
            }
        }

        let mut builder = VirtualDeviceBuilder::new()?
            .name(spec.identity.name.as_str())
            .input_id(InputId::new(
                BusType::BUS_VIRTUAL,
                spec.identity.vendor,
                spec.identity.product,
                spec.identity.version,
            ))
            .with_keys(&keys)?;
        for capability in &spec.capabilities {
            if let Capability::Axis(axis, info) = capability {
                builder = builder.with_absolute_axis(&UinputAbsSetup::new(*axis, *info))?;
            }
        }
        let mut device = builder.build()?;

        for path in device.enumerate_dev_nodes_blocking()? {
            let path = path?;
            log::info!("Device {} is at {}", spec.identity.name, path.display());
        }

        Ok(Self { device })
    }

    /// Deliver one translated event as an atomic frame.
    pub fn emit(&mut self, event: &OutputEvent) -> std::io::Result<()> {
        self.device.emit(&frame(event))
    }
}

/// One output frame: the translated event plus the SYN_REPORT that
/// makes the kernel deliver it.
pub fn frame(event: &OutputEvent) -> [InputEvent; 2] {
    let inner = match event.target {
        Target::Button(code) => InputEvent::new_now(EventType::KEY, code, event.value),
        Target::Axis(code) => InputEvent::new_now(EventType::ABSOLUTE, code, event.value),
    };
    [inner, InputEvent::new_now(EventType::SYNCHRONIZATION, 0, 0)]
}
