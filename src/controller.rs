use evdev::Key;
use std::collections::HashMap;

use crate::mapping::{Binding, Target};

// EV_KEY event values
const RELEASED: i32 = 0;
const REPEAT: i32 = 2;

/// One translated event, ready to be framed with a SYN marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputEvent {
    pub target: Target,
    pub value: i32,
}

/// Per-controller translation engine: the binding table plus the last
/// value sent for each target. State changes exactly when an event is
/// returned, never otherwise.
pub struct Controller {
    bindings: HashMap<u16, Binding>,
    values: HashMap<Target, i32>,
}

impl Controller {
    pub fn new(bindings: HashMap<u16, Binding>) -> Self {
        Self {
            bindings,
            values: HashMap::new(),
        }
    }

    /// Translate one keyboard event into this controller's output, if any.
    ///
    /// A release on an axis is dropped while another key of the same
    /// group holds the axis elsewhere: snapping back to neutral under a
    /// still-held direction is the one thing this engine must never do.
    pub fn translate(&mut self, key: Key, value: i32) -> Option<OutputEvent> {
        let binding = self.bindings.get(&key.code())?;
        if value == REPEAT {
            return None;
        }
        let out = if value == RELEASED { 0 } else { binding.press };
        if value == RELEASED && matches!(binding.target, Target::Axis(_)) {
            let current = self.values.get(&binding.target).copied().unwrap_or(0);
            if binding.press != current {
                return None;
            }
        }
        let target = binding.target;
        self.values.insert(target, out);
        Some(OutputEvent { target, value: out })
    }
}
