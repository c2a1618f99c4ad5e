use evdev::Key;

pub const MODIFIER: Key = Key::KEY_LEFTCTRL;
pub const TOGGLE: Key = Key::KEY_F1;
pub const QUIT: Key = Key::KEY_ESC;

/// What a completed chord asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordAction {
    ToggleCapture,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    ModifierHeld,
    /// Modifier held and the toggle key was pressed during the hold.
    Armed,
    /// An armed request that outlived the modifier because the toggle
    /// key was still down at modifier release. Fires on a later
    /// modifier press-release with the toggle key up.
    ArmedParked,
}

/// Tracks the reserved Ctrl+F1 / Ctrl+Esc chords across raw key events.
///
/// The toggle arms on press but fires only on modifier release with the
/// toggle key up, so key autorepeat and held chords cause exactly one
/// capture flip per clean press-release cycle.
pub struct ChordTracker {
    state: State,
    toggle_held: bool,
}

impl ChordTracker {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            toggle_held: false,
        }
    }

    /// Feed one raw key event; returns the action a completed chord
    /// requests. Keys outside the reserved set are ignored.
    pub fn observe(&mut self, key: Key, value: i32) -> Option<ChordAction> {
        let held = value != 0;
        if key == MODIFIER {
            self.on_modifier(held)
        } else if key == TOGGLE {
            self.toggle_held = held;
            if held && self.state == State::ModifierHeld {
                self.state = State::Armed;
            }
            None
        } else if key == QUIT {
            // strictly the press transition, autorepeat does not quit
            if value == 1 && matches!(self.state, State::ModifierHeld | State::Armed) {
                Some(ChordAction::Quit)
            } else {
                None
            }
        } else {
            None
        }
    }

    fn on_modifier(&mut self, held: bool) -> Option<ChordAction> {
        match (self.state, held) {
            (State::Idle | State::ModifierHeld, true) => {
                self.state = State::ModifierHeld;
                None
            }
            (State::Idle | State::ModifierHeld, false) => {
                self.state = State::Idle;
                None
            }
            (State::Armed | State::ArmedParked, true) => {
                self.state = State::Armed;
                None
            }
            (State::Armed | State::ArmedParked, false) => {
                if self.toggle_held {
                    self.state = State::ArmedParked;
                    None
                } else {
                    self.state = State::Idle;
                    Some(ChordAction::ToggleCapture)
                }
            }
        }
    }
}
