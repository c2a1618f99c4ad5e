use evdev::{Device, InputEventKind};
use std::io::ErrorKind;

use crate::chord::{ChordAction, ChordTracker};
use crate::controller::Controller;
use crate::virtual_pad::VirtualPad;

/// Owns the physical keyboard and every (controller, sink) pair, and
/// runs the single-threaded dispatch loop.
pub struct Session {
    keyboard: Device,
    controllers: Vec<(Controller, VirtualPad)>,
    chords: ChordTracker,
    captured: bool,
}

impl Session {
    pub fn new(keyboard: Device, controllers: Vec<(Controller, VirtualPad)>) -> Self {
        Self {
            keyboard,
            controllers,
            chords: ChordTracker::new(),
            captured: false,
        }
    }

    /// Block on the keyboard until the quit chord or an unrecoverable
    /// read error. Events are handled strictly in arrival order: the
    /// chord tracker sees every event, translation only happens while
    /// capture is on.
    pub fn run(&mut self) -> std::io::Result<()> {
        self.keyboard.grab()?;
        self.captured = true;
        log::info!("Keyboard grabbed");

        loop {
            // Collect into an owned Vec inside the same expression so the
            // borrowing `FetchEventsSynced` is dropped before the match
            // body, leaving `self.keyboard` free to ungrab on a fatal read.
            let fetched: std::io::Result<Vec<_>> =
                self.keyboard.fetch_events().map(|events| events.collect());
            let events = match fetched {
                Ok(events) => events,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    let _ = self.keyboard.ungrab();
                    return Err(e);
                }
            };

            for event in events {
                let key = match event.kind() {
                    InputEventKind::Key(key) => key,
                    _ => continue,
                };
                // Chords first: the toggling event itself is translated
                // under the capture state the toggle leaves behind.
                match self.chords.observe(key, event.value()) {
                    Some(ChordAction::ToggleCapture) => self.toggle_capture(),
                    Some(ChordAction::Quit) => {
                        println!("Received Ctrl+Escape. Exit.");
                        if self.captured {
                            let _ = self.keyboard.ungrab();
                        }
                        return Ok(());
                    }
                    None => {}
                }
                if self.captured {
                    for (controller, pad) in &mut self.controllers {
                        if let Some(out) = controller.translate(key, event.value()) {
                            if let Err(e) = pad.emit(&out) {
                                log::warn!("Failed to emit event: {}", e);
                            }
                        }
                    }
                }
            }
        }
    }

    fn toggle_capture(&mut self) {
        self.captured = !self.captured;
        println!("Received Ctrl+F1. Set grab to {}.", self.captured);
        let result = if self.captured {
            self.keyboard.grab()
        } else {
            self.keyboard.ungrab()
        };
        if let Err(e) = result {
            log::warn!(
                "Failed to {} keyboard: {}",
                if self.captured { "grab" } else { "ungrab" },
                e
            );
        }
    }
}
