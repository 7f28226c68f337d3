use std::{io, time::Duration};

pub const KEY_COUNT: usize = 16;

/// Latched state of the 16-key hex pad. The host sets latches, the
/// interpreter reads and clears them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn press(&mut self, key: u8) {
        self.keys[(key & 0xF) as usize] = true;
    }

    pub fn release(&mut self, key: u8) {
        self.keys[(key & 0xF) as usize] = false;
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[(key & 0xF) as usize]
    }

    /// Lowest-numbered latched key, if any.
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|&down| down).map(|key| key as u8)
    }

    pub fn clear(&mut self) {
        self.keys = [false; KEY_COUNT];
    }
}

/// Source of key presses for [`crate::Chip8Interpreter::run`].
pub trait Chip8Keyboard {
    /// Drain pending input into `keypad`, waiting at most `max_wait` for it.
    fn update_keystates(&mut self, keypad: &mut Keypad, max_wait: Duration) -> io::Result<()>;

    fn quit_requested(&self) -> bool;
}
