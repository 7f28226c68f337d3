use std::{
    collections::HashMap,
    io::{self, stdout, Stdout, Write},
    time::Duration,
};

use chip8vm_core::{Chip8Beeper, Chip8Display, Chip8Keyboard, FrameBuffer, Keypad};
use crossterm::{
    cursor,
    event::{poll, read, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{self, Stylize},
    terminal,
};
use log::*;

/// Left-hand block of a qwerty keyboard laid out like the hex pad:
///
/// ```text
/// 1 2 3 4      1 2 3 C
/// q w e r  ->  4 5 6 D
/// a s d f      7 8 9 E
/// z x c v      A 0 B F
/// ```
const CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x0),
    ('1', 0x1),
    ('2', 0x2),
    ('3', 0x3),
    ('q', 0x4),
    ('w', 0x5),
    ('e', 0x6),
    ('a', 0x7),
    ('s', 0x8),
    ('d', 0x9),
    ('z', 0xA),
    ('c', 0xB),
    ('4', 0xC),
    ('r', 0xD),
    ('f', 0xE),
    ('v', 0xF),
];

/// Owns the terminal session: raw mode and the alternate screen are held
/// for as long as this lives.
pub struct TerminalDisplay {
    stdout: Stdout,
}

impl TerminalDisplay {
    pub fn new() -> io::Result<Self> {
        let mut stdout = stdout();
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            terminal::Clear(terminal::ClearType::All),
            cursor::Hide
        )?;
        Ok(Self { stdout })
    }
}

impl Chip8Display for TerminalDisplay {
    fn present(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        for (y, row) in frame.rows().enumerate() {
            let line: String = row
                .iter()
                .map(|&lit| if lit { "██" } else { "  " })
                .collect();
            queue!(
                self.stdout,
                cursor::MoveTo(0, y as u16),
                style::PrintStyledContent(line.yellow())
            )?;
        }
        self.stdout.flush()
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        if let Err(e) = execute!(self.stdout, cursor::Show, terminal::LeaveAlternateScreen) {
            warn!("Could not leave the alternate screen: {e}");
        }
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("Could not disable raw mode: {e}");
        }
    }
}

/// Reads key presses from the terminal. Each press replaces the latched
/// keys with just that key.
pub struct TerminalKeyboard {
    keymap: HashMap<char, u8>,
    quit: bool,
}

impl TerminalKeyboard {
    pub fn new() -> Self {
        Self {
            keymap: HashMap::from(CONVENTIONAL_KEYMAP),
            quit: false,
        }
    }

    fn handle_key(&mut self, keypad: &mut Keypad, event: KeyEvent) {
        if event.kind == KeyEventKind::Release {
            return;
        }
        match event.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit = true
            }
            KeyCode::Char(c) => match self.keymap.get(&c.to_ascii_lowercase()) {
                Some(&key) => {
                    keypad.clear();
                    keypad.press(key);
                }
                None => debug!("Unmapped key {c:?}"),
            },
            code => debug!("Ignoring key {code:?}"),
        }
    }
}

impl Default for TerminalKeyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Chip8Keyboard for TerminalKeyboard {
    fn update_keystates(&mut self, keypad: &mut Keypad, max_wait: Duration) -> io::Result<()> {
        let mut wait = max_wait;
        while poll(wait)? {
            if let Event::Key(event) = read()? {
                self.handle_key(keypad, event);
            }
            wait = Duration::ZERO;
        }
        Ok(())
    }

    fn quit_requested(&self) -> bool {
        self.quit
    }
}

/// Rings the terminal bell when the sound timer starts.
#[derive(Default)]
pub struct TerminalBeeper {
    playing: bool,
}

impl TerminalBeeper {
    pub fn new() -> Self {
        Self { playing: false }
    }
}

impl Chip8Beeper for TerminalBeeper {
    fn play(&mut self) {
        if self.playing {
            return;
        }
        self.playing = true;
        let mut stdout = stdout();
        if let Err(e) = stdout.write_all(b"\x07").and_then(|_| stdout.flush()) {
            warn!("Could not ring the bell: {e}");
        }
    }

    fn pause(&mut self) {
        self.playing = false;
    }
}
