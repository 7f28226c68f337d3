//! Interpreter engine for the CHIP-8 virtual machine: machine state,
//! instruction decoding and execution, and the dual-clock scheduler that
//! drives them.

mod beeper;
mod decoder;
mod display;
mod error;
mod executor;
mod interpreter;
mod keyboard;
mod state;
mod timer;

pub use beeper::Chip8Beeper;
pub use decoder::{Fields, Instruction};
pub use display::{Chip8Display, FrameBuffer, DISPLAY_HEIGHT, DISPLAY_WIDTH};
pub use error::{Chip8Error, Result, RunError};
pub use executor::{execute, ProgramFlow};
pub use interpreter::{Chip8Config, Chip8Interpreter};
pub use keyboard::{Chip8Keyboard, Keypad, KEY_COUNT};
pub use state::{
    Chip8State, FLAG_REGISTER, FONT, FONT_SPRITE_SIZE, FONT_START, MAX_ADDRESS, MEMORY_SIZE,
    PROGRAM_START, REGISTER_COUNT, STACK_DEPTH,
};
pub use timer::Timer;
