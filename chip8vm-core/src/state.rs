use crate::{Chip8Error, FrameBuffer, Keypad, Result};

pub const MEMORY_SIZE: usize = 4096;
pub const REGISTER_COUNT: usize = 16;
pub const STACK_DEPTH: usize = 16;
/// Highest address reachable with a 12-bit operand.
pub const MAX_ADDRESS: u16 = 0xFFF;
pub const PROGRAM_START: u16 = 0x200;
pub const FONT_START: u16 = 0x000;
pub const FONT_SPRITE_SIZE: u16 = 5;
pub const FLAG_REGISTER: u8 = 0xF;

pub const FONT: [u8; 16 * FONT_SPRITE_SIZE as usize] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

const _: () = assert!(FONT_START as usize + FONT.len() <= PROGRAM_START as usize);

/// Complete mutable state of one machine. VF doubles as the carry, borrow
/// and collision flag, so instructions that set a flag clobber it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip8State {
    pub data_registers: [u8; REGISTER_COUNT],
    pub index_register: u16,
    pub program_counter: u16,
    /// Number of return addresses currently on `stack`.
    pub stack_pointer: u8,
    pub ram: [u8; MEMORY_SIZE],
    pub stack: [u16; STACK_DEPTH],
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub keypad: Keypad,
    pub display: FrameBuffer,
    /// Set when the display changed; cleared by the host once presented.
    pub redraw: bool,
}

impl Default for Chip8State {
    fn default() -> Self {
        Self {
            data_registers: [0; REGISTER_COUNT],
            index_register: 0,
            program_counter: PROGRAM_START,
            stack_pointer: 0,
            ram: [0; MEMORY_SIZE],
            stack: [0; STACK_DEPTH],
            delay_timer: 0,
            sound_timer: 0,
            keypad: Keypad::default(),
            display: FrameBuffer::default(),
            redraw: false,
        }
    }
}

impl Chip8State {
    /// A powered-on machine with the font loaded and nothing else in memory.
    pub fn new() -> Self {
        let mut state = Self::default();
        state.reset();
        state
    }

    /// Restore power-on values: zeroed memory and registers, empty stack,
    /// blank display, font glyphs in low memory and PC at the load address.
    pub fn reset(&mut self) {
        *self = Self {
            redraw: true,
            ..Self::default()
        };
        self.load_font_data(&FONT);
    }

    pub fn load_font_data(&mut self, fonts: &[u8]) {
        let start = FONT_START as usize;
        self.ram[start..start + fonts.len()].copy_from_slice(fonts);
    }

    /// Copy a program image verbatim to the load address.
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        let start = PROGRAM_START as usize;
        let capacity = MEMORY_SIZE - start;
        if program.len() > capacity {
            return Err(Chip8Error::ProgramTooLarge {
                size: program.len(),
                capacity,
            });
        }
        self.ram[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    pub fn register(&self, register_index: u8) -> u8 {
        self.data_registers[register_index as usize]
    }

    pub fn register_mut(&mut self, register_index: u8) -> &mut u8 {
        &mut self.data_registers[register_index as usize]
    }

    pub fn set_flag(&mut self, flag: bool) {
        *self.register_mut(FLAG_REGISTER) = flag as u8;
    }

    /// The two instruction bytes at the program counter.
    pub fn fetch(&self) -> Result<[u8; 2]> {
        let bytes = self.memory(self.program_counter, 2)?;
        Ok([bytes[0], bytes[1]])
    }

    /// `len` bytes of memory starting at `address`, all of which must lie
    /// inside the address space.
    pub fn memory(&self, address: u16, len: usize) -> Result<&[u8]> {
        let range = checked_range(address, len)?;
        Ok(&self.ram[range])
    }

    pub fn memory_mut(&mut self, address: u16, len: usize) -> Result<&mut [u8]> {
        let range = checked_range(address, len)?;
        Ok(&mut self.ram[range])
    }

    pub fn set_index_register(&mut self, address: u16) -> Result<()> {
        if address > MAX_ADDRESS {
            return Err(Chip8Error::InvalidMemoryAddress(address));
        }
        self.index_register = address;
        Ok(())
    }

    pub fn push_return_address(&mut self, address: u16) -> Result<()> {
        let depth = self.stack_pointer as usize;
        if depth >= STACK_DEPTH {
            return Err(Chip8Error::StackOverflow);
        }
        self.stack[depth] = address;
        self.stack_pointer += 1;
        Ok(())
    }

    pub fn pop_return_address(&mut self) -> Result<u16> {
        if self.stack_pointer == 0 {
            return Err(Chip8Error::StackUnderflow);
        }
        self.stack_pointer -= 1;
        Ok(self.stack[self.stack_pointer as usize])
    }

    /// Address of the font glyph for the low nibble of `digit`.
    pub fn font_address(digit: u8) -> u16 {
        FONT_START + (digit & 0xF) as u16 * FONT_SPRITE_SIZE
    }
}

fn checked_range(address: u16, len: usize) -> Result<std::ops::Range<usize>> {
    let start = address as usize;
    let end = start + len;
    if end > MEMORY_SIZE {
        let last = (end - 1).min(u16::MAX as usize) as u16;
        return Err(Chip8Error::InvalidMemoryAddress(last));
    }
    Ok(start..end)
}
