use log::debug;
use rand::Rng;

use crate::{Chip8Error, Chip8State, Instruction, Result, MAX_ADDRESS};

/// What happens to the program counter once an instruction has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramFlow {
    /// Advance to the next instruction.
    Next,
    /// Skip the next instruction.
    Skip,
    /// Continue at the given address.
    Jump(u16),
    /// Stay on this instruction and retry it next step.
    Wait,
}

impl ProgramFlow {
    fn skip_if(condition: bool) -> Self {
        if condition {
            Self::Skip
        } else {
            Self::Next
        }
    }
}

/// Apply one decoded instruction to `state`. Failures are detected before
/// anything is written.
pub fn execute<R: Rng>(
    state: &mut Chip8State,
    instruction: Instruction,
    rng: &mut R,
) -> Result<ProgramFlow> {
    use Instruction::*;

    let flow = match instruction {
        ClearDisplay => {
            state.display.clear();
            state.redraw = true;
            ProgramFlow::Next
        }
        Return => ProgramFlow::Jump(state.pop_return_address()?),
        Jump(address) => ProgramFlow::Jump(address),
        Call(address) => {
            state.push_return_address(state.program_counter + 2)?;
            ProgramFlow::Jump(address)
        }
        SkipIfEqual { x, value } => ProgramFlow::skip_if(state.register(x) == value),
        SkipIfNotEqual { x, value } => ProgramFlow::skip_if(state.register(x) != value),
        SkipIfRegistersEqual { x, y } => {
            ProgramFlow::skip_if(state.register(x) == state.register(y))
        }
        SkipIfRegistersNotEqual { x, y } => {
            ProgramFlow::skip_if(state.register(x) != state.register(y))
        }
        LoadImmediate { x, value } => {
            *state.register_mut(x) = value;
            ProgramFlow::Next
        }
        AddImmediate { x, value } => {
            *state.register_mut(x) = state.register(x).wrapping_add(value);
            ProgramFlow::Next
        }
        Copy { x, y } => {
            *state.register_mut(x) = state.register(y);
            ProgramFlow::Next
        }
        Or { x, y } => {
            *state.register_mut(x) |= state.register(y);
            ProgramFlow::Next
        }
        And { x, y } => {
            *state.register_mut(x) &= state.register(y);
            ProgramFlow::Next
        }
        Xor { x, y } => {
            *state.register_mut(x) ^= state.register(y);
            ProgramFlow::Next
        }
        Add { x, y } => {
            let (result, carry) = state.register(x).overflowing_add(state.register(y));
            *state.register_mut(x) = result;
            state.set_flag(carry);
            ProgramFlow::Next
        }
        Sub { x, y } => {
            let (vx, vy) = (state.register(x), state.register(y));
            *state.register_mut(x) = vx.wrapping_sub(vy);
            state.set_flag(vx >= vy);
            ProgramFlow::Next
        }
        ShiftRight { x } => {
            let value = state.register(x);
            *state.register_mut(x) = value >> 1;
            state.set_flag(value & 0x1 == 1);
            ProgramFlow::Next
        }
        SubN { x, y } => {
            let (vx, vy) = (state.register(x), state.register(y));
            *state.register_mut(x) = vy.wrapping_sub(vx);
            state.set_flag(vy >= vx);
            ProgramFlow::Next
        }
        ShiftLeft { x } => {
            let value = state.register(x);
            *state.register_mut(x) = value << 1;
            // strictly greater: 0x80 itself leaves the flag clear
            state.set_flag(value > 0x80);
            ProgramFlow::Next
        }
        SetIndex(address) => {
            state.set_index_register(address)?;
            ProgramFlow::Next
        }
        JumpWithOffset(address) => {
            let target = address + state.register(0x0) as u16;
            if target > MAX_ADDRESS {
                return Err(Chip8Error::InvalidMemoryAddress(target));
            }
            ProgramFlow::Jump(target)
        }
        Random { x, mask } => {
            *state.register_mut(x) = rng.gen::<u8>() & mask;
            ProgramFlow::Next
        }
        Draw { x, y, height } => {
            let height = height as usize;
            let mut rows = [0u8; 15];
            rows[..height].copy_from_slice(state.memory(state.index_register, height)?);
            let (vx, vy) = (state.register(x), state.register(y));
            let collision = state.display.draw_sprite(vx, vy, &rows[..height]);
            state.set_flag(collision);
            state.redraw = true;
            ProgramFlow::Next
        }
        // the key tested is the register number itself, not the value held in it
        SkipIfKey { x } => {
            let pressed = state.keypad.is_pressed(x);
            state.keypad.clear();
            ProgramFlow::skip_if(pressed)
        }
        SkipIfNotKey { x } => {
            let pressed = state.keypad.is_pressed(x);
            state.keypad.clear();
            ProgramFlow::skip_if(!pressed)
        }
        LoadDelayTimer { x } => {
            *state.register_mut(x) = state.delay_timer;
            ProgramFlow::Next
        }
        WaitForKey { x } => {
            let key = state.keypad.first_pressed();
            state.keypad.clear();
            match key {
                Some(key) => {
                    *state.register_mut(x) = key;
                    ProgramFlow::Next
                }
                None => ProgramFlow::Wait,
            }
        }
        SetDelayTimer { x } => {
            state.delay_timer = state.register(x);
            ProgramFlow::Next
        }
        SetSoundTimer { x } => {
            state.sound_timer = state.register(x);
            ProgramFlow::Next
        }
        AddToIndex { x } => {
            state.set_index_register(state.index_register + state.register(x) as u16)?;
            ProgramFlow::Next
        }
        LoadFontGlyph { x } => {
            state.index_register = Chip8State::font_address(state.register(x));
            ProgramFlow::Next
        }
        StoreBcd { x } => {
            let value = state.register(x);
            let digits = state.memory_mut(state.index_register, 3)?;
            digits[0] = value / 100;
            digits[1] = value / 10 % 10;
            digits[2] = value % 10;
            ProgramFlow::Next
        }
        StoreRegisters { x } => {
            let count = x as usize + 1;
            let registers = state.data_registers;
            state
                .memory_mut(state.index_register, count)?
                .copy_from_slice(&registers[..count]);
            ProgramFlow::Next
        }
        LoadRegisters { x } => {
            let count = x as usize + 1;
            let mut values = [0u8; 16];
            values[..count].copy_from_slice(state.memory(state.index_register, count)?);
            state.data_registers[..count].copy_from_slice(&values[..count]);
            ProgramFlow::Next
        }
        Ignored(word) => {
            debug!("Ignoring unassigned instruction {word:04X}");
            ProgramFlow::Next
        }
    };
    Ok(flow)
}
