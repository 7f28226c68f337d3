use thiserror::Error;

pub type Result<T> = std::result::Result<T, Chip8Error>;

/// Fatal conditions raised by the interpreter. None of them leave the
/// offending instruction half-applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Chip8Error {
    #[error("stack underflow: return with an empty call stack")]
    StackUnderflow,
    #[error("stack overflow: call with a full call stack")]
    StackOverflow,
    #[error("invalid instruction {opcode:04X} at {address:#05X}")]
    InvalidInstruction { opcode: u16, address: u16 },
    #[error("invalid memory address {0:#06X}")]
    InvalidMemoryAddress(u16),
    #[error("program of {size} bytes does not fit in {capacity} bytes of program memory")]
    ProgramTooLarge { size: usize, capacity: usize },
}

/// Why [`crate::Chip8Interpreter::run`] stopped early.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Machine(#[from] Chip8Error),
    #[error("host i/o failed: {0}")]
    Io(#[from] std::io::Error),
}
