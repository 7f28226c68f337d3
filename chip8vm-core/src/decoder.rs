use std::fmt;

/// Raw operand fields of a two-byte instruction word. Every word has a
/// field set, whether or not an instruction matches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fields {
    /// High nibble of the first byte.
    pub kind: u8,
    /// Low nibble of the first byte; usually a register index.
    pub x: u8,
    /// High nibble of the second byte; usually a register index.
    pub y: u8,
    /// Low nibble of the second byte.
    pub n: u8,
    /// The whole second byte.
    pub byte: u8,
    /// The low 12 bits of the word.
    pub address: u16,
}

impl Fields {
    pub fn decode([byte_a, byte_b]: [u8; 2]) -> Self {
        let x = byte_a & 0x0F;
        Self {
            kind: (byte_a & 0xF0) >> 4,
            x,
            y: (byte_b & 0xF0) >> 4,
            n: byte_b & 0x0F,
            byte: byte_b,
            address: ((x as u16) << 8) | byte_b as u16,
        }
    }

    pub fn word(&self) -> u16 {
        ((self.kind as u16) << 12) | self.address
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    ClearDisplay,
    Return,
    Jump(u16),
    Call(u16),
    SkipIfEqual { x: u8, value: u8 },
    SkipIfNotEqual { x: u8, value: u8 },
    SkipIfRegistersEqual { x: u8, y: u8 },
    SkipIfRegistersNotEqual { x: u8, y: u8 },
    LoadImmediate { x: u8, value: u8 },
    AddImmediate { x: u8, value: u8 },
    Copy { x: u8, y: u8 },
    Or { x: u8, y: u8 },
    And { x: u8, y: u8 },
    Xor { x: u8, y: u8 },
    Add { x: u8, y: u8 },
    Sub { x: u8, y: u8 },
    ShiftRight { x: u8 },
    SubN { x: u8, y: u8 },
    ShiftLeft { x: u8 },
    SetIndex(u16),
    JumpWithOffset(u16),
    Random { x: u8, mask: u8 },
    Draw { x: u8, y: u8, height: u8 },
    SkipIfKey { x: u8 },
    SkipIfNotKey { x: u8 },
    LoadDelayTimer { x: u8 },
    WaitForKey { x: u8 },
    SetDelayTimer { x: u8 },
    SetSoundTimer { x: u8 },
    AddToIndex { x: u8 },
    LoadFontGlyph { x: u8 },
    StoreBcd { x: u8 },
    StoreRegisters { x: u8 },
    LoadRegisters { x: u8 },
    /// A word in a known group that names no operation. Runs as a no-op.
    Ignored(u16),
}

impl Instruction {
    /// Match a field set against the instruction table. Groups 0, E and F
    /// dispatch on the whole second byte, group 8 on the trailing nibble,
    /// and groups 5 and 9 ignore the trailing nibble. Unmatched words in
    /// those groups decode to [`Instruction::Ignored`]; only a primary
    /// nibble outside the table yields `None`.
    pub fn decode(fields: Fields) -> Option<Self> {
        let Fields {
            kind,
            x,
            y,
            n,
            byte,
            address,
        } = fields;

        let instruction = match [kind, x, y, n] {
            [0x0, _, 0xE, 0x0] => Self::ClearDisplay,
            [0x0, _, 0xE, 0xE] => Self::Return,
            [0x1, _, _, _] => Self::Jump(address),
            [0x2, _, _, _] => Self::Call(address),
            [0x3, _, _, _] => Self::SkipIfEqual { x, value: byte },
            [0x4, _, _, _] => Self::SkipIfNotEqual { x, value: byte },
            [0x5, _, _, _] => Self::SkipIfRegistersEqual { x, y },
            [0x6, _, _, _] => Self::LoadImmediate { x, value: byte },
            [0x7, _, _, _] => Self::AddImmediate { x, value: byte },
            [0x8, _, _, 0x0] => Self::Copy { x, y },
            [0x8, _, _, 0x1] => Self::Or { x, y },
            [0x8, _, _, 0x2] => Self::And { x, y },
            [0x8, _, _, 0x3] => Self::Xor { x, y },
            [0x8, _, _, 0x4] => Self::Add { x, y },
            [0x8, _, _, 0x5] => Self::Sub { x, y },
            [0x8, _, _, 0x6] => Self::ShiftRight { x },
            [0x8, _, _, 0x7] => Self::SubN { x, y },
            [0x8, _, _, 0xE] => Self::ShiftLeft { x },
            [0x9, _, _, _] => Self::SkipIfRegistersNotEqual { x, y },
            [0xA, _, _, _] => Self::SetIndex(address),
            [0xB, _, _, _] => Self::JumpWithOffset(address),
            [0xC, _, _, _] => Self::Random { x, mask: byte },
            [0xD, _, _, _] => Self::Draw { x, y, height: n },
            [0xE, _, 0x9, 0xE] => Self::SkipIfKey { x },
            [0xE, _, 0xA, 0x1] => Self::SkipIfNotKey { x },
            [0xF, _, 0x0, 0x7] => Self::LoadDelayTimer { x },
            [0xF, _, 0x0, 0xA] => Self::WaitForKey { x },
            [0xF, _, 0x1, 0x5] => Self::SetDelayTimer { x },
            [0xF, _, 0x1, 0x8] => Self::SetSoundTimer { x },
            [0xF, _, 0x1, 0xE] => Self::AddToIndex { x },
            [0xF, _, 0x2, 0x9] => Self::LoadFontGlyph { x },
            [0xF, _, 0x3, 0x3] => Self::StoreBcd { x },
            [0xF, _, 0x5, 0x5] => Self::StoreRegisters { x },
            [0xF, _, 0x6, 0x5] => Self::LoadRegisters { x },
            [0x0 | 0x8 | 0xE | 0xF, _, _, _] => Self::Ignored(fields.word()),
            _ => return None,
        };
        Some(instruction)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            ClearDisplay => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump(address) => write!(f, "JP {address:03X}"),
            Call(address) => write!(f, "CALL {address:03X}"),
            SkipIfEqual { x, value } => write!(f, "SE V{x:X}, {value:02X}"),
            SkipIfNotEqual { x, value } => write!(f, "SNE V{x:X}, {value:02X}"),
            SkipIfRegistersEqual { x, y } => write!(f, "SE V{x:X}, V{y:X}"),
            SkipIfRegistersNotEqual { x, y } => write!(f, "SNE V{x:X}, V{y:X}"),
            LoadImmediate { x, value } => write!(f, "LD V{x:X}, {value:02X}"),
            AddImmediate { x, value } => write!(f, "ADD V{x:X}, {value:02X}"),
            Copy { x, y } => write!(f, "LD V{x:X}, V{y:X}"),
            Or { x, y } => write!(f, "OR V{x:X}, V{y:X}"),
            And { x, y } => write!(f, "AND V{x:X}, V{y:X}"),
            Xor { x, y } => write!(f, "XOR V{x:X}, V{y:X}"),
            Add { x, y } => write!(f, "ADD V{x:X}, V{y:X}"),
            Sub { x, y } => write!(f, "SUB V{x:X}, V{y:X}"),
            ShiftRight { x } => write!(f, "SHR V{x:X}"),
            SubN { x, y } => write!(f, "SUBN V{x:X}, V{y:X}"),
            ShiftLeft { x } => write!(f, "SHL V{x:X}"),
            SetIndex(address) => write!(f, "LD I, {address:03X}"),
            JumpWithOffset(address) => write!(f, "JP V0, {address:03X}"),
            Random { x, mask } => write!(f, "RND V{x:X}, {mask:02X}"),
            Draw { x, y, height } => write!(f, "DRW V{x:X}, V{y:X}, {height:X}"),
            SkipIfKey { x } => write!(f, "SKP V{x:X}"),
            SkipIfNotKey { x } => write!(f, "SKNP V{x:X}"),
            LoadDelayTimer { x } => write!(f, "LD V{x:X}, DT"),
            WaitForKey { x } => write!(f, "LD V{x:X}, K"),
            SetDelayTimer { x } => write!(f, "LD DT, V{x:X}"),
            SetSoundTimer { x } => write!(f, "LD ST, V{x:X}"),
            AddToIndex { x } => write!(f, "ADD I, V{x:X}"),
            LoadFontGlyph { x } => write!(f, "LD F, V{x:X}"),
            StoreBcd { x } => write!(f, "LD B, V{x:X}"),
            StoreRegisters { x } => write!(f, "LD [I], V{x:X}"),
            LoadRegisters { x } => write!(f, "LD V{x:X}, [I]"),
            Ignored(word) => write!(f, "DW {word:04X}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_extraction() {
        let fields = Fields::decode([0xD1, 0x2F]);
        assert_eq!(fields.kind, 0xD);
        assert_eq!(fields.x, 0x1);
        assert_eq!(fields.y, 0x2);
        assert_eq!(fields.n, 0xF);
        assert_eq!(fields.byte, 0x2F);
        assert_eq!(fields.address, 0x12F);
        assert_eq!(fields.word(), 0xD12F);
    }

    #[test]
    fn test_decode_groups() {
        let decode = |a, b| Instruction::decode(Fields::decode([a, b]));
        assert_eq!(decode(0x00, 0xE0), Some(Instruction::ClearDisplay));
        assert_eq!(decode(0x00, 0xEE), Some(Instruction::Return));
        assert_eq!(decode(0x2A, 0xBC), Some(Instruction::Call(0xABC)));
        assert_eq!(decode(0x8A, 0xB4), Some(Instruction::Add { x: 0xA, y: 0xB }));
        assert_eq!(decode(0x83, 0x0E), Some(Instruction::ShiftLeft { x: 3 }));
        assert_eq!(decode(0x53, 0x47), Some(Instruction::SkipIfRegistersEqual { x: 3, y: 4 }));
        assert_eq!(decode(0xE5, 0xA1), Some(Instruction::SkipIfNotKey { x: 5 }));
        assert_eq!(decode(0xF7, 0x65), Some(Instruction::LoadRegisters { x: 7 }));
    }

    #[test]
    fn test_unmatched_words_are_ignored() {
        let decode = |a, b| Instruction::decode(Fields::decode([a, b]));
        assert_eq!(decode(0x00, 0x00), Some(Instruction::Ignored(0x0000)));
        assert_eq!(decode(0x01, 0x23), Some(Instruction::Ignored(0x0123)));
        assert_eq!(decode(0x81, 0x28), Some(Instruction::Ignored(0x8128)));
        assert_eq!(decode(0xE1, 0x00), Some(Instruction::Ignored(0xE100)));
        assert_eq!(decode(0xF1, 0xFF), Some(Instruction::Ignored(0xF1FF)));
    }

    #[test]
    fn test_primary_nibble_outside_table() {
        let fields = Fields {
            kind: 0x10,
            ..Fields::decode([0x00, 0x00])
        };
        assert_eq!(Instruction::decode(fields), None);
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(Instruction::Draw { x: 1, y: 2, height: 5 }.to_string(), "DRW V1, V2, 5");
        assert_eq!(Instruction::SetIndex(0x2F0).to_string(), "LD I, 2F0");
        assert_eq!(Instruction::Ignored(0x0123).to_string(), "DW 0123");
    }
}
