use std::io;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// Monochrome 64x32 pixel grid. Sprites are XOR-composited onto it and
/// wrap around both edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: [bool; DISPLAY_WIDTH * DISPLAY_HEIGHT],
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self {
            pixels: [false; DISPLAY_WIDTH * DISPLAY_HEIGHT],
        }
    }
}

impl FrameBuffer {
    pub fn clear(&mut self) {
        self.pixels = [false; DISPLAY_WIDTH * DISPLAY_HEIGHT];
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[(y % DISPLAY_HEIGHT) * DISPLAY_WIDTH + x % DISPLAY_WIDTH]
    }

    /// XOR an 8-pixel-wide sprite onto the grid with its top-left corner at
    /// `(x, y)`. Returns whether any lit pixel was drawn over.
    pub fn draw_sprite(&mut self, x: u8, y: u8, rows: &[u8]) -> bool {
        let mut collision = false;
        for (i, &row) in rows.iter().enumerate() {
            let py = (y as usize + i) % DISPLAY_HEIGHT;
            for j in 0..8 {
                let bit = (row >> (7 - j)) & 0x1 == 1;
                let px = (x as usize + j) % DISPLAY_WIDTH;
                let pixel = &mut self.pixels[py * DISPLAY_WIDTH + px];
                collision |= *pixel && bit;
                *pixel ^= bit;
            }
        }
        collision
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.pixels.chunks(DISPLAY_WIDTH)
    }

    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().filter(|&&on| on).count()
    }
}

/// Presentation surface for [`crate::Chip8Interpreter::run`].
pub trait Chip8Display {
    fn present(&mut self, frame: &FrameBuffer) -> io::Result<()>;
}
