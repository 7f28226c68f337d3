/// Tone output for [`crate::Chip8Interpreter::run`]. The interpreter calls
/// `play` while the sound timer is non-zero and `pause` otherwise.
pub trait Chip8Beeper {
    fn play(&mut self);
    fn pause(&mut self);
}
