use std::time::{Duration, Instant};

use log::{debug, trace};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    execute, Chip8Beeper, Chip8Display, Chip8Error, Chip8Keyboard, Chip8State, Fields,
    FrameBuffer, Instruction, Keypad, ProgramFlow, Result, RunError, Timer, MAX_ADDRESS,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip8Config {
    /// Instructions executed per second.
    pub cpu_hz: u32,
    /// Delay and sound timer decrements per second.
    pub timer_hz: u32,
    /// Fixed seed for the random instruction; entropy when unset.
    pub rng_seed: Option<u64>,
}

impl Default for Chip8Config {
    fn default() -> Self {
        Self {
            cpu_hz: 500,
            timer_hz: 60,
            rng_seed: None,
        }
    }
}

/// Drives one machine: steps the CPU on its own clock and counts the delay
/// and sound timers down on theirs.
pub struct Chip8Interpreter {
    state: Chip8State,
    rng: StdRng,
    cpu_clock: Timer,
    delay_clock: Timer,
    sound_clock: Timer,
    waiting_for_key: bool,
}

impl Chip8Interpreter {
    pub fn new(config: Chip8Config) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state: Chip8State::new(),
            rng,
            cpu_clock: Timer::from_hz(config.cpu_hz),
            delay_clock: Timer::from_hz(config.timer_hz),
            sound_clock: Timer::from_hz(config.timer_hz),
            waiting_for_key: false,
        }
    }

    pub fn reset(&mut self) {
        debug!("Resetting machine");
        self.state.reset();
        self.cpu_clock.reset();
        self.delay_clock.reset();
        self.sound_clock.reset();
        self.waiting_for_key = false;
    }

    /// Reset the machine and copy `program` to the load address.
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        self.reset();
        self.state.load_program(program)?;
        debug!("Loaded {} byte program", program.len());
        Ok(())
    }

    /// Run exactly one fetch-decode-execute cycle. A cycle that would move
    /// the program counter past the end of memory fails and leaves it on
    /// the instruction that ran.
    pub fn step(&mut self) -> Result<()> {
        let address = self.state.program_counter;
        let fields = Fields::decode(self.state.fetch()?);
        let instruction = Instruction::decode(fields).ok_or(Chip8Error::InvalidInstruction {
            opcode: fields.word(),
            address,
        })?;
        trace!("{address:03X}: {:04X}  {instruction}", fields.word());

        let flow = execute(&mut self.state, instruction, &mut self.rng)?;
        let next = match flow {
            ProgramFlow::Next => address + 2,
            ProgramFlow::Skip => address + 4,
            ProgramFlow::Jump(target) => target,
            ProgramFlow::Wait => address,
        };
        if next > MAX_ADDRESS {
            return Err(Chip8Error::InvalidMemoryAddress(next));
        }
        self.state.program_counter = next;

        let waiting = flow == ProgramFlow::Wait;
        if waiting && !self.waiting_for_key {
            debug!("Waiting for a key press at {address:03X}");
        }
        self.waiting_for_key = waiting;
        Ok(())
    }

    /// Count both timers down by one, stopping at zero.
    pub fn tick_timers(&mut self) {
        self.state.delay_timer = self.state.delay_timer.saturating_sub(1);
        self.state.sound_timer = self.state.sound_timer.saturating_sub(1);
    }

    /// Feed `elapsed` host time to every clock, count down whichever timers
    /// are due and run at most one instruction. Returns whether one ran.
    pub fn update(&mut self, elapsed: Duration) -> Result<bool> {
        count_down(&mut self.delay_clock, &mut self.state.delay_timer, elapsed);
        count_down(&mut self.sound_clock, &mut self.state.sound_timer, elapsed);

        self.cpu_clock.advance(elapsed);
        if self.cpu_clock.tick() {
            self.step()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn state(&self) -> &Chip8State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut Chip8State {
        &mut self.state
    }

    pub fn display(&self) -> &FrameBuffer {
        &self.state.display
    }

    pub fn keypad_mut(&mut self) -> &mut Keypad {
        &mut self.state.keypad
    }

    pub fn sound_active(&self) -> bool {
        self.state.sound_timer > 0
    }

    pub fn is_waiting_for_key(&self) -> bool {
        self.waiting_for_key
    }

    /// Whether the display changed since the last call.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.state.redraw)
    }

    /// Cooperative host loop: drain input, advance the clocks, present
    /// changed frames and gate the beeper on the sound timer. Returns when
    /// the keyboard asks to quit or the machine faults.
    pub fn run<D: Chip8Display, K: Chip8Keyboard, B: Chip8Beeper>(
        &mut self,
        display: &mut D,
        keyboard: &mut K,
        beeper: &mut B,
    ) -> std::result::Result<(), RunError> {
        let mut last_update = Instant::now();
        let mut beeping = false;

        loop {
            keyboard.update_keystates(&mut self.state.keypad, self.cpu_clock.interval())?;
            if keyboard.quit_requested() {
                debug!("Quit requested");
                beeper.pause();
                return Ok(());
            }

            let now = Instant::now();
            self.update(now - last_update)?;
            last_update = now;

            if self.take_redraw() {
                display.present(&self.state.display)?;
            }

            match (self.sound_active(), beeping) {
                (true, false) => beeper.play(),
                (false, true) => beeper.pause(),
                _ => {}
            }
            beeping = self.sound_active();
        }
    }
}

/// Timer clocks only run while their counter is non-zero, so a freshly set
/// counter waits one full interval before it first decrements.
fn count_down(clock: &mut Timer, counter: &mut u8, elapsed: Duration) {
    if *counter == 0 {
        clock.reset();
        return;
    }
    clock.advance(elapsed);
    if clock.tick() {
        *counter -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PROGRAM_START;

    fn interpreter(program: &[u8]) -> Chip8Interpreter {
        let mut interpreter = Chip8Interpreter::new(Chip8Config {
            rng_seed: Some(1),
            ..Chip8Config::default()
        });
        interpreter.load_program(program).unwrap();
        interpreter
    }

    #[test]
    fn test_load_and_add() {
        let mut i = interpreter(&[0x6A, 0x02, 0x7A, 0x03]);
        i.step().unwrap();
        i.step().unwrap();
        assert_eq!(i.state().register(0xA), 5);
        assert_eq!(i.state().program_counter, PROGRAM_START + 4);
    }

    #[test]
    fn test_skip_advances_four_bytes() {
        let mut i = interpreter(&[0x30, 0x00, 0x00, 0x00, 0x61, 0x01]);
        i.step().unwrap();
        assert_eq!(i.state().program_counter, PROGRAM_START + 4);
        i.step().unwrap();
        assert_eq!(i.state().register(1), 1);
    }

    #[test]
    fn test_wait_for_key_holds_pc() {
        let mut i = interpreter(&[0xF5, 0x0A]);
        i.step().unwrap();
        i.step().unwrap();
        assert_eq!(i.state().program_counter, PROGRAM_START);
        assert!(i.is_waiting_for_key());
        i.keypad_mut().press(0x7);
        i.step().unwrap();
        assert_eq!(i.state().register(5), 0x7);
        assert_eq!(i.state().program_counter, PROGRAM_START + 2);
        assert!(!i.is_waiting_for_key());
    }

    #[test]
    fn test_unassigned_words_fall_through() {
        let mut i = interpreter(&[0x00, 0x00, 0x81, 0x2F, 0x61, 0x07]);
        i.step().unwrap();
        assert_eq!(i.state().program_counter, PROGRAM_START + 2);
        i.step().unwrap();
        assert_eq!(i.state().program_counter, PROGRAM_START + 4);
        i.step().unwrap();
        assert_eq!(i.state().register(1), 7);
    }

    #[test]
    fn test_key_skip_tests_register_number() {
        // SKP V3 with V3 = 0 and key 3 latched
        let mut i = interpreter(&[0xE3, 0x9E]);
        i.keypad_mut().press(0x3);
        i.step().unwrap();
        assert_eq!(i.state().program_counter, PROGRAM_START + 4);
    }

    #[test]
    fn test_pc_never_leaves_memory() {
        let mut i = interpreter(&[]);
        i.state_mut().ram[0xFFE..].copy_from_slice(&[0x00, 0xE0]);
        i.state_mut().program_counter = 0xFFE;
        assert_eq!(i.step(), Err(Chip8Error::InvalidMemoryAddress(0x1000)));
        assert_eq!(i.state().program_counter, 0xFFE);

        // SE V0, 0 taken at the last word
        i.state_mut().ram[0xFFE..].copy_from_slice(&[0x30, 0x00]);
        assert_eq!(i.step(), Err(Chip8Error::InvalidMemoryAddress(0x1002)));
        assert_eq!(i.state().program_counter, 0xFFE);
    }

    #[test]
    fn test_failed_call_leaves_pc() {
        // 0x200: CALL 0x200, recursing until the stack is full
        let mut i = interpreter(&[0x22, 0x00]);
        for _ in 0..16 {
            i.step().unwrap();
        }
        assert_eq!(i.step(), Err(Chip8Error::StackOverflow));
        assert_eq!(i.state().program_counter, PROGRAM_START);
        assert_eq!(i.state().stack_pointer, 16);
    }

    #[test]
    fn test_update_runs_one_instruction_per_cpu_interval() {
        let mut i = interpreter(&[0x70, 0x01, 0x12, 0x00]);
        assert!(!i.update(Duration::from_millis(1)).unwrap());
        assert!(i.update(Duration::from_millis(1)).unwrap());
        assert_eq!(i.state().register(0), 1);
        // a long stall still runs only one instruction per call
        assert!(i.update(Duration::from_secs(1)).unwrap());
        assert_eq!(i.state().program_counter, PROGRAM_START);
    }

    #[test]
    fn test_timers_count_down_independently() {
        // V0 = 2; DT = V0; V1 = 1; ST = V1; loop
        let mut i = interpreter(&[0x60, 0x02, 0xF0, 0x15, 0x61, 0x01, 0xF1, 0x18, 0x12, 0x08]);
        for _ in 0..4 {
            i.step().unwrap();
        }
        assert_eq!(i.state().delay_timer, 2);
        assert!(i.sound_active());

        let frame = Duration::from_secs(1) / 60;
        i.update(frame).unwrap();
        assert_eq!(i.state().delay_timer, 1);
        assert!(!i.sound_active());
        i.update(frame).unwrap();
        assert_eq!(i.state().delay_timer, 0);
        i.update(frame).unwrap();
        assert_eq!(i.state().delay_timer, 0);
    }

    #[test]
    fn test_fresh_timer_waits_a_full_interval() {
        let mut i = interpreter(&[0x12, 0x00]);
        let half = Duration::from_secs(1) / 120;
        i.update(Duration::from_secs(3)).unwrap();
        i.state_mut().delay_timer = 3;
        i.update(half).unwrap();
        assert_eq!(i.state().delay_timer, 3);
        i.update(half).unwrap();
        assert_eq!(i.state().delay_timer, 2);
    }

    #[test]
    fn test_tick_timers_stops_at_zero() {
        let mut i = interpreter(&[]);
        i.state_mut().delay_timer = 1;
        i.tick_timers();
        i.tick_timers();
        assert_eq!(i.state().delay_timer, 0);
        assert_eq!(i.state().sound_timer, 0);
    }

    #[test]
    fn test_take_redraw() {
        let mut i = interpreter(&[0x00, 0xE0]);
        assert!(i.take_redraw());
        assert!(!i.take_redraw());
        i.step().unwrap();
        assert!(i.take_redraw());
    }

    struct Recorder {
        frames: usize,
    }

    impl Chip8Display for Recorder {
        fn present(&mut self, _frame: &FrameBuffer) -> std::io::Result<()> {
            self.frames += 1;
            Ok(())
        }
    }

    struct QuitAfter(usize);

    impl Chip8Keyboard for QuitAfter {
        fn update_keystates(&mut self, _keypad: &mut Keypad, _max_wait: Duration) -> std::io::Result<()> {
            self.0 = self.0.saturating_sub(1);
            Ok(())
        }

        fn quit_requested(&self) -> bool {
            self.0 == 0
        }
    }

    struct Silent;

    impl Chip8Beeper for Silent {
        fn play(&mut self) {}
        fn pause(&mut self) {}
    }

    #[derive(Default)]
    struct BeepLog(Vec<&'static str>);

    impl Chip8Beeper for BeepLog {
        fn play(&mut self) {
            self.0.push("play");
        }

        fn pause(&mut self) {
            self.0.push("pause");
        }
    }

    /// Blocks for the whole poll window like a terminal with no input,
    /// then quits after `polls` polls.
    struct IdleFor {
        polls: usize,
    }

    impl Chip8Keyboard for IdleFor {
        fn update_keystates(&mut self, _keypad: &mut Keypad, max_wait: Duration) -> std::io::Result<()> {
            std::thread::sleep(max_wait);
            self.polls = self.polls.saturating_sub(1);
            Ok(())
        }

        fn quit_requested(&self) -> bool {
            self.polls == 0
        }
    }

    #[test]
    fn test_run_stops_on_quit() {
        let mut i = interpreter(&[0x12, 0x00]);
        let mut display = Recorder { frames: 0 };
        i.run(&mut display, &mut QuitAfter(3), &mut Silent).unwrap();
        assert_eq!(display.frames, 1);
    }

    #[test]
    fn test_run_drives_beeper_from_sound_timer() {
        // V1 = 3; ST = V1; loop
        let mut i = Chip8Interpreter::new(Chip8Config {
            cpu_hz: 1000,
            timer_hz: 1000,
            rng_seed: Some(1),
        });
        i.load_program(&[0x61, 0x03, 0xF1, 0x18, 0x12, 0x04]).unwrap();
        let mut display = Recorder { frames: 0 };
        let mut beeper = BeepLog::default();
        // every poll lasts at least one interval, so each pass runs one
        // instruction and one timer decrement: ST is set on pass 2 and
        // reaches zero on pass 5
        i.run(&mut display, &mut IdleFor { polls: 10 }, &mut beeper).unwrap();
        assert_eq!(beeper.0, ["play", "pause", "pause"]);
        assert_eq!(i.state().sound_timer, 0);
        assert_eq!(i.state().register(1), 3);
    }

    #[test]
    fn test_run_surfaces_machine_faults() {
        let mut i = interpreter(&[0x00, 0xEE]);
        let mut display = Recorder { frames: 0 };
        let mut keyboard = QuitAfter(usize::MAX);
        let error = i.run(&mut display, &mut keyboard, &mut Silent).unwrap_err();
        assert!(matches!(error, RunError::Machine(Chip8Error::StackUnderflow)));
    }
}
