use std::{fs, path::PathBuf};

use anyhow::Context;
use chip8vm_core::{Chip8Config, Chip8Interpreter};
use clap::Parser;
use log::*;

mod terminal;
use terminal::{TerminalBeeper, TerminalDisplay, TerminalKeyboard};

#[derive(Parser, Debug)]
#[command(name = "chip8vm", about = "Run a CHIP-8 program in the terminal")]
struct Args {
    /// Program image, loaded verbatim at 0x200
    program: PathBuf,

    /// CPU clock in instructions per second
    #[arg(long, default_value_t = 500)]
    clock_speed: u32,

    /// Seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,

    /// -v for debug output, -vv to trace every instruction
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    builder.init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let program = fs::read(&args.program)
        .with_context(|| format!("could not read {}", args.program.display()))?;

    let mut interpreter = Chip8Interpreter::new(Chip8Config {
        cpu_hz: args.clock_speed,
        rng_seed: args.seed,
        ..Chip8Config::default()
    });
    interpreter
        .load_program(&program)
        .with_context(|| format!("could not load {}", args.program.display()))?;
    info!(
        "Running {} ({} bytes) at {} Hz",
        args.program.display(),
        program.len(),
        args.clock_speed
    );

    // the terminal must be restored before anything is reported
    let result = {
        let mut display = TerminalDisplay::new().context("could not set up the terminal")?;
        let mut keyboard = TerminalKeyboard::new();
        let mut beeper = TerminalBeeper::new();
        interpreter.run(&mut display, &mut keyboard, &mut beeper)
    };

    if let Err(e) = result {
        error!("{e}");
        let state = interpreter.state();
        debug!(
            "PC:{:03X} I:{:03X} SP:{} V:{:02X?}",
            state.program_counter, state.index_register, state.stack_pointer, state.data_registers
        );
        return Err(e.into());
    }
    Ok(())
}
