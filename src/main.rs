use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use fantasy_machine::loader::load_image;
use fantasy_machine::{Cpu, IoConsole};

#[derive(Parser, Debug)]
#[command(name = "fantasy-machine", version, about = "Run a program image on the fantasy machine")]
struct Args {
    /// Program image: raw little-endian 32-bit words, loaded at address 0
    image: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Use RUST_LOG=trace to log every executed instruction
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let program = load_image(&args.image)?;
    let mut cpu = Cpu::new();
    cpu.load_program(&program)
        .with_context(|| format!("cannot load {}", args.image.display()))?;

    info!("Starting execution at pc {}", cpu.pc);
    let mut console = IoConsole::stdio();
    let reason = cpu
        .run(&mut console)
        .with_context(|| format!("{} aborted", args.image.display()))?;

    info!("Halted ({:?}) after {} instructions", reason, cpu.steps);
    Ok(())
}
