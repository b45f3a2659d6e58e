//! Entrypoint for CLI
use std::{env, error::Error, io, time::Instant};

use chip8::{prelude::*, IMPL_VERSION};
use log::info;

mod config;
mod error;
mod terminal;
mod theme;

use self::{config::AppConf, error::AppResult, terminal::Terminal};

static USAGE: &str = r#"
usage: chip8 CMD FILE

commands:
    run     Run the target ROM file
    dis     Disassemble the target ROM into readable assembly

configuration:
    Read from the file named by CHIP8_CONFIG, or chip8.yaml
    in the working directory.

examples:
    chip8 run breakout.rom
    chip8 dis breakout.rom
"#;

fn run_rom(filepath: impl AsRef<str>) -> AppResult<()> {
    let conf = AppConf::load()?;
    let rom = Rom::from_file(filepath.as_ref())?;

    let mut vm = Chip8Vm::new(conf.vm.clone());
    vm.load_rom(&rom);

    let stdout = io::stdout();
    let mut terminal = Terminal::new(stdout.lock(), &conf);

    let start = Instant::now();
    let result = vm.run(&mut terminal);
    let end = Instant::now();

    info!(
        "ran {} cycles in {}ms",
        terminal.cycles(),
        end.duration_since(start).as_nanos() as f64 / 1000000.0
    );
    if vm.not_implemented_count() > 0 {
        info!("{} unknown opcodes skipped", vm.not_implemented_count());
    }

    result?;

    Ok(())
}

fn run_disassembler(filepath: impl AsRef<str>) -> AppResult<()> {
    let rom = Rom::from_file(filepath.as_ref())?;

    let mut buf = String::new();
    Disassembler::new(rom.data()).disassemble(&mut buf)?;
    print!("{buf}");

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new().env().init()?;

    match parse_args() {
        Some(Cmd::Run { filepath }) => run_rom(filepath)?,
        Some(Cmd::Dis { filepath }) => run_disassembler(filepath)?,
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    }

    Ok(())
}

fn parse_args() -> Option<Cmd> {
    let mut args = env::args().skip(1);
    match args.next()?.as_str() {
        "run" => Some(Cmd::Run {
            filepath: args.next()?,
        }),
        "dis" => Some(Cmd::Dis {
            filepath: args.next()?,
        }),
        _ => None,
    }
}

fn print_usage() {
    println!("Chip8 v{IMPL_VERSION}");
    println!("{USAGE}");
}

enum Cmd {
    /// Run file
    Run { filepath: String },
    /// Disassemble file
    Dis { filepath: String },
}
