//! rvlab command-line driver.
//!
//! This binary provides a non-interactive entry point for the simulator. It performs:
//! 1. **Assemble:** Translate a source file, print the formatted listing, optionally write the machine-code hex file.
//! 2. **Disassemble:** Read a machine-code hex file and print the recovered assembly.
//! 3. **Run:** Assemble and execute a program, with optional data-cache simulation and trace logging.
//! 4. **Hazards:** Static hazard analysis with per-category stall totals and a CPI estimate.

use std::fs::{self, File};
use std::io::{self, Write};
use std::process;

use clap::{Parser, Subcommand};

use rvlab_core::asm::parse_hex_lines;
use rvlab_core::pipeline::PipelineKind;
use rvlab_core::{
    Assembler, CacheConfig, Disassembler, HazardAnalyzer, Interpreter, IsaMode, StopReason,
};

#[derive(Parser, Debug)]
#[command(
    name = "rvlab",
    author,
    version,
    about = "RISC-V teaching simulator",
    long_about = "Assemble, disassemble, execute, or analyze RV32I/M and RV64I/M programs.\n\nExamples:\n  rvlab asm prog.s -o prog.hex\n  rvlab dis prog.hex\n  rvlab run prog.s --cache cache.config --trace prog.log\n  rvlab hazards prog.s --stages 5 --forwarding"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// ISA mode: RV32I, RV32IM, RV64I, or RV64IM.
    #[arg(long, global = true, default_value = "RV32I")]
    isa: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assemble a source file and print the formatted listing.
    Asm {
        /// Assembly source file.
        file: String,

        /// Write the machine code as one hex word per line.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Disassemble a machine-code hex file.
    Dis {
        /// Machine-code file (8 hex digits per line).
        file: String,
    },

    /// Assemble and execute a program.
    Run {
        /// Assembly source file.
        file: String,

        /// Enable the data cache from a 5-token config file.
        #[arg(long)]
        cache: Option<String>,

        /// Write the cache access trace to this file.
        #[arg(long)]
        trace: Option<String>,

        /// Seed for RANDOM replacement (reproducible runs).
        #[arg(long)]
        seed: Option<u64>,

        /// Dump the final cache contents after the run.
        #[arg(long)]
        dump_cache: bool,
    },

    /// Statically analyze pipeline hazards.
    Hazards {
        /// Assembly source file.
        file: String,

        /// Pipeline depth: 3, 5, or 7 stages.
        #[arg(long, default_value_t = 5)]
        stages: u32,

        /// Model operand forwarding.
        #[arg(long)]
        forwarding: bool,

        /// Charge estimated cache-miss penalties to loads and stores.
        #[arg(long)]
        cache: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let isa: IsaMode = cli.isa.parse().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    match cli.command {
        Commands::Asm { file, output } => cmd_asm(&file, output.as_deref(), isa),
        Commands::Dis { file } => cmd_dis(&file, isa),
        Commands::Run {
            file,
            cache,
            trace,
            seed,
            dump_cache,
        } => cmd_run(&file, cache.as_deref(), trace.as_deref(), seed, dump_cache, isa),
        Commands::Hazards {
            file,
            stages,
            forwarding,
            cache,
        } => cmd_hazards(&file, stages, forwarding, cache, isa),
    }
}

/// Reads a source file or exits with a diagnostic.
fn read_source(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path, e);
        process::exit(1);
    })
}

/// Assembles a source file or exits with the assembler's diagnostic.
fn assemble(source: &str, isa: IsaMode) -> Assembler {
    let mut assembler = Assembler::new(isa);
    if let Err(e) = assembler.assemble(source) {
        eprintln!("Assembly error: {}", e);
        process::exit(1);
    }
    assembler
}

fn cmd_asm(file: &str, output: Option<&str>, isa: IsaMode) {
    let source = read_source(file);
    let assembler = assemble(&source, isa);
    let program = assembler.artifacts();

    for line in program.formatted_listing() {
        println!("{}", line);
    }

    if let Some(out_path) = output {
        let mut text = program.hex_lines().join("\n");
        text.push('\n');
        if let Err(e) = fs::write(out_path, text) {
            eprintln!("Error writing {}: {}", out_path, e);
            process::exit(1);
        }
        println!("Wrote {} words to {}", program.len(), out_path);
    }
}

fn cmd_dis(file: &str, isa: IsaMode) {
    let text = read_source(file);
    let words = parse_hex_lines(&text).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    let disasm = Disassembler::new(isa);
    match disasm.disassemble(&words) {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn cmd_run(
    file: &str,
    cache_config: Option<&str>,
    trace: Option<&str>,
    seed: Option<u64>,
    dump_cache: bool,
    isa: IsaMode,
) {
    let source = read_source(file);
    let assembler = assemble(&source, isa);

    let mut interp = Interpreter::new();
    interp.load(assembler.artifacts());
    interp.set_trace_sink(Box::new(io::stdout()));

    if let Some(config_path) = cache_config {
        let config = CacheConfig::from_file(config_path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        });
        println!("Cache Simulation Status: Enabled");
        print!("{}", config);
        interp.enable_cache(config);

        let cache = interp.cache_mut().expect("cache enabled above");
        if let Some(seed) = seed {
            cache.set_seed(seed);
        }
        if let Some(trace_path) = trace {
            let sink = File::create(trace_path).unwrap_or_else(|e| {
                eprintln!("Error creating {}: {}", trace_path, e);
                process::exit(1);
            });
            cache.set_log_sink(Box::new(sink));
        }
    }

    // No breakpoints can be set from this driver, so the only stops are
    // ebreak pauses (resumed immediately), ecall exits, and completion.
    let exit_code = loop {
        match interp.run() {
            StopReason::Paused | StopReason::Breakpoint(_) => continue,
            StopReason::Exited(code) => break code,
            StopReason::Completed => break 0,
        }
    };

    println!();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let _ = interp.dump_registers(&mut out);
    let _ = out.write_all(b"\n");

    if let Some(cache) = interp.cache() {
        println!("{}", cache.stats());
        if dump_cache {
            let _ = cache.dump(&mut out);
        }
    }

    process::exit(exit_code as i32);
}

fn cmd_hazards(file: &str, stages: u32, forwarding: bool, cache: bool, isa: IsaMode) {
    let pipeline = match stages {
        3 => PipelineKind::ThreeStage,
        5 => PipelineKind::FiveStage,
        7 => PipelineKind::SevenStage,
        other => {
            eprintln!("Error: unsupported pipeline depth {} (use 3, 5, or 7)", other);
            process::exit(1);
        }
    };

    let source = read_source(file);
    let assembler = assemble(&source, isa);
    let program = assembler.artifacts();

    let mut analyzer = HazardAnalyzer::new(pipeline, forwarding, cache);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let _ = analyzer.performance_analysis(&program.code, &mut out);
    let _ = analyzer.write_hazards(&mut out);
    let _ = analyzer.write_stats(&mut out);
}
