// SPDX-License-Identifier: AGPL-3.0-only

//! `vecdot`: hardware vs software dot-product benchmark.
//!
//! ```text
//! USAGE:
//!   vecdot [interactive]             Prompt for N, run both paths, repeat
//!   vecdot sweep --sizes 16,256      Non-interactive table over several N
//!   vecdot regs                      Print register and memory maps
//!
//!   --backend mmio|sim               /dev/mem on the board, or the simulator
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{BufRead, Write};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vecdot_chip::{memmap, regs, timer};
use vecdot_driver::sim::{Completion, SharedMemory, SimAccelerator, SimTimer};
use vecdot_driver::{
    parse_length, BenchConfig, Benchmark, BenchmarkReport, MmioRegion, RegisterFile, VecdotError,
    WaitStrategy, WordMemory,
};

#[derive(Parser)]
#[command(name = "vecdot", about = "FPGA dot-product accelerator benchmark", version)]
struct Cli {
    /// Hardware access backend.
    #[arg(long, value_enum, env = "VECDOT_BACKEND", default_value_t = Backend::Mmio)]
    backend: Backend,

    /// Seed for the generated vectors (reapplied every run).
    #[arg(long, env = "VECDOT_SEED", default_value_t = vecdot_driver::bench::DEFAULT_SEED)]
    seed: u64,

    /// Elements are drawn from 0..MAX_VALUE.
    #[arg(long, env = "VECDOT_MAX_VALUE", default_value_t = vecdot_driver::bench::DEFAULT_MAX_VALUE,
          value_parser = clap::value_parser!(i32).range(1..))]
    max_value: i32,

    /// Shared memory size in 32-bit words.
    #[arg(long, env = "VECDOT_SDRAM_WORDS", default_value_t = memmap::SDRAM_WORDS)]
    sdram_words: usize,

    /// Give up after this many busy polls instead of waiting forever.
    #[arg(long, env = "VECDOT_MAX_POLLS", conflicts_with = "timeout_ms")]
    max_polls: Option<u64>,

    /// Give up after this many milliseconds instead of waiting forever.
    #[arg(long, env = "VECDOT_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Simulated accelerator: CTRL reads until done.
    #[arg(long, default_value_t = 1)]
    sim_polls: u32,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Prompt for vector sizes until told to stop (default).
    Interactive,
    /// Run a fixed list of sizes and print a table.
    Sweep {
        /// Comma-separated vector sizes.
        #[arg(long, value_delimiter = ',', default_value = "16,256,4096,65536")]
        sizes: Vec<usize>,
    },
    /// Print the register map and memory map.
    Regs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Physical registers through /dev/mem (needs root).
    Mmio,
    /// In-process accelerator and timer models.
    Sim,
}

impl Cli {
    fn wait_strategy(&self) -> WaitStrategy {
        match (self.max_polls, self.timeout_ms) {
            (Some(polls), _) => WaitStrategy::BoundedPolls(polls),
            (None, Some(ms)) => WaitStrategy::Deadline(Duration::from_millis(ms)),
            (None, None) => WaitStrategy::Unbounded,
        }
    }

    fn bench_config(&self) -> BenchConfig {
        BenchConfig {
            seed: self.seed,
            max_value: self.max_value,
            wait: self.wait_strategy(),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let default_command = Cmd::Interactive;
    let command = cli.command.as_ref().unwrap_or(&default_command);

    if let Cmd::Regs = command {
        return cmd_regs(&mut std::io::stdout().lock());
    }

    let config = cli.bench_config();
    info!(
        "Backend {:?}, seed {}, {} SDRAM words, wait {:?}",
        cli.backend, config.seed, cli.sdram_words, config.wait
    );
    match cli.backend {
        Backend::Sim => {
            let memory = SharedMemory::new(cli.sdram_words);
            let accel = SimAccelerator::with_completion(
                memory.clone(),
                Completion::AfterReads(cli.sim_polls),
            );
            let bench = Benchmark::new(memory, accel, SimTimer::default(), config);
            dispatch(bench, command)
        }
        Backend::Mmio => {
            let sdram = MmioRegion::map(memmap::FPGA_SDRAM_BASE, cli.sdram_words * 4)
                .context("mapping FPGA SDRAM")?;
            let accel = MmioRegion::map(memmap::ACCEL_BASE, regs::REG_COUNT * 4)
                .context("mapping accelerator registers")?;
            let t = MmioRegion::map(memmap::TIMER_BASE, timer::REG_COUNT * 4)
                .context("mapping interval timer")?;
            dispatch(Benchmark::new(sdram, accel, t, config), command)
        }
    }
}

fn dispatch<M, A, T>(mut bench: Benchmark<M, A, T>, command: &Cmd) -> Result<()>
where
    M: WordMemory,
    A: RegisterFile,
    T: RegisterFile,
{
    let stdout = std::io::stdout();
    match command {
        Cmd::Interactive => {
            let stdin = std::io::stdin();
            interactive(&mut bench, &mut stdin.lock(), &mut stdout.lock())
        }
        Cmd::Sweep { sizes } => sweep(&mut bench, sizes, &mut stdout.lock()),
        Cmd::Regs => cmd_regs(&mut stdout.lock()),
    }
}

/// Read one line; `None` at end of input.
fn read_line(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    let n = input.read_line(&mut line).context("reading stdin")?;
    Ok((n > 0).then_some(line))
}

fn interactive<M, A, T>(
    bench: &mut Benchmark<M, A, T>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()>
where
    M: WordMemory,
    A: RegisterFile,
    T: RegisterFile,
{
    writeln!(out, "Welcome to Vector Dot Product Multiplication Calculator!")?;
    loop {
        write!(out, "\nEnter the size of Vector: ")?;
        out.flush()?;
        let Some(line) = read_line(input)? else {
            break;
        };

        let report = match parse_length(&line).and_then(|n| bench.run(n)) {
            Ok(report) => report,
            Err(
                e @ (VecdotError::InvalidInput { .. }
                | VecdotError::InvalidLength { .. }
                | VecdotError::CapacityExceeded { .. }
                | VecdotError::OverlappingBuffers { .. }),
            ) => {
                writeln!(out, "Invalid size: {e} (max {})", bench.max_len())?;
                continue;
            }
            Err(e) => return Err(e).context("benchmark run failed"),
        };
        print_report(out, &report)?;

        write!(out, "Continue (y/n)? ")?;
        out.flush()?;
        match read_line(input)? {
            Some(answer) if matches!(answer.trim(), "n" | "N") => break,
            Some(_) => {}
            None => break,
        }
    }
    Ok(())
}

fn print_report(out: &mut impl Write, report: &BenchmarkReport) -> Result<()> {
    writeln!(
        out,
        "\n SW Result: {}; Clock Cycles: {} cc ",
        report.software.result,
        report.software.measurement.cycles()
    )?;
    writeln!(
        out,
        " HW Result: {}; Clock Cycles: {} cc ",
        report.hardware.result,
        report.hardware.measurement.cycles()
    )?;
    if !report.matches() {
        writeln!(out, " MISMATCH between software and hardware results")?;
    }
    writeln!(out, "Speedup: {:.2}x", report.speedup())?;
    Ok(())
}

fn sweep<M, A, T>(bench: &mut Benchmark<M, A, T>, sizes: &[usize], out: &mut impl Write) -> Result<()>
where
    M: WordMemory,
    A: RegisterFile,
    T: RegisterFile,
{
    writeln!(
        out,
        "  {:>9}  {:>20}  {:>12}  {:>10}  {:>12}  {:>10}  {:>9}  {}",
        "N", "result", "sw cycles", "sw µs", "hw cycles", "hw µs", "speedup", "match"
    )?;
    for &n in sizes {
        let report = bench.run(n).with_context(|| format!("N={n}"))?;
        let sw = report.software.measurement;
        let hw = report.hardware.measurement;
        writeln!(
            out,
            "  {:>9}  {:>20}  {:>12}  {:>10.1}  {:>12}  {:>10.1}  {:>8.2}×  {}{}",
            n,
            report.hardware.result,
            sw.cycles(),
            sw.duration().as_secs_f64() * 1e6,
            hw.cycles(),
            hw.duration().as_secs_f64() * 1e6,
            report.speedup(),
            if report.matches() { "ok" } else { "MISMATCH" },
            if sw.wrapped || hw.wrapped { " (timer wrapped)" } else { "" },
        )?;
    }
    Ok(())
}

fn cmd_regs(out: &mut impl Write) -> Result<()> {
    writeln!(out, "Accelerator @ {:#010x}", memmap::ACCEL_BASE)?;
    for (offset, name) in regs::NAMES.iter().enumerate() {
        writeln!(
            out,
            "  [{offset}] {name:<10} {:#010x}",
            memmap::ACCEL_BASE + offset as u64 * 4
        )?;
    }
    writeln!(
        out,
        "Interval timer @ {:#010x}  ({} MHz)",
        memmap::TIMER_BASE,
        timer::CLOCK_HZ / 1_000_000
    )?;
    writeln!(
        out,
        "FPGA SDRAM     @ {:#010x}  ({} MB, accelerator view {:#x})",
        memmap::FPGA_SDRAM_BASE,
        memmap::FPGA_SDRAM_SIZE / (1024 * 1024),
        memmap::ACC_SDRAM_BASE
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim_bench() -> Benchmark<SharedMemory, SimAccelerator, SimTimer> {
        let memory = SharedMemory::new(64);
        let accel = SimAccelerator::new(memory.clone());
        Benchmark::new(memory, accel, SimTimer::stepped(1), BenchConfig::default())
    }

    fn run_session(script: &str) -> String {
        let mut bench = sim_bench();
        let mut out = Vec::new();
        interactive(&mut bench, &mut script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn session_runs_until_no() {
        let out = run_session("3\ny\n5\nn\n");
        assert_eq!(out.matches("SW Result").count(), 2);
        assert_eq!(out.matches("HW Result").count(), 2);
        assert_eq!(out.matches("Speedup:").count(), 2);
        assert!(!out.contains("MISMATCH"));
    }

    #[test]
    fn session_reprompts_on_bad_size() {
        let out = run_session("-4\nabc\n100\n2\nN\n");
        assert_eq!(out.matches("Invalid size").count(), 3);
        assert_eq!(out.matches("SW Result").count(), 1);
        assert!(out.contains("(max 32)"));
    }

    #[test]
    fn session_ends_at_eof() {
        let out = run_session("1\n");
        assert_eq!(out.matches("SW Result").count(), 1);
    }

    #[test]
    fn sweep_prints_one_row_per_size() {
        let mut bench = sim_bench();
        let mut out = Vec::new();
        sweep(&mut bench, &[0, 4, 16], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert_eq!(text.matches(" ok").count(), 3);
    }

    #[test]
    fn wait_strategy_from_flags() {
        let cli = Cli::parse_from(["vecdot", "--max-polls", "7"]);
        assert_eq!(cli.wait_strategy(), WaitStrategy::BoundedPolls(7));
        let cli = Cli::parse_from(["vecdot", "--timeout-ms", "20", "--backend", "sim"]);
        assert_eq!(cli.wait_strategy(), WaitStrategy::Deadline(Duration::from_millis(20)));
        assert_eq!(cli.backend, Backend::Sim);
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn regs_lists_all_registers() {
        let mut out = Vec::new();
        cmd_regs(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        for name in regs::NAMES {
            assert!(text.contains(name));
        }
        assert!(text.contains("0xff200080"));
    }
}
