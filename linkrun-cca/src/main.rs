#[cfg(test)]
#[macro_use]
extern crate quickcheck_macros;

use std::num::{NonZeroUsize, ParseIntError};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use fpga_fields::hw_access::{Logging, Loopback};
use fpga_fields::{FieldId, HwAccess};
use fpga_fields_uio::{UioBackend, UioConfig};
use log::{debug, info};

use crate::driver::{Driver, RunSettings, RunSummary};
use crate::fields::{RdField, WrField, X_SIZE, Y_BITS};
use crate::test_frames::TestFrames;

mod driver;
mod fields;
mod test_frames;

/// Bytes past the bank offset given to the loopback region; room for both banks.
const LOOPBACK_BANK_BYTES: usize = 0x100;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum Backend {
    /// The accelerator behind a UIO device.
    Uio,
    /// An in-memory region whose read bank echoes the write bank.
    Loopback,
}

#[derive(clap::Parser)]
#[command(name = "linkrun-cca", version, about)]
struct Args {
    #[arg(long, value_enum, default_value_t = Backend::Uio)]
    backend: Backend,

    /// UIO device file.
    #[arg(long, default_value = "/dev/uio4")]
    device: PathBuf,

    /// Index of the UIO map holding the registers.
    #[arg(long, default_value_t = 0)]
    map_index: usize,

    /// Byte offset of the write bank; the loopback backend uses it for both banks.
    #[arg(long, default_value = "0x80", value_parser = parse_offset)]
    wr_bank_offset: usize,

    /// Byte offset of the read bank.
    #[arg(long, default_value = "0x80", value_parser = parse_offset)]
    rd_bank_offset: usize,

    /// Number of frames to stream.
    #[arg(long, default_value_t = 1)]
    frames: usize,

    /// Line period after which each frame's content repeats.
    #[arg(long, default_value = "512")]
    repeat_y: NonZeroUsize,

    /// Stop after this many pixel clocks.
    #[arg(long, default_value_t = 50_000_000)]
    max_clocks: u64,

    /// Log every bus transaction.
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(if args.verbose {
        "debug"
    } else {
        "info"
    }))
    .init();

    info!(
        "LinkRunCCA: X_SIZE={X_SIZE}, Y_BITS={Y_BITS}, {} write bits, {} read bits",
        WrField::TOTAL_BITS,
        RdField::TOTAL_BITS,
    );
    let frames = TestFrames::new(args.repeat_y);
    let settings = RunSettings {
        frames: args.frames,
        max_clocks: args.max_clocks,
    };

    let summary = match args.backend {
        Backend::Uio => {
            let config = UioConfig {
                device: args.device.clone(),
                map_index: args.map_index,
                wr_bank_offset: args.wr_bank_offset,
                rd_bank_offset: args.rd_bank_offset,
                ..UioConfig::default()
            };
            let hw = UioBackend::<u128, u128>::open(&config)
                .with_context(|| format!("Opening {}", config.device.display()))?;
            run(Logging::new(hw, "uio"), &frames, &settings)?
        }
        Backend::Loopback => {
            let hw = Loopback::<u128, u128>::new(
                args.wr_bank_offset + LOOPBACK_BANK_BYTES,
                args.wr_bank_offset,
            )
            .context("Creating the loopback region")?;
            run(Logging::new(hw, "loopback"), &frames, &settings)?
        }
    };

    info!(
        "Emulation ended: {} clocks, {} complete frames, {} features",
        summary.clocks, summary.frames, summary.features,
    );
    Ok(())
}

/// Parses a byte offset given as `0x`-prefixed hex or as decimal.
fn parse_offset(text: &str) -> Result<usize, ParseIntError> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => text.parse(),
    }
}

fn run<H: HwAccess>(hw: H, frames: &TestFrames, settings: &RunSettings) -> Result<RunSummary> {
    let mut driver = Driver::new(hw).context("Binding the LinkRunCCA fields")?;
    let summary = driver
        .run(frames, settings, |clock, feature| {
            info!(
                "feature at clock {clock}: x {}..={}, seg 0 y {}..={}, seg 1 y {}..={}",
                feature.x_left,
                feature.x_right,
                feature.y_top_seg0,
                feature.y_bottom_seg0,
                feature.y_top_seg1,
                feature.y_bottom_seg1,
            );
            debug!(
                "  sums: x2 {}, ylow2 {}, xylow {}, x_seg {}/{}, ylow_seg {}/{}, n_seg {}/{}",
                feature.x2_sum,
                feature.ylow2_sum,
                feature.xylow_sum,
                feature.x_seg0_sum,
                feature.x_seg1_sum,
                feature.ylow_seg0_sum,
                feature.ylow_seg1_sum,
                feature.n_seg0_sum,
                feature.n_seg1_sum,
            );
        })
        .context("Streaming frames")?;
    Ok(summary)
}
