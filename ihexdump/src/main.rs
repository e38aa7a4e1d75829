use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use clap::Parser;
use log::info;

use ihex_image::*;

/*
Usage:
  ihexdump firmware.hex
  ihexdump firmware.hex --out image.bin --lo 0x1000 --hi 0x8000 --raw

  Data outside [lo, hi) is ignored.
 */

#[derive(Debug, Parser)]
#[command(version, about = "Dumps an Intel HEX file to a binary image")]
struct Args {
    /// Source Intel HEX file
    source: PathBuf,

    /// Destination file [default: the source name with a .bin extension]
    #[arg(long)]
    out: Option<PathBuf>,

    /// Start address of the range to keep
    #[arg(long, default_value = "0x1000", value_parser = parse_address)]
    lo: u32,

    /// End address (exclusive) of the range to keep
    #[arg(long, default_value = "0x10000", value_parser = parse_address)]
    hi: u32,

    /// Do not write the header sector
    #[arg(long)]
    raw: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = try_main() {
        eprintln!("ERROR: {:#}", e);
        process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::parse();

    let out = destination_path(&args.source, args.out.as_deref())?;
    let window = AddressWindow::new(args.lo, args.hi)?;
    let format = if args.raw {
        OutputFormat::Raw
    } else {
        OutputFormat::Header
    };

    let source = File::open(&args.source)
        .with_context(|| format!("file open failed [{}]", args.source.display()))?;
    let conversion = convert(BufReader::new(source), window, format)
        .with_context(|| format!("conversion failed [{}]", args.source.display()))?;

    fs::write(&out, &conversion.output)
        .with_context(|| format!("file write failed [{}]", out.display()))?;

    info!(
        "wrote {} bytes ({:#x} data bytes) to {}",
        conversion.output.len(),
        conversion.final_len,
        out.display()
    );
    Ok(())
}

fn destination_path(source: &Path, out: Option<&Path>) -> anyhow::Result<PathBuf> {
    let out = match out {
        Some(out) => out.to_path_buf(),
        None => source.with_extension("bin"),
    };
    if out == source {
        bail!("cannot write over the source file - specify another destination with --out");
    }
    Ok(out)
}

/// Parses a decimal or `0x` prefixed hexadecimal address.
fn parse_address(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) => u32::from_str_radix(digits, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{s}': {e}"))
}
