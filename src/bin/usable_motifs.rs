/// usable_motifs.rs — selects usable motifs from a sorted oligomer stream,
/// replaying `original_source/usable_motifs.cc`'s CLI surface.
use std::path::PathBuf;
use std::process::exit;

use clap::Parser;

use oligotab::error::{OligoError, Result};
use oligotab::stream::StreamSource;
use oligotab::usable::{UsableMotifSelector, ValueColumn};

/// Groups a sorted oligomer stream into k-prefix runs and emits the
/// motifs whose bucket agrees on a single value, for every k in a range.
#[derive(Parser, Debug)]
#[command(name = "usable-motifs", author, version, long_about = None)]
struct Cli {
    /// Directory to write `<k>/good.oligos.gz` files under
    outdir: PathBuf,

    /// A single k, or a `kmin-kmax` range (e.g. "5-8")
    range: String,

    /// Which column holds the value to test for usability: 2 or 3
    value_column: u8,

    /// Input file (raw or `.gz`), or `-` for stdin
    input: String,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let (kmin, kmax) = parse_range(&cli.range)?;
    let column = match cli.value_column {
        2 => ValueColumn::Second,
        3 => ValueColumn::Third,
        other => {
            return Err(OligoError::BadInput(format!(
                "value-column must be 2 or 3, got {other}"
            )))
        }
    };

    let source = StreamSource::open_single(&cli.input)?;
    let selector = UsableMotifSelector { kmin, kmax, column };
    let stats = selector.run(source, &cli.outdir)?;

    eprintln!("Emitted {} usable motifs", stats.usable_emitted);
    Ok(())
}

fn parse_range(range: &str) -> Result<(usize, usize)> {
    match range.split_once('-') {
        Some((lo, hi)) => {
            let kmin = lo
                .parse()
                .map_err(|_| OligoError::BadInput(format!("bad range: {range:?}")))?;
            let kmax = hi
                .parse()
                .map_err(|_| OligoError::BadInput(format!("bad range: {range:?}")))?;
            if kmin > kmax {
                return Err(OligoError::BadInput(format!("kmin > kmax in range {range:?}")));
            }
            Ok((kmin, kmax))
        }
        None => {
            let k = range
                .parse()
                .map_err(|_| OligoError::BadInput(format!("bad range: {range:?}")))?;
            Ok((k, k))
        }
    }
}
