/// merge_kmers.rs — builds a motif table from three attribute streams.
///
/// Replays `original_source/merge_and_build_kmers.cc`'s hardcoded
/// three-source configuration: a function-data source contributes the
/// function index (slot 0) and an offset (slot 3); a figfam-data source
/// contributes slot 2; a phylo-data source contributes slot 1.
use std::path::PathBuf;
use std::process::exit;

use clap::Parser;

use oligotab::error::Result;
use oligotab::merge::{MultiSourceMerger, SourceSpec};
use oligotab::stream::StreamSource;
use oligotab::table::TableWriter;

const MAGIC: i32 = 0x4b4d4552; // "KMER"
const ATTR_LEN: [i32; 4] = [4, 2, 4, 4];

/// Merges function-data, figfam-data, and phylo-data streams into one
/// packed motif table, keyed by motif.
#[derive(Parser, Debug)]
#[command(name = "merge-kmers", author, version, long_about = None)]
struct Cli {
    /// Source declaration file listing function-data input paths
    func_decl: PathBuf,

    /// Source declaration file listing figfam-data input paths
    fig_decl: PathBuf,

    /// Source declaration file listing phylo-data input paths
    phylo_decl: PathBuf,

    /// Motif length shared by every input stream
    kmer_size: i32,

    /// Path to write the resulting table to
    output_table: PathBuf,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let func_src = StreamSource::open_declaration(&cli.func_decl)?;
    let fig_src = StreamSource::open_declaration(&cli.fig_decl)?;
    let phylo_src = StreamSource::open_declaration(&cli.phylo_decl)?;

    let merger = MultiSourceMerger::new(
        vec![
            SourceSpec { source: func_src, field_map: vec![(0, 0), (2, 3)] },
            SourceSpec { source: fig_src, field_map: vec![(0, 2)] },
            SourceSpec { source: phylo_src, field_map: vec![(0, 1)] },
        ],
        ATTR_LEN.len(),
    )?;

    let mut writer = TableWriter::create(&cli.output_table, MAGIC, cli.kmer_size, 0, &ATTR_LEN)?;
    merger.run(&mut writer)?;
    writer.close()?;

    eprintln!("Wrote {}", cli.output_table.display());
    Ok(())
}
