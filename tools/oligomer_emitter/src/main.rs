/// emit-oligomers — walks an identifier→translation store in natural
/// order and, for every record whose identifier was requested on stdin,
/// emits every overlapping k-length window as a line routed by leading
/// residue into one of a handful of output partitions, each piped through
/// a background `sort` process.
///
/// Grounded on `original_source/make_oligos.cc`. The real translation
/// store there is a Berkeley DB btree cursor; here it is abstracted as
/// `TranslationSource`, with `FlatFileTranslations` as the one concrete,
/// testable realisation (a file of `id\ttranslation` lines already in
/// ascending-id order).
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use clap::Parser;

/// Residue groups that partition output for parallel external sorting.
const RESIDUE_GROUPS: [&str; 3] = ["ACDEFG", "HIKLMNP", "QRSTVWY"];

const WRITE_LIMIT: u64 = 4_000_000;

#[derive(Parser, Debug)]
#[command(name = "emit-oligomers", author, version, long_about = None)]
struct Cli {
    /// Minimum oligomer length
    kmin: usize,

    /// Maximum oligomer length
    kmax: usize,

    /// Emit a trailing OFF<offset> column (0 or 1)
    emit_offsets: u8,

    /// Path to the translations store (id\ttranslation lines, ascending id order)
    translations_store: PathBuf,

    /// Output directory; one kmers.<group> subdirectory per residue group
    out_dir: PathBuf,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> std::io::Result<()> {
    let cli = Cli::parse();

    let id_values = read_peg_map(std::io::stdin())?;
    eprintln!("Read {} ids from stdin", id_values.len());

    std::fs::create_dir_all(&cli.out_dir)?;

    let mut byte_to_group = HashMap::new();
    let mut writers = Vec::new();
    for set in RESIDUE_GROUPS {
        let dir = cli.out_dir.join(format!("kmers.{set}"));
        std::fs::create_dir_all(&dir)?;
        let gi = writers.len();
        writers.push(SortWriter::new(dir)?);
        for b in set.bytes() {
            byte_to_group.insert(b, gi);
        }
    }

    let store = FlatFileTranslations::open(&cli.translations_store)?;
    let emit_offsets = cli.emit_offsets != 0;

    store.for_each(|id, trans| {
        if let Some(value) = id_values.get(id) {
            write_oligos(trans, value, cli.kmin, cli.kmax, emit_offsets, &byte_to_group, &mut writers)?;
        }
        Ok(())
    })?;

    for w in writers {
        w.close()?;
    }
    Ok(())
}

/// Reads `id\tvalue` pairs from stdin. `value` is the remainder of the
/// line after the first tab, and may itself contain tabs.
fn read_peg_map<R: Read>(r: R) -> std::io::Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for line in BufReader::new(r).lines() {
        let line = line?;
        if let Some((id, value)) = line.split_once('\t') {
            map.insert(id.to_string(), value.to_string());
        }
    }
    Ok(map)
}

fn write_oligos(
    trans: &[u8],
    value: &str,
    kmin: usize,
    kmax: usize,
    emit_offsets: bool,
    byte_to_group: &HashMap<u8, usize>,
    writers: &mut [SortWriter],
) -> std::io::Result<()> {
    let trans_len = trans.len();
    if trans_len <= kmin {
        return Ok(());
    }
    for i in 0..(trans_len - kmin) {
        let olen = if i < trans_len.saturating_sub(kmax) { kmax } else { trans_len - i };
        let window = &trans[i..i + olen];
        let Some(&gi) = byte_to_group.get(&window[0]) else {
            continue;
        };

        let mut buf = Vec::with_capacity(olen + value.len() + 16);
        buf.extend_from_slice(window);
        buf.push(b'\t');
        buf.extend_from_slice(value.as_bytes());
        if emit_offsets {
            let offset = trans_len - i;
            buf.extend_from_slice(format!("\tOFF{offset}\n").as_bytes());
        } else {
            buf.push(b'\n');
        }
        writers[gi].write(&buf)?;
    }
    Ok(())
}

/// An ordered identifier→translation store, walked once from beginning to
/// end. Production deployments would implement this over a real B-tree
/// cursor; this crate ships one flat-file realisation.
trait TranslationSource {
    fn for_each<F>(&self, f: F) -> std::io::Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> std::io::Result<()>;
}

struct FlatFileTranslations {
    path: PathBuf,
}

impl FlatFileTranslations {
    fn open(path: &Path) -> std::io::Result<Self> {
        Ok(Self { path: path.to_path_buf() })
    }
}

impl TranslationSource for FlatFileTranslations {
    fn for_each<F>(&self, mut f: F) -> std::io::Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> std::io::Result<()>,
    {
        let file = File::open(&self.path)?;
        for line in BufReader::new(file).lines() {
            let line = line?;
            if let Some((id, trans)) = line.split_once('\t') {
                f(id.as_bytes(), trans.as_bytes())?;
            }
        }
        Ok(())
    }
}

/// A sort-behind write pipe: writes accumulate into a child `sort`
/// process's stdin; every `WRITE_LIMIT` records the child is closed and a
/// fresh chunk file/child begins. At most one previously-started child is
/// allowed to run in the background at a time — older ones are waited on
/// before a new write proceeds.
struct SortWriter {
    dir: PathBuf,
    file_count: u32,
    write_count: u64,
    current: Option<(Child, ChildStdin)>,
    waiting: VecDeque<Child>,
}

impl SortWriter {
    fn new(dir: PathBuf) -> std::io::Result<Self> {
        let mut w = Self { dir, file_count: 0, write_count: 0, current: None, waiting: VecDeque::new() };
        w.open_writer()?;
        Ok(w)
    }

    fn open_writer(&mut self) -> std::io::Result<()> {
        let outfile = self.dir.join(format!("{:05}", self.file_count));
        self.file_count += 1;
        let out = File::create(&outfile)?;

        let mut child = Command::new("sort")
            .arg("-S")
            .arg("400M")
            .stdin(Stdio::piped())
            .stdout(out)
            .spawn()?;
        let stdin = child.stdin.take().expect("piped stdin");
        self.current = Some((child, stdin));
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        if self.write_count >= WRITE_LIMIT {
            self.check_procs(false)?;
            self.close_writer()?;
            self.open_writer()?;
            self.write_count = 0;
        }
        self.write_count += 1;
        self.current.as_mut().unwrap().1.write_all(data)
    }

    fn close_writer(&mut self) -> std::io::Result<()> {
        if let Some((child, stdin)) = self.current.take() {
            drop(stdin);
            self.waiting.push_back(child);
        }
        Ok(())
    }

    /// `wait=true` blocks on every pending child. `wait=false` blocks on
    /// every child but the most recently queued one, which is polled
    /// without blocking.
    fn check_procs(&mut self, wait: bool) -> std::io::Result<()> {
        let n = self.waiting.len();
        let mut still = VecDeque::new();
        for (i, mut child) in self.waiting.drain(..).enumerate() {
            if wait || i < n.saturating_sub(1) {
                child.wait()?;
            } else if child.try_wait()?.is_none() {
                still.push_back(child);
            }
        }
        self.waiting = still;
        Ok(())
    }

    fn close(mut self) -> std::io::Result<()> {
        self.close_writer()?;
        self.check_procs(true)
    }
}
