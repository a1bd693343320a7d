/// usable.rs — selects "usable" motifs from a sorted oligomer stream and
/// summarises their offset statistics, grounded on
/// `original_source/usable_motifs.cc`'s `main_loop`/`process_set`.
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{OligoError, Result};
use crate::stream::DedupLines;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueColumn {
    Second,
    Third,
}

/// Parses one oligomer record, extracting the motif, the selected value
/// column, and an optional `OFF<int>` offset (default 0).
pub fn parse_record(line: &str, column: ValueColumn) -> Result<(String, i32, i32)> {
    let mut cols = line.split('\t');
    let motif = cols
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| OligoError::BadInput(format!("missing motif column: {line:?}")))?
        .to_string();

    let col2 = cols
        .next()
        .ok_or_else(|| OligoError::BadInput(format!("missing column 2: {line:?}")))?;

    let v1: i32 = match column {
        ValueColumn::Second => col2
            .parse()
            .map_err(|_| OligoError::BadInput(format!("column 2 not an integer: {col2:?}")))?,
        ValueColumn::Third => {
            let col3 = cols
                .next()
                .ok_or_else(|| OligoError::BadInput(format!("missing column 3: {line:?}")))?;
            parse_col3(col3)?
        }
    };

    let mut v2 = 0;
    for col in cols {
        if let Some(off) = col.strip_prefix("OFF") {
            v2 = off.parse().unwrap_or(0);
            break;
        }
    }

    Ok((motif, v1, v2))
}

/// Strips an optional 3-letter alphabetic prefix (e.g. `FIG`) before parsing.
fn parse_col3(raw: &str) -> Result<i32> {
    let has_prefix = raw.len() >= 3 && raw.as_bytes()[..3].iter().all(|b| b.is_ascii_alphabetic());
    let digits = if has_prefix { &raw[3..] } else { raw };
    digits
        .parse()
        .map_err(|_| OligoError::BadInput(format!("column 3 not an integer: {raw:?}")))
}

#[derive(Default, Clone, Copy)]
struct OffsetStats {
    accum: i64,
    count: i64,
    min: i32,
    max: i32,
}

/// Aggregates one prefix run for a single target k, returning the usable
/// short-oligos in ascending order (required so downstream merging stays
/// sorted).
fn process_run(run: &[(String, i32, i32)], k: usize) -> Vec<(String, i32, i32, i32, i32)> {
    let mut sums: std::collections::HashMap<i32, OffsetStats> = std::collections::HashMap::new();
    let mut counts: BTreeMap<String, Vec<(i32, i32)>> = BTreeMap::new();

    for (motif, v1, v2) in run {
        if motif.len() < k {
            continue;
        }
        let short = &motif[..k];

        let stat = sums.entry(*v1).or_insert(OffsetStats { accum: 0, count: 0, min: *v2, max: *v2 });
        stat.accum += *v2 as i64;
        stat.count += 1;
        if *v2 > stat.max {
            stat.max = *v2;
        }
        if *v2 < stat.min {
            stat.min = *v2;
        }

        let bucket = counts.entry(short.to_string()).or_default();
        match bucket.iter_mut().find(|(v, _)| v == v1) {
            Some((_, c)) => *c += 1,
            None => bucket.push((*v1, 1)),
        }
    }

    let mut out = Vec::new();
    for (short_oligo, bucket) in counts {
        let total: i32 = bucket.iter().map(|(_, c)| c).sum();
        let mut best = 0;
        for i in 1..bucket.len() {
            if bucket[i].1 > bucket[best].1 {
                best = i;
            }
        }
        let (max_v1, maxv) = bucket[best];
        if maxv == total {
            if let Some(stat) = sums.get(&max_v1) {
                let avg = if stat.count > 0 { (stat.accum / stat.count) as i32 } else { 0 };
                out.push((short_oligo, max_v1, avg, stat.max, stat.min));
            }
        }
    }
    out
}

fn prefix_key(motif: &str, kmin: usize) -> String {
    if motif.len() >= kmin {
        motif[..kmin].to_string()
    } else {
        motif.to_string()
    }
}

#[derive(Debug, Default)]
pub struct SelectorStats {
    pub usable_emitted: u64,
}

pub struct UsableMotifSelector {
    pub kmin: usize,
    pub kmax: usize,
    pub column: ValueColumn,
}

impl UsableMotifSelector {
    /// Runs the selector over `lines` (already deduplicated internally),
    /// writing one gzipped file per k under `outdir/<k>/good.oligos.gz`.
    pub fn run<I>(&self, lines: I, outdir: &Path) -> Result<SelectorStats>
    where
        I: Iterator<Item = Result<String>>,
    {
        std::fs::create_dir_all(outdir)?;
        let mut writers = Vec::new();
        for k in self.kmin..=self.kmax {
            let kdir = outdir.join(k.to_string());
            std::fs::create_dir_all(&kdir)?;
            let f = File::create(kdir.join("good.oligos.gz"))?;
            writers.push(GzEncoder::new(f, Compression::default()));
        }

        let mut stats = SelectorStats::default();
        let mut run: Vec<(String, i32, i32)> = Vec::new();
        let mut run_prefix: Option<String> = None;

        for line in DedupLines::new(lines) {
            let line = line?;
            let (motif, v1, v2) = parse_record(&line, self.column)?;
            let prefix = prefix_key(&motif, self.kmin);

            if run_prefix.as_deref() != Some(prefix.as_str()) {
                if !run.is_empty() {
                    self.flush_run(&run, &mut writers, &mut stats)?;
                }
                run.clear();
                run_prefix = Some(prefix);
            }
            run.push((motif, v1, v2));
        }
        if !run.is_empty() {
            self.flush_run(&run, &mut writers, &mut stats)?;
        }

        for w in writers {
            w.finish()?;
        }
        Ok(stats)
    }

    fn flush_run(
        &self,
        run: &[(String, i32, i32)],
        writers: &mut [GzEncoder<File>],
        stats: &mut SelectorStats,
    ) -> Result<()> {
        for (i, k) in (self.kmin..=self.kmax).enumerate() {
            for (short, func, avg, max, min) in process_run(run, k) {
                writeln!(writers[i], "{short}\t{func}\t{avg}\t{max}\t{min}")?;
                stats.usable_emitted += 1;
            }
        }
        Ok(())
    }
}
