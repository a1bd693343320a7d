/// merge.rs — k-way streaming merge by motif key, grounded on
/// `original_source/merge_and_build_kmers.cc`'s `DataReader`/`read_files`.
use crate::error::{OligoError, Result};
use crate::stream::StreamSource;
use crate::table::TableWriter;

/// One input source paired with the mapping from its parsed columns to
/// slots in the merged attribute tuple.
pub struct SourceSpec {
    pub source: StreamSource,
    /// `(source_column, target_slot)` pairs; `source_column` indexes the
    /// integer fields of a parsed line (0-based, after the motif column).
    pub field_map: Vec<(usize, usize)>,
}

struct ActiveSource {
    source: StreamSource,
    field_map: Vec<(usize, usize)>,
    current: Option<(String, Vec<i32>)>,
}

impl ActiveSource {
    fn advance(&mut self) -> Result<bool> {
        match self.source.next_line()? {
            Some(line) => {
                self.current = Some(parse_line(&line)?);
                Ok(true)
            }
            None => {
                self.current = None;
                Ok(false)
            }
        }
    }

    fn motif(&self) -> &str {
        &self.current.as_ref().unwrap().0
    }

    fn apply(&self, target: &mut [i32]) -> Result<()> {
        let (_, values) = self.current.as_ref().unwrap();
        for &(from, to) in &self.field_map {
            let v = values.get(from).ok_or_else(|| {
                OligoError::BadInput(format!(
                    "field_map references column {from}, but line only has {} value columns",
                    values.len()
                ))
            })?;
            target[to] = *v;
        }
        Ok(())
    }
}

fn parse_line(line: &str) -> Result<(String, Vec<i32>)> {
    let mut cols = line.split('\t');
    let motif = cols
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| OligoError::BadInput(format!("empty or missing motif column: {line:?}")))?
        .to_string();

    let mut values = Vec::new();
    for col in cols {
        let v = col
            .parse::<i32>()
            .map_err(|_| OligoError::BadInput(format!("not an integer: {col:?} (line {line:?})")))?;
        values.push(v);
    }
    Ok((motif, values))
}

/// Merges several sorted attribute streams into one TableFile, keyed by
/// motif. Slot 0 is the primary attribute: a motif is only written out if
/// some source supplied a non-negative value for slot 0.
pub struct MultiSourceMerger {
    sources: Vec<ActiveSource>,
    width: usize,
}

impl MultiSourceMerger {
    pub fn new(specs: Vec<SourceSpec>, width: usize) -> Result<Self> {
        let mut sources = Vec::with_capacity(specs.len());
        for spec in specs {
            let mut active = ActiveSource {
                source: spec.source,
                field_map: spec.field_map,
                current: None,
            };
            if active.advance()? {
                sources.push(active);
            }
        }
        Ok(Self { sources, width })
    }

    /// Runs the merge to completion, writing every accumulated entry to
    /// `writer` in ascending motif order.
    pub fn run(mut self, writer: &mut TableWriter) -> Result<()> {
        let mut acc_motif: Option<String> = None;
        let mut values = vec![-1i32; self.width];

        while !self.sources.is_empty() {
            let min_idx = self.pick_min_index();
            let cur_motif = self.sources[min_idx].motif().to_string();

            if acc_motif.as_deref() != Some(cur_motif.as_str()) {
                if let Some(m) = acc_motif.take() {
                    flush(&m, &values, writer)?;
                }
                values = vec![-1i32; self.width];
                acc_motif = Some(cur_motif);
            }

            self.sources[min_idx].apply(&mut values)?;
            if !self.sources[min_idx].advance()? {
                self.sources.remove(min_idx);
            }
        }

        if let Some(m) = acc_motif {
            flush(&m, &values, writer)?;
        }
        Ok(())
    }

    /// Index of the source whose current motif is lexicographically
    /// smallest; ties favour the earliest-indexed source.
    fn pick_min_index(&self) -> usize {
        let mut best = 0;
        for i in 1..self.sources.len() {
            if self.sources[i].motif() < self.sources[best].motif() {
                best = i;
            }
        }
        best
    }
}

fn flush(motif: &str, values: &[i32], writer: &mut TableWriter) -> Result<()> {
    if values[0] >= 0 {
        writer.write_entry(motif.as_bytes(), values)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableFile;
    use std::io::Write;

    fn declared_source(dir: &std::path::Path, name: &str, lines: &[&str]) -> StreamSource {
        let data_path = dir.join(format!("{name}.data"));
        let mut f = std::fs::File::create(&data_path).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        let decl_path = dir.join(format!("{name}.decl"));
        std::fs::write(&decl_path, format!("{}\n", data_path.display())).unwrap();
        StreamSource::open_declaration(&decl_path).unwrap()
    }

    #[test]
    fn merges_three_sources_like_original_tool() {
        let dir = tempfile::tempdir().unwrap();

        // function-data source: col0 -> slot0, col2 -> slot3
        let func_src = declared_source(
            dir.path(),
            "func",
            &["AAAA\t7\t0\t99", "CCCC\t8\t0\t100"],
        );
        // figfam-data source: col0 -> slot2
        let fig_src = declared_source(dir.path(), "fig", &["AAAA\t42"]);
        // phylo-data source: col0 -> slot1
        let phylo_src = declared_source(dir.path(), "phylo", &["CCCC\t3"]);

        let merger = MultiSourceMerger::new(
            vec![
                SourceSpec { source: func_src, field_map: vec![(0, 0), (2, 3)] },
                SourceSpec { source: fig_src, field_map: vec![(0, 2)] },
                SourceSpec { source: phylo_src, field_map: vec![(0, 1)] },
            ],
            4,
        )
        .unwrap();

        let out_path = dir.path().join("table.bin");
        let mut writer = TableWriter::create(&out_path, 1, 4, 0, &[4, 2, 4, 4]).unwrap();
        merger.run(&mut writer).unwrap();
        writer.close().unwrap();

        let tf = TableFile::open(&out_path).unwrap();
        assert_eq!(tf.len(), 2);
        assert_eq!(tf.motif_at(0), b"AAAA");
        assert_eq!(tf.attrs_at(0), vec![7, -1, 42, 99]);
        assert_eq!(tf.motif_at(1), b"CCCC");
        assert_eq!(tf.attrs_at(1), vec![8, 3, -1, 100]);
    }

    #[test]
    fn skips_motifs_missing_primary_slot() {
        let dir = tempfile::tempdir().unwrap();
        let only_secondary = declared_source(dir.path(), "sec", &["AAAA\t5"]);

        let merger = MultiSourceMerger::new(
            vec![SourceSpec { source: only_secondary, field_map: vec![(0, 1)] }],
            2,
        )
        .unwrap();

        let out_path = dir.path().join("table.bin");
        let mut writer = TableWriter::create(&out_path, 1, 4, 0, &[4, 4]).unwrap();
        merger.run(&mut writer).unwrap();
        writer.close().unwrap();

        let tf = TableFile::open(&out_path).unwrap();
        assert_eq!(tf.len(), 0);
    }

    #[test]
    fn empty_source_never_enters_active_set() {
        let dir = tempfile::tempdir().unwrap();
        let empty = declared_source(dir.path(), "empty", &[]);
        let present = declared_source(dir.path(), "present", &["AAAA\t1"]);

        let merger = MultiSourceMerger::new(
            vec![
                SourceSpec { source: empty, field_map: vec![(0, 0)] },
                SourceSpec { source: present, field_map: vec![(0, 0)] },
            ],
            1,
        )
        .unwrap();
        assert_eq!(merger.sources.len(), 1);
    }

    proptest::proptest! {
        // P4: merging a single sorted, deduplicated source reproduces exactly
        // that source's motifs, in ascending order, with no entries dropped
        // or reordered (slot 0 always set so every motif survives the flush).
        #[test]
        fn merge_output_is_sorted_union_of_single_source(
            mut keys in proptest::collection::vec(proptest::prelude::any::<u16>(), 1..40),
        ) {
            keys.sort_unstable();
            keys.dedup();
            proptest::prop_assume!(!keys.is_empty());

            let dir = tempfile::tempdir().unwrap();
            let lines: Vec<String> = keys.iter().map(|k| format!("{k:04X}\t{k}")).collect();
            let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
            let src = declared_source(dir.path(), "only", &line_refs);

            let merger = MultiSourceMerger::new(
                vec![SourceSpec { source: src, field_map: vec![(0, 0)] }],
                1,
            )
            .unwrap();

            let out_path = dir.path().join("table.bin");
            let mut writer = TableWriter::create(&out_path, 1, 4, 0, &[4]).unwrap();
            merger.run(&mut writer).unwrap();
            writer.close().unwrap();

            let tf = TableFile::open(&out_path).unwrap();
            proptest::prop_assert_eq!(tf.len(), keys.len());
            for i in 0..keys.len() {
                proptest::prop_assert_eq!(tf.motif_at(i), format!("{:04X}", keys[i]).as_bytes());
                proptest::prop_assert_eq!(tf.attrs_at(i), vec![keys[i] as i32]);
                if i > 0 {
                    proptest::prop_assert!(tf.motif_at(i) > tf.motif_at(i - 1));
                }
            }
        }
    }
}
