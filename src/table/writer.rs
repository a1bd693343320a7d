/// table/writer.rs — the write side of the on-disk table, grounded on
/// `original_source/kmers.cc`'s `KmersFileCreator::write_entry` and
/// `table.c`'s `write_file_header`.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::codec::{encode_header, write_attr};
use crate::error::{OligoError, Result};

pub struct TableWriter {
    out: BufWriter<File>,
    motif_len: i32,
    pad_len: i32,
    attr_len: Vec<i32>,
    last_motif: Option<Vec<u8>>,
    strict: bool,
}

impl TableWriter {
    /// Opens `path` for writing and immediately emits the 160-byte header.
    pub fn create<P: AsRef<Path>>(
        path: P,
        magic: i32,
        motif_len: i32,
        pad_len: i32,
        attr_len: &[i32],
    ) -> Result<Self> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        out.write_all(&encode_header(magic, motif_len, pad_len, attr_len))?;
        Ok(Self {
            out,
            motif_len,
            pad_len,
            attr_len: attr_len.to_vec(),
            last_motif: None,
            strict: true,
        })
    }

    /// Disables the out-of-order check. Only use this when the caller has
    /// already guaranteed strictly ascending input.
    pub fn permissive(mut self) -> Self {
        self.strict = false;
        self
    }

    /// Appends one record. `motif.len()` must equal `motif_len` and
    /// `values.len()` must equal the number of declared attributes.
    pub fn write_entry(&mut self, motif: &[u8], values: &[i32]) -> Result<()> {
        if motif.len() != self.motif_len as usize {
            return Err(OligoError::BadInput(format!(
                "motif length {} does not match table motif_len {}",
                motif.len(),
                self.motif_len
            )));
        }
        if values.len() != self.attr_len.len() {
            return Err(OligoError::BadInput(format!(
                "{} values supplied, table declares {} attributes",
                values.len(),
                self.attr_len.len()
            )));
        }

        if let Some(prev) = &self.last_motif {
            if motif <= prev.as_slice() {
                if self.strict {
                    return Err(OligoError::OutOfOrder {
                        previous: String::from_utf8_lossy(prev).into_owned(),
                        next: String::from_utf8_lossy(motif).into_owned(),
                    });
                }
            }
        }

        self.out.write_all(motif)?;
        for (&width, &value) in self.attr_len.iter().zip(values) {
            let mut buf = [0u8; 4];
            write_attr(&mut buf[..width as usize], width, value);
            self.out.write_all(&buf[..width as usize])?;
        }
        if self.pad_len > 0 {
            let padding = vec![0u8; self.pad_len as usize];
            self.out.write_all(&padding)?;
        }

        self.last_motif = Some(motif.to_vec());
        Ok(())
    }

    /// Flushes and releases the output file.
    pub fn close(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableFile;

    #[test]
    fn writes_header_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.bin");

        let mut w = TableWriter::create(&path, 1, 4, 0, &[4, 2]).unwrap();
        w.write_entry(b"AAAA", &[10, 20]).unwrap();
        w.write_entry(b"AAAB", &[-5, 30]).unwrap();
        w.close().unwrap();

        let tf = TableFile::open(&path).unwrap();
        assert_eq!(tf.len(), 2);
        assert_eq!(tf.motif_at(0), b"AAAA");
        assert_eq!(tf.attrs_at(0), vec![10, 20]);
        assert_eq!(tf.attrs_at(1), vec![-5, 30]);
    }

    #[test]
    fn rejects_out_of_order_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.bin");
        let mut w = TableWriter::create(&path, 1, 4, 0, &[4]).unwrap();
        w.write_entry(b"BBBB", &[1]).unwrap();
        let err = w.write_entry(b"AAAA", &[2]).unwrap_err();
        assert!(matches!(err, OligoError::OutOfOrder { .. }));
    }

    #[test]
    fn rejects_duplicate_motif() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.bin");
        let mut w = TableWriter::create(&path, 1, 4, 0, &[4]).unwrap();
        w.write_entry(b"AAAA", &[1]).unwrap();
        let err = w.write_entry(b"AAAA", &[2]).unwrap_err();
        assert!(matches!(err, OligoError::OutOfOrder { .. }));
    }

    #[test]
    fn permissive_mode_skips_ordering_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.bin");
        let mut w = TableWriter::create(&path, 1, 4, 0, &[4]).unwrap().permissive();
        w.write_entry(b"BBBB", &[1]).unwrap();
        w.write_entry(b"AAAA", &[2]).unwrap();
        w.close().unwrap();
    }

    proptest::proptest! {
        // P1: writing a sorted, deduplicated list of (motif, value) pairs and
        // reading it back reproduces exactly that list.
        #[test]
        fn round_trips_arbitrary_sorted_records(
            mut keys in proptest::collection::vec(proptest::prelude::any::<u32>(), 1..30),
            values in proptest::collection::vec(proptest::prelude::any::<i32>(), 1..30),
        ) {
            keys.sort_unstable();
            keys.dedup();
            let n = keys.len().min(values.len());
            proptest::prop_assume!(n > 0);

            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("table.bin");
            let mut w = TableWriter::create(&path, 1, 4, 0, &[4]).unwrap();
            for i in 0..n {
                w.write_entry(&keys[i].to_be_bytes(), &[values[i]]).unwrap();
            }
            w.close().unwrap();

            let tf = TableFile::open(&path).unwrap();
            proptest::prop_assert_eq!(tf.len(), n);
            for i in 0..n {
                proptest::prop_assert_eq!(tf.motif_at(i), keys[i].to_be_bytes().as_slice());
                proptest::prop_assert_eq!(tf.attrs_at(i), vec![values[i]]);
            }
        }
    }
}
