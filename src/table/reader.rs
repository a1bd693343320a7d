/// table/reader.rs — the mapped read side, grounded on
/// `original_source/table.c`'s `map_table`/`unmap_table` and
/// `kmers.cc`'s `Kmers::find_hit` attribute decoding.
use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::codec::{decode_header, read_attr, Header, HEADER_SIZE};
use crate::error::{OligoError, Result};

pub struct TableFile {
    mmap: Mmap,
    header: Header,
    len: usize,
    debug: bool,
}

impl TableFile {
    /// Opens and memory-maps `path` read-only, validating the header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OligoError::NotFound(path.to_path_buf())
            } else {
                OligoError::Io(e)
            }
        })?;

        // SAFETY: the file is opened read-only and not expected to be
        // mutated concurrently by another process while mapped.
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < HEADER_SIZE {
            return Err(OligoError::BadFormat(format!(
                "file too short for header: {} bytes",
                mmap.len()
            )));
        }
        let header_bytes: [u8; HEADER_SIZE] = mmap[..HEADER_SIZE].try_into().unwrap();
        let header = decode_header(&header_bytes)?;

        let body_len = mmap.len() - HEADER_SIZE;
        let entry_len = header.data_entry_len as usize;
        if entry_len == 0 || body_len % entry_len != 0 {
            return Err(OligoError::BadFormat(format!(
                "record count not integral: body {body_len} bytes, entry {entry_len} bytes"
            )));
        }
        let len = body_len / entry_len;

        let debug = std::env::var_os("DEBUG").is_some();
        if debug {
            eprintln!(
                "TableFile::open {}: motif_len={} num_attrs={} records={}",
                path.display(),
                header.motif_len,
                header.num_attrs,
                len
            );
        }

        Ok(Self { mmap, header, len, debug })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    fn record_at(&self, i: usize) -> &[u8] {
        let entry_len = self.header.data_entry_len as usize;
        let start = HEADER_SIZE + i * entry_len;
        &self.mmap[start..start + entry_len]
    }

    /// Zero-copy view of the motif bytes at record `i`.
    pub fn motif_at(&self, i: usize) -> &[u8] {
        let motif_len = self.header.motif_len as usize;
        &self.record_at(i)[..motif_len]
    }

    /// Decodes the attribute tuple at record `i`.
    pub fn attrs_at(&self, i: usize) -> Vec<i32> {
        let record = self.record_at(i);
        let motif_len = self.header.motif_len as usize;
        let mut cur = motif_len;
        let mut out = Vec::with_capacity(self.header.num_attrs as usize);
        for &width in self.header.attr_widths() {
            let w = width as usize;
            out.push(read_attr(&record[cur..cur + w], width));
            cur += w;
        }
        if self.debug {
            eprintln!("attrs_at({i}) -> {out:?}");
        }
        out
    }
}
