/// table/search.rs — binary search over a mapped table, grounded on
/// `original_source/table.c`'s `find_in_range`.
///
/// The legacy comment on `find_in_range` claims it returns "the first item
/// equal to or greater than" the query; the actual implementation only ever
/// returns an exact match or -1. This crate keeps that exact-match contract
/// for `find`, and exposes `lower_bound` separately for callers that want
/// the "first >=" insertion point instead.
use crate::table::TableFile;

/// Returns the index of a record whose motif equals `motif`, or `None`.
pub fn find(table: &TableFile, motif: &[u8]) -> Option<usize> {
    let n = table.len();
    if n == 0 {
        return None;
    }
    let mut beg = 0usize;
    let mut end = n - 1;
    loop {
        let mid = (beg + end) / 2;
        match motif.cmp(table.motif_at(mid)) {
            std::cmp::Ordering::Equal => return Some(mid),
            std::cmp::Ordering::Less => {
                if mid == beg {
                    return None;
                }
                end = mid - 1;
            }
            std::cmp::Ordering::Greater => {
                if mid == end {
                    return None;
                }
                beg = mid + 1;
            }
        }
        if beg > end {
            return None;
        }
    }
}

/// Returns the index of the first record whose motif is `>= motif`, or
/// `table.len()` if every record is smaller.
pub fn lower_bound(table: &TableFile, motif: &[u8]) -> usize {
    let mut lo = 0usize;
    let mut hi = table.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if table.motif_at(mid) < motif {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableWriter;

    fn build(motifs: &[&[u8]]) -> TableFile {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.bin");
        let mut w = TableWriter::create(&path, 1, 4, 0, &[4]).unwrap();
        for (i, m) in motifs.iter().enumerate() {
            w.write_entry(m, &[i as i32]).unwrap();
        }
        w.close().unwrap();
        // leak the tempdir so the mapped file stays valid for the test body
        let tf = TableFile::open(&path).unwrap();
        std::mem::forget(dir);
        tf
    }

    #[test]
    fn finds_present_motifs() {
        let tf = build(&[b"AAAA", b"CCCC", b"GGGG", b"TTTT"]);
        assert_eq!(find(&tf, b"AAAA"), Some(0));
        assert_eq!(find(&tf, b"GGGG"), Some(2));
        assert_eq!(find(&tf, b"TTTT"), Some(3));
    }

    #[test]
    fn misses_absent_motifs() {
        let tf = build(&[b"AAAA", b"CCCC", b"GGGG", b"TTTT"]);
        assert_eq!(find(&tf, b"AAAC"), None);
        assert_eq!(find(&tf, b"0000"), None);
        assert_eq!(find(&tf, b"ZZZZ"), None);
    }

    #[test]
    fn finds_on_single_record_table() {
        let tf = build(&[b"MMMM"]);
        assert_eq!(find(&tf, b"MMMM"), Some(0));
        assert_eq!(find(&tf, b"AAAA"), None);
    }

    #[test]
    fn lower_bound_gives_insertion_point() {
        let tf = build(&[b"AAAA", b"CCCC", b"GGGG", b"TTTT"]);
        assert_eq!(lower_bound(&tf, b"BBBB"), 1);
        assert_eq!(lower_bound(&tf, b"AAAA"), 0);
        assert_eq!(lower_bound(&tf, b"ZZZZ"), 4);
    }
}
