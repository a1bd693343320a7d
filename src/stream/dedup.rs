use crate::error::Result;

/// Collapses consecutive, byte-identical lines to one, matching
/// `original_source/usable_motifs.cc`'s `uniq_reader`.
pub struct DedupLines<I> {
    inner: I,
    prev: Option<String>,
}

impl<I> DedupLines<I> {
    pub fn new(inner: I) -> Self {
        Self { inner, prev: None }
    }
}

impl<I: Iterator<Item = Result<String>>> Iterator for DedupLines<I> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(line) => {
                    if self.prev.as_deref() == Some(line.as_str()) {
                        continue;
                    }
                    self.prev = Some(line.clone());
                    return Some(Ok(line));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_lines(lines: &[&str]) -> Vec<Result<String>> {
        lines.iter().map(|s| Ok(s.to_string())).collect()
    }

    #[test]
    fn collapses_consecutive_duplicates() {
        let input = ok_lines(&["a", "a", "b", "b", "b", "a"]);
        let out: Vec<String> = DedupLines::new(input.into_iter())
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(out, vec!["a", "b", "a"]);
    }

    #[test]
    fn idempotent_on_already_deduped_input() {
        let once: Vec<String> = DedupLines::new(ok_lines(&["a", "a", "b"]).into_iter())
            .map(|r| r.unwrap())
            .collect();
        let once_as_results: Vec<Result<String>> = once.iter().cloned().map(Ok).collect();
        let twice: Vec<String> = DedupLines::new(once_as_results.into_iter())
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(once, twice);
    }
}
