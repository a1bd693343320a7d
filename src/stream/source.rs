use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Stdin};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::error::{OligoError, Result};

/// A single input, either a raw file, a gzip-compressed file, or stdin.
enum FileStream {
    Raw(BufReader<File>),
    Gz(BufReader<GzDecoder<File>>),
    Stdin(BufReader<Stdin>),
}

impl FileStream {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OligoError::NotFound(path.to_path_buf())
            } else {
                OligoError::Io(e)
            }
        })?;
        if path.extension().and_then(|e| e.to_str()) == Some("gz") {
            Ok(FileStream::Gz(BufReader::new(GzDecoder::new(file))))
        } else {
            Ok(FileStream::Raw(BufReader::new(file)))
        }
    }

    fn stdin() -> Self {
        FileStream::Stdin(BufReader::new(std::io::stdin()))
    }

    /// Reads one line into `buf`, returning the number of bytes read (0 at EOF).
    fn read_line_into(&mut self, buf: &mut String) -> Result<usize> {
        let n = match self {
            FileStream::Raw(r) => r.read_line(buf)?,
            FileStream::Gz(r) => r.read_line(buf)?,
            FileStream::Stdin(r) => r.read_line(buf)?,
        };
        Ok(n)
    }
}

/// Concatenates a declared list of input files (or a single ad-hoc source)
/// into one continuous line stream. `.gz`-suffixed files are decompressed
/// transparently; buffers grow dynamically, so there is no fixed-size line
/// truncation.
pub struct StreamSource {
    pending: VecDeque<PathBuf>,
    current: Option<FileStream>,
}

impl StreamSource {
    /// Opens a "source declaration file": a text file listing one input
    /// path per line, read in order. Every declared path is validated to
    /// exist before the first line is consumed.
    pub fn open_declaration<P: AsRef<Path>>(decl_path: P) -> Result<Self> {
        let decl_path = decl_path.as_ref();
        let text = std::fs::read_to_string(decl_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OligoError::NotFound(decl_path.to_path_buf())
            } else {
                OligoError::Io(e)
            }
        })?;

        let mut pending = VecDeque::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let p = PathBuf::from(line);
            if !p.exists() {
                return Err(OligoError::NotFound(p));
            }
            pending.push_back(p);
        }

        let mut src = StreamSource { pending, current: None };
        src.advance_file()?;
        Ok(src)
    }

    /// Wraps a single file (or stdin, via `-`) as a stream, skipping the
    /// declaration-list indirection. Used by the usable-motif selector,
    /// whose CLI surface takes one input path directly.
    pub fn open_single(path: &str) -> Result<Self> {
        let current = if path == "-" {
            Some(FileStream::stdin())
        } else {
            Some(FileStream::open(Path::new(path))?)
        };
        Ok(StreamSource { pending: VecDeque::new(), current })
    }

    fn advance_file(&mut self) -> Result<bool> {
        match self.pending.pop_front() {
            None => {
                self.current = None;
                Ok(false)
            }
            Some(p) => {
                self.current = Some(FileStream::open(&p)?);
                Ok(true)
            }
        }
    }

    /// Returns the next line with trailing newline/carriage-return stripped,
    /// or `None` once every declared file has reached EOF.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            match &mut self.current {
                None => return Ok(None),
                Some(stream) => {
                    let mut buf = String::new();
                    let n = stream.read_line_into(&mut buf)?;
                    if n == 0 {
                        if !self.advance_file()? {
                            return Ok(None);
                        }
                        continue;
                    }
                    while buf.ends_with('\n') || buf.ends_with('\r') {
                        buf.pop();
                    }
                    return Ok(Some(buf));
                }
            }
        }
    }
}

/// Adapts a `StreamSource` into a fallible line iterator.
impl Iterator for StreamSource {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
