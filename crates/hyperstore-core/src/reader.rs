//! Tab-separated input files
//!
//! Data files are newline-delimited, tab-separated text, optionally
//! compressed with gzip, bzip2 or xz. Compression is detected from the
//! leading magic bytes, not from the file extension. Lines starting with `#`
//! are comments; the first non-comment line is the header.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";
const XZ_MAGIC: &[u8] = &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00];

/// Content encoding of a data file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
}

impl Compression {
    /// Guess the encoding from the first bytes of a stream
    pub fn sniff(head: &[u8]) -> Self {
        if head.starts_with(GZIP_MAGIC) {
            Self::Gzip
        } else if head.starts_with(XZ_MAGIC) {
            Self::Xz
        } else if head.starts_with(BZIP2_MAGIC) {
            Self::Bzip2
        } else {
            Self::None
        }
    }
}

/// Column names of a data file, in file order
#[derive(Debug, Clone)]
pub struct Header {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl Header {
    pub fn new(columns: Vec<String>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { columns, index }
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// One data line split into its columns
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// 1-based physical line number
    pub line: usize,
    pub values: Vec<String>,
}

/// Forward-only reader over the rows of a tabular file
pub struct TabularReader {
    name: String,
    source: Option<Box<dyn BufRead + Send>>,
    header: Header,
    line: usize,
}

impl std::fmt::Debug for TabularReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabularReader")
            .field("name", &self.name)
            .field("header", &self.header)
            .field("line", &self.line)
            .finish()
    }
}

impl TabularReader {
    /// Open a file, transparently decompressing it
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut buffered = BufReader::new(file);
        let compression = {
            let head = buffered.fill_buf().map_err(|e| Error::io(path, e))?;
            Compression::sniff(head)
        };
        tracing::debug!("Data file {} detected as {:?}", path.display(), compression);

        let source: Box<dyn BufRead + Send> = match compression {
            Compression::None => Box::new(buffered),
            Compression::Gzip => {
                Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(buffered)))
            }
            Compression::Bzip2 => {
                Box::new(BufReader::new(bzip2::read::MultiBzDecoder::new(buffered)))
            }
            Compression::Xz => Box::new(BufReader::new(xz2::read::XzDecoder::new_multi_decoder(
                buffered,
            ))),
        };

        Self::from_buf_read(source, path.display().to_string())
    }

    /// Wrap an already opened, uncompressed stream
    pub fn from_reader(reader: impl Read + Send + 'static, name: impl Into<String>) -> Result<Self> {
        Self::from_buf_read(Box::new(BufReader::new(reader)), name.into())
    }

    fn from_buf_read(source: Box<dyn BufRead + Send>, name: String) -> Result<Self> {
        let mut reader = Self {
            name,
            source: Some(source),
            header: Header::new(Vec::new()),
            line: 0,
        };

        match reader.next_data_line()? {
            Some(line) => {
                reader.header = Header::new(split_columns(&line));
                Ok(reader)
            }
            None => Err(Error::MissingHeader(reader.name)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Line number of the last line read
    pub fn line(&self) -> usize {
        self.line
    }

    /// Read the next row. A row whose column count differs from the header
    /// is an error. The underlying stream is released at end of input.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        let Some(line) = self.next_data_line()? else {
            return Ok(None);
        };

        let values = split_columns(&line);
        if values.len() != self.header.len() {
            let err = Error::ColumnCount {
                file: self.name.clone(),
                line: self.line,
                expected: self.header.len(),
                found: values.len(),
            };
            tracing::error!("{}", err);
            self.source = None;
            return Err(err);
        }

        Ok(Some(Row {
            line: self.line,
            values,
        }))
    }

    fn next_data_line(&mut self) -> Result<Option<String>> {
        loop {
            let Some(source) = self.source.as_mut() else {
                return Ok(None);
            };

            let mut buf = String::new();
            let read = source
                .read_line(&mut buf)
                .map_err(|e| Error::io(&self.name, e))?;
            if read == 0 {
                self.source = None;
                return Ok(None);
            }
            self.line += 1;

            let trimmed = buf.trim_end_matches(['\n', '\r']);
            if trimmed.starts_with('#') || trimmed.is_empty() {
                continue;
            }
            return Ok(Some(trimmed.to_string()));
        }
    }
}

fn split_columns(line: &str) -> Vec<String> {
    line.split('\t').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn reader(text: &'static str) -> Result<TabularReader> {
        TabularReader::from_reader(Cursor::new(text.as_bytes()), "test.tsv")
    }

    #[test]
    fn test_header_after_comments() {
        let r = reader("# generated\n# by hand\nid\tname\nA\tAlpha\n").unwrap();
        assert_eq!(r.header().columns(), &["id".to_string(), "name".to_string()]);
        assert_eq!(r.header().position("name"), Some(1));
        assert_eq!(r.line(), 3);
    }

    #[test]
    fn test_rows_skip_comments_and_keep_line_numbers() {
        let mut r = reader("id\tname\nA\tAlpha\n# skipped\r\nB\tBeta\r\n").unwrap();
        let first = r.next_row().unwrap().unwrap();
        assert_eq!(first.line, 2);
        assert_eq!(first.values, vec!["A", "Alpha"]);
        let second = r.next_row().unwrap().unwrap();
        assert_eq!(second.line, 4);
        assert_eq!(second.values, vec!["B", "Beta"]);
        assert!(r.next_row().unwrap().is_none());
        assert!(r.next_row().unwrap().is_none());
    }

    #[test]
    fn test_missing_header() {
        let err = reader("# only comments\n").unwrap_err();
        assert!(matches!(err, Error::MissingHeader(_)));
    }

    #[test]
    fn test_column_count_mismatch() {
        let mut r = reader("id\tname\nA\tAlpha\textra\n").unwrap();
        let err = r.next_row().unwrap_err();
        match err {
            Error::ColumnCount {
                line,
                expected,
                found,
                ..
            } => {
                assert_eq!(line, 2);
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sniff() {
        assert_eq!(Compression::sniff(&[0x1f, 0x8b, 0x08]), Compression::Gzip);
        assert_eq!(Compression::sniff(b"BZh91AY"), Compression::Bzip2);
        assert_eq!(
            Compression::sniff(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00, 0x00]),
            Compression::Xz
        );
        assert_eq!(Compression::sniff(b"id\tname"), Compression::None);
    }

    #[test]
    fn test_open_gzip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genes.tsv.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(b"id\tsymbol\n1\tBRCA1\n").unwrap();
        encoder.finish().unwrap();

        let mut r = TabularReader::open(&path).unwrap();
        assert_eq!(r.header().len(), 2);
        let row = r.next_row().unwrap().unwrap();
        assert_eq!(row.values, vec!["1", "BRCA1"]);
    }

    #[test]
    fn test_open_bzip2_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genes.tsv.bz2");
        let file = File::create(&path).unwrap();
        let mut encoder = bzip2::write::BzEncoder::new(file, bzip2::Compression::default());
        encoder
            .write_all(b"# exported\nid\tsymbol\n1\tBRCA1\n2\tTP53\n")
            .unwrap();
        encoder.finish().unwrap();

        let mut r = TabularReader::open(&path).unwrap();
        assert_eq!(r.header().columns(), &["id".to_string(), "symbol".to_string()]);
        assert_eq!(r.next_row().unwrap().unwrap().values, vec!["1", "BRCA1"]);
        let row = r.next_row().unwrap().unwrap();
        assert_eq!(row.values, vec!["2", "TP53"]);
        assert_eq!(row.line, 4);
        assert!(r.next_row().unwrap().is_none());
    }

    #[test]
    fn test_open_xz_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genes.tsv.xz");
        let file = File::create(&path).unwrap();
        let mut encoder = xz2::write::XzEncoder::new(file, 6);
        encoder.write_all(b"id\tsymbol\n1\tBRCA1\n").unwrap();
        encoder.finish().unwrap();

        let mut r = TabularReader::open(&path).unwrap();
        assert_eq!(r.header().len(), 2);
        assert_eq!(r.next_row().unwrap().unwrap().values, vec!["1", "BRCA1"]);
        assert!(r.next_row().unwrap().is_none());
    }

    #[test]
    fn test_open_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.tsv");
        std::fs::write(&path, "a\tb\nx\ty\n").unwrap();
        let mut r = TabularReader::open(&path).unwrap();
        assert_eq!(r.next_row().unwrap().unwrap().values, vec!["x", "y"]);
    }
}
