//! Opening inputs and the output stream, with compression picked by extension.

use crate::config::{READ_BUFFER_SIZE, WRITE_BUFFER_SIZE};
use anyhow::{Context, Result};
use bzip2::read::MultiBzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, StdoutLock, Write};
use std::path::Path;
use tracing::debug;

/// A named input stream. The name only shows up in diagnostics.
pub struct Source<R> {
    pub name: String,
    pub reader: R,
}

impl<R> Source<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    None,
    Gzip,
    Bzip2,
}

impl Compression {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("gz") => Compression::Gzip,
            Some("bz2") => Compression::Bzip2,
            _ => Compression::None,
        }
    }
}

/// Opens `path` for buffered reading, decompressing `.gz` and `.bz2` files.
pub fn open_source(path: &Path) -> Result<Source<Box<dyn BufRead>>> {
    let file = File::open(path).with_context(|| format!("Failed to open input: {:?}", path))?;
    let compression = Compression::from_path(path);
    debug!(path = ?path, compression = ?compression, "Opening input");

    let reader: Box<dyn BufRead> = match compression {
        Compression::Gzip => Box::new(BufReader::with_capacity(
            READ_BUFFER_SIZE,
            MultiGzDecoder::new(file),
        )),
        Compression::Bzip2 => Box::new(BufReader::with_capacity(
            READ_BUFFER_SIZE,
            MultiBzDecoder::new(file),
        )),
        Compression::None => Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file)),
    };

    Ok(Source::new(path.display().to_string(), reader))
}

/// Where joined records go: stdout, or a file compressed according to its extension.
pub enum OutputSink {
    Stdout(BufWriter<StdoutLock<'static>>),
    File(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Bzip2(BzEncoder<BufWriter<File>>),
}

impl OutputSink {
    pub fn create(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(OutputSink::Stdout(BufWriter::with_capacity(
                WRITE_BUFFER_SIZE,
                io::stdout().lock(),
            )));
        };

        let file =
            File::create(path).with_context(|| format!("Failed to create output: {:?}", path))?;
        let writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);

        Ok(match Compression::from_path(path) {
            Compression::Gzip => {
                OutputSink::Gzip(GzEncoder::new(writer, flate2::Compression::default()))
            }
            Compression::Bzip2 => {
                OutputSink::Bzip2(BzEncoder::new(writer, bzip2::Compression::default()))
            }
            Compression::None => OutputSink::File(writer),
        })
    }

    /// Flushes buffers and writes the compression trailer, surfacing errors a drop would swallow.
    pub fn finish(self) -> Result<()> {
        match self {
            OutputSink::Stdout(mut w) => w.flush()?,
            OutputSink::File(mut w) => w.flush()?,
            OutputSink::Gzip(encoder) => encoder.finish()?.flush()?,
            OutputSink::Bzip2(encoder) => encoder.finish()?.flush()?,
        }
        Ok(())
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Stdout(w) => w.write(buf),
            OutputSink::File(w) => w.write(buf),
            OutputSink::Gzip(w) => w.write(buf),
            OutputSink::Bzip2(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Stdout(w) => w.flush(),
            OutputSink::File(w) => w.flush(),
            OutputSink::Gzip(w) => w.flush(),
            OutputSink::Bzip2(w) => w.flush(),
        }
    }
}
