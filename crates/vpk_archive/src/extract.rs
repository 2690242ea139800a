//! Locating and copying the data of VPK entries.

use bon::Builder;
use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, warn};

use crate::{
    error::{Error, Result},
    read::{VpkArchive, VpkEntry, VpkFile},
    types::VpkHeader,
};

/// Size of the buffer used when copying entry data
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Options for how entries should be extracted
#[derive(Debug, Clone, Copy, Builder)]
pub struct ExtractOptions {
    /// Replace files that already exist at the destination
    #[builder(default)]
    pub overwrite: bool,

    /// Size of the buffer used when copying data
    #[builder(default = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Source of an entry's bytes, picked once when the entry is opened
pub(crate) enum EntryReader<'a, R: Read + Seek> {
    Preload(Cursor<&'a [u8]>),
    Index(io::Take<&'a mut R>),
    Archive(io::Take<BufReader<File>>),
}

impl<'a, R: Read + Seek> EntryReader<'a, R> {
    #[instrument(skip_all, fields(path = %entry.path()))]
    pub fn new(
        reader: &'a mut R,
        header: &VpkHeader,
        index_path: Option<&Path>,
        entry: VpkEntry<'a>,
    ) -> Result<Self> {
        let info = entry.info();

        if info.entry_length == 0 && info.preload_bytes > 0 {
            return Ok(EntryReader::Preload(Cursor::new(entry.preload())));
        }

        if info.preload_bytes > 0 {
            return Err(Error::UnsupportedEntryShape {
                path: entry.path(),
                preload_bytes: info.preload_bytes,
                entry_length: info.entry_length,
            });
        }

        if info.entry_length == 0 {
            let empty: &[u8] = &[];
            return Ok(EntryReader::Preload(Cursor::new(empty)));
        }

        let length = info.entry_length as u64;
        if info.is_inline() {
            let start = header.data_start() + info.entry_offset as u64;
            debug!(start, length, "reading from index");

            reader.seek(SeekFrom::Start(start))?;
            return Ok(EntryReader::Index(reader.take(length)));
        }

        let path = archive_path(
            index_path.ok_or(Error::MissingIndexPath)?,
            info.archive_index,
        )?;
        debug!(archive = %path.display(), offset = info.entry_offset, length, "reading from archive");

        let mut file = BufReader::new(File::open(&path)?);
        file.seek(SeekFrom::Start(info.entry_offset as u64))?;
        Ok(EntryReader::Archive(file.take(length)))
    }
}

impl<R: Read + Seek> Read for EntryReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            EntryReader::Preload(r) => r.read(buf),
            EntryReader::Index(r) => r.read(buf),
            EntryReader::Archive(r) => r.read(buf),
        }
    }
}

/// Path of the numbered data archive stored next to an index.
///
/// `pak01_dir.vpk` with archive 7 becomes `pak01_007.vpk`. Index names without the `_dir`
/// suffix only lose their `.vpk` extension.
pub fn archive_path(index_path: &Path, archive_index: i16) -> Result<PathBuf> {
    if !(0..=999).contains(&archive_index) {
        return Err(Error::InvalidArchiveIndex(archive_index));
    }

    let file_name = index_path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    let stem = file_name
        .strip_suffix("_dir.vpk")
        .or_else(|| file_name.strip_suffix(".vpk"))
        .unwrap_or(file_name.as_ref());

    Ok(index_path.with_file_name(format!("{stem}_{archive_index:03}.vpk")))
}

/// Join a logical entry path below `root`, one directory per `/` separated segment.
///
/// Segments that would escape `root` are rejected.
pub fn destination_path(root: &Path, logical: &str) -> Result<PathBuf> {
    let mut destination = root.to_path_buf();
    for segment in logical.split('/') {
        if segment.is_empty()
            || segment == "."
            || segment == ".."
            || segment.contains(['\\', ':'])
        {
            return Err(Error::InvalidEntryPath(logical.to_owned()));
        }
        destination.push(segment);
    }
    Ok(destination)
}

/// Copy `source` into `sink` one chunk at a time until the source is exhausted.
///
/// A short final chunk is written as is.
pub fn copy_entry<R: Read, W: Write>(
    source: &mut R,
    sink: &mut W,
    chunk_size: usize,
) -> io::Result<u64> {
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut written = 0u64;

    loop {
        let read = match source.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        sink.write_all(&buffer[..read])?;
        written += read as u64;
    }

    Ok(written)
}

fn copy_file<R: Read + Seek, W: Write>(
    file: &mut VpkFile<'_, R>,
    sink: &mut W,
    options: &ExtractOptions,
) -> Result<u64> {
    let expected = file.entry().size();
    let written = copy_entry(file, sink, options.chunk_size)?;

    if written < expected {
        warn!(
            path = %file.entry().path(),
            expected,
            written,
            "entry data ended before its declared length"
        );
    }

    Ok(written)
}

impl<R: Read + Seek> VpkArchive<R> {
    /// Copy the data of a file into `sink`, returning the number of bytes written.
    #[instrument(skip(self, sink), err)]
    pub fn extract<W: Write>(
        &mut self,
        index: usize,
        sink: &mut W,
        options: &ExtractOptions,
    ) -> Result<u64> {
        let mut file = self.by_index(index)?;
        copy_file(&mut file, sink, options)
    }

    /// Write a file below `root`, creating a directory for every segment of its logical path.
    ///
    /// Returns the path of the written file.
    #[instrument(skip(self, root), fields(root = %root.display()), err)]
    pub fn extract_to(
        &mut self,
        index: usize,
        root: &Path,
        options: &ExtractOptions,
    ) -> Result<PathBuf> {
        let mut file = self.by_index(index)?;
        let destination = destination_path(root, &file.entry().path())?;

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        let out = if options.overwrite {
            File::create(&destination)?
        } else {
            File::create_new(&destination)?
        };

        let mut out = BufWriter::new(out);
        copy_file(&mut file, &mut out, options)?;
        out.flush()?;

        Ok(destination)
    }
}
