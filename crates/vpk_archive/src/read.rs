//! Types for reading VPK indexes
//!

use byteorder::{LittleEndian, ReadBytesExt};
use std::{
    fmt::{self, Debug},
    fs::File,
    io::{BufReader, Read, Seek},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

use crate::{
    error::{truncated, Error, FileNotFoundError, Result},
    extract::EntryReader,
    tree::{FileNode, VpkTree},
    types::{VpkFileInfo, VpkHeader, SIGNATURE},
};

/// Read-only view of a single file in the tree
#[derive(Clone, Copy)]
pub struct VpkEntry<'a> {
    index: usize,
    tree: &'a VpkTree,
    node: &'a FileNode,
}

impl Debug for VpkEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "VpkEntry({}, {:?})", self.path(), self.node.info)
    }
}

impl<'a> VpkEntry<'a> {
    /// Position of the file in tree order
    pub fn index(&self) -> usize {
        self.index
    }

    /// Get the name of the file, without directory or extension
    pub fn name(&self) -> &'a str {
        &self.node.name
    }

    /// Get the name of the file, in the raw (internal) byte representation.
    ///
    /// The encoding of this data is currently undefined.
    pub fn name_raw(&self) -> &'a [u8] {
        &self.node.name_raw
    }

    pub fn extension(&self) -> &'a str {
        &self.tree.extension_of(self.node).name
    }

    pub fn directory(&self) -> &'a str {
        &self.tree.directory_of(self.node).name
    }

    /// Get the logical path of the file, `directory/file.extension`
    ///
    /// # Warnings
    ///
    /// It is dangerous to use this path directly when extracting an archive.
    /// Directory names are free form and may break out of the current directory
    /// (`../runtime`). Use [`crate::extract::destination_path`] to join it below a
    /// target directory.
    pub fn path(&self) -> String {
        self.tree.file_path(self.node)
    }

    /// Get the CRC32 hash of the original file. It is not verified.
    pub fn crc32(&self) -> u32 {
        self.node.info.crc
    }

    pub fn preload_bytes(&self) -> i16 {
        self.node.info.preload_bytes
    }

    /// Bytes stored in the index directly after the file info
    pub fn preload(&self) -> &'a [u8] {
        &self.node.preload
    }

    pub fn archive_index(&self) -> i16 {
        self.node.info.archive_index
    }

    pub fn entry_offset(&self) -> u32 {
        self.node.info.entry_offset
    }

    pub fn entry_length(&self) -> u32 {
        self.node.info.entry_length
    }

    /// Total size of the file, preload included
    pub fn size(&self) -> u64 {
        self.node.info.preload_len() as u64 + self.node.info.entry_length as u64
    }

    /// Whether the data is stored in the index file rather than a numbered archive
    pub fn is_inline(&self) -> bool {
        self.node.info.is_inline()
    }

    pub fn info(&self) -> &'a VpkFileInfo {
        &self.node.info
    }
}

/// A struct for reading an entry from a VPK package
pub struct VpkFile<'a, R: Read + Seek> {
    entry: VpkEntry<'a>,
    reader: EntryReader<'a, R>,
}

impl<R: Read + Seek> Debug for VpkFile<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "VpkFile({:#?})", self.entry)
    }
}

impl<'a, R: Read + Seek> VpkFile<'a, R> {
    /// Metadata of the file being read
    pub fn entry(&self) -> VpkEntry<'a> {
        self.entry
    }
}

impl<R: Read + Seek> Read for VpkFile<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Outcome of looking up a requested path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The request named a single file
    File(usize),
    /// The request named a directory, holding these files
    Directory(Vec<usize>),
    /// Nothing matched the request
    NotFound,
}

impl Resolution {
    /// Indexes of every resolved file, in tree order
    pub fn files(&self) -> Vec<usize> {
        match self {
            Resolution::File(index) => vec![*index],
            Resolution::Directory(files) => files.clone(),
            Resolution::NotFound => Vec::new(),
        }
    }
}

/// VPK index reader
///
/// ```no_run
/// use std::io::prelude::*;
///
/// fn list_vpk_contents() -> vpk_archive::error::Result<()> {
///     let mut vpk = vpk_archive::VpkArchive::open("pak01_dir.vpk")?;
///
///     for i in 0..vpk.len() {
///         let mut file = vpk.by_index(i)?;
///         println!("Filename: {}", file.entry().path());
///         std::io::copy(&mut file, &mut std::io::stdout())?;
///     }
///
///     Ok(())
/// }
/// ```
pub struct VpkArchive<R> {
    pub(crate) reader: R,
    pub(crate) index_path: Option<PathBuf>,
    pub(crate) header: VpkHeader,
    pub(crate) tree: VpkTree,
}

impl VpkArchive<BufReader<File>> {
    /// Open an index file from disk.
    ///
    /// The path is kept to locate the numbered data archives next to it.
    #[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        Ok(Self::new(reader)?.with_index_path(path))
    }
}

impl<R> VpkArchive<R> {
    /// Set the path used to locate numbered data archives.
    pub fn with_index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_path = Some(path.into());
        self
    }

    pub fn index_path(&self) -> Option<&Path> {
        self.index_path.as_deref()
    }

    pub fn header(&self) -> &VpkHeader {
        &self.header
    }

    pub fn version(&self) -> u32 {
        self.header.version()
    }

    pub fn tree(&self) -> &VpkTree {
        &self.tree
    }

    /// Number of files contained in this VPK.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether this VPK contains no files
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the metadata of a file by index, if it's present.
    pub fn entry(&self, index: usize) -> Option<VpkEntry<'_>> {
        self.tree.file(index).map(|node| VpkEntry {
            index,
            tree: &self.tree,
            node,
        })
    }

    /// Returns an iterator over every file, in tree order.
    pub fn entries(&self) -> impl Iterator<Item = VpkEntry<'_>> {
        let tree = &self.tree;
        tree.files()
            .iter()
            .enumerate()
            .map(move |(index, node)| VpkEntry { index, tree, node })
    }

    /// Returns an iterator over the logical paths of every file.
    pub fn file_paths(&self) -> impl Iterator<Item = String> + '_ {
        self.entries().map(|entry| entry.path())
    }

    /// Get the index of a file by its exact logical path, if it's present.
    pub fn index_for_name(&self, name: &str) -> Result<Option<usize>> {
        self.tree.find_exact(name)
    }

    /// Every file in the directory `name` or nested below it.
    pub fn files_under_directory(&self, name: &str) -> Vec<usize> {
        self.tree.find_under_directory(name)
    }

    /// Resolve a requested path, trying an exact file match before a directory match.
    #[instrument(skip(self), ret, err)]
    pub fn resolve(&self, request: &str) -> Result<Resolution> {
        if let Some(index) = self.tree.find_exact(request)? {
            return Ok(Resolution::File(index));
        }

        let files = self.tree.find_under_directory(request);
        if files.is_empty() {
            return Ok(Resolution::NotFound);
        }

        Ok(Resolution::Directory(files))
    }

    /// Unwrap and return the inner reader object
    ///
    /// The position of the reader is undefined.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> VpkArchive<R> {
    /// Read a VPK index, decoding the header and the full entry tree.
    pub fn new(mut reader: R) -> Result<VpkArchive<R>> {
        let signature = reader
            .read_u32::<LittleEndian>()
            .map_err(truncated("header"))?;
        if signature != SIGNATURE {
            return Err(Error::InvalidFormat(signature));
        }

        let version = reader
            .read_u32::<LittleEndian>()
            .map_err(truncated("header"))?;
        let header = VpkHeader::read_versioned(&mut reader, version)?;
        debug!(version, tree_length = header.tree_length(), "read header");

        let tree = VpkTree::read(&mut reader)?;

        Ok(VpkArchive {
            reader,
            index_path: None,
            header,
            tree,
        })
    }

    /// Search for a file by its exact logical path
    pub fn by_name(&mut self, name: &str) -> Result<VpkFile<'_, R>> {
        let Some(index) = self.tree.find_exact(name)? else {
            return Err(Error::FileNotFound(FileNotFoundError::Name(
                name.to_owned(),
            )));
        };
        self.by_index(index)
    }

    /// Get a contained file by index
    pub fn by_index(&mut self, file_number: usize) -> Result<VpkFile<'_, R>> {
        let node = self
            .tree
            .file(file_number)
            .ok_or(Error::FileNotFound(FileNotFoundError::Index(file_number)))?;

        let entry = VpkEntry {
            index: file_number,
            tree: &self.tree,
            node,
        };

        let reader = EntryReader::new(
            &mut self.reader,
            &self.header,
            self.index_path.as_deref(),
            entry,
        )?;

        Ok(VpkFile { entry, reader })
    }
}

#[cfg(test)]
mod test {
    use std::io::prelude::*;

    use pretty_assertions::assert_eq;

    use crate::{
        error::{Error, FileNotFoundError, Result},
        read::{Resolution, VpkArchive},
    };
    use std::io::Cursor;

    #[test]
    fn read_invalid_signature() {
        #[rustfmt::skip]
        let input = [
            0xEF, 0xBE, 0xAD, 0xDE,
            0x01, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            0x00,
        ];

        let archive = VpkArchive::new(Cursor::new(input));
        assert!(matches!(archive, Err(Error::InvalidFormat(0xDEADBEEF))));
    }

    #[test]
    fn read_unsupported_version() {
        #[rustfmt::skip]
        let input = [
            0x34, 0x12, 0xAA, 0x55,
            0x03, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            0x00,
        ];

        let archive = VpkArchive::new(Cursor::new(input));
        assert!(matches!(archive, Err(Error::UnsupportedVersion(3))));
    }

    #[test]
    fn read_short_header() {
        let archive = VpkArchive::new(Cursor::new([0x34, 0x12, 0xAA, 0x55, 0x02, 0x00]));
        assert!(matches!(archive, Err(Error::CorruptEntry(_))));

        let archive = VpkArchive::new(Cursor::new([0x34, 0x12]));
        assert!(matches!(archive, Err(Error::CorruptEntry(_))));
    }

    #[test]
    fn read_empty_v1() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0x34, 0x12, 0xAA, 0x55,
            0x01, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            0x00,
        ];

        let archive = VpkArchive::new(Cursor::new(input))?;
        assert!(archive.is_empty());
        assert_eq!(archive.version(), 1);
        assert_eq!(archive.header().tree_length(), 1);
        assert_eq!(archive.resolve("materials")?, Resolution::NotFound);

        Ok(())
    }

    #[test]
    fn read_empty_v2() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0x34, 0x12, 0xAA, 0x55,
            0x02, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00,
        ];

        let archive = VpkArchive::new(Cursor::new(input))?;
        assert!(archive.is_empty());
        assert_eq!(archive.version(), 2);
        assert_eq!(archive.header().data_start(), 29);

        Ok(())
    }

    #[rustfmt::skip]
    fn single_preload_v1() -> Vec<u8> {
        vec![
            // Header (12)
            0x34, 0x12, 0xAA, 0x55,
            0x01, 0x00, 0x00, 0x00,
            0x2F, 0x00, 0x00, 0x00,
            // Tree (47)
            b't', b'x', b't', 0x00,
            b'd', b'o', b'c', b's', 0x00,
            b'h', b'e', b'l', b'l', b'o', 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x0B, 0x00,
            0xFF, 0x7F,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0xFF, 0xFF,
            0x48, 0x65, 0x6C, 0x6C, 0x6F, 0x20, 0x57, 0x6F, 0x72, 0x6C, 0x64,
            0x00,
            0x00,
            0x00,
        ]
    }

    #[test]
    fn read_preload_entry() -> Result<()> {
        let mut archive = VpkArchive::new(Cursor::new(single_preload_v1()))?;
        assert_eq!(archive.len(), 1);
        assert_eq!(
            archive.file_paths().collect::<Vec<_>>(),
            vec!["docs/hello.txt"]
        );

        let mut buffer = Vec::new();

        let mut file = archive.by_name("docs/hello.txt")?;
        assert_eq!(file.entry().name(), "hello");
        assert_eq!(file.entry().directory(), "docs");
        assert_eq!(file.entry().extension(), "txt");
        assert_eq!(file.entry().size(), 11);

        file.read_to_end(&mut buffer)?;
        assert_eq!(buffer, b"Hello World");

        Ok(())
    }

    #[rustfmt::skip]
    fn single_inline_v1() -> Vec<u8> {
        vec![
            // Header (12)
            0x34, 0x12, 0xAA, 0x55,
            0x01, 0x00, 0x00, 0x00,
            0x21, 0x00, 0x00, 0x00,
            // Tree (33)
            b't', b'x', b't', 0x00,
            b'd', b'o', b'c', b's', 0x00,
            b'h', b'i', 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00,
            0xFF, 0x7F,
            0x02, 0x00, 0x00, 0x00,
            0x05, 0x00, 0x00, 0x00,
            0xFF, 0xFF,
            0x00,
            0x00,
            0x00,
            // Inline data
            b'?', b'?', b'w', b'o', b'r', b'l', b'd', b'?',
        ]
    }

    #[test]
    fn read_inline_entry() -> Result<()> {
        let mut archive = VpkArchive::new(Cursor::new(single_inline_v1()))?;
        assert_eq!(archive.header().data_start(), 45);

        let mut buffer = Vec::new();
        let mut file = archive.by_name("docs/hi.txt")?;
        assert!(file.entry().is_inline());

        file.read_to_end(&mut buffer)?;
        assert_eq!(buffer, b"world");

        Ok(())
    }

    #[test]
    fn resolve_file_and_directory() -> Result<()> {
        let archive = VpkArchive::new(Cursor::new(single_preload_v1()))?;

        assert_eq!(archive.resolve("docs/hello.txt")?, Resolution::File(0));
        assert_eq!(archive.resolve("docs")?, Resolution::Directory(vec![0]));
        assert_eq!(archive.resolve("doc")?, Resolution::NotFound);
        assert_eq!(archive.resolve("docs/hello.vmt")?.files(), Vec::<usize>::new());

        Ok(())
    }

    #[test]
    fn missing_entries() -> Result<()> {
        let mut archive = VpkArchive::new(Cursor::new(single_preload_v1()))?;

        assert!(matches!(
            archive.by_index(1),
            Err(Error::FileNotFound(FileNotFoundError::Index(1)))
        ));
        assert!(matches!(
            archive.by_name("docs/other.txt"),
            Err(Error::FileNotFound(FileNotFoundError::Name(_)))
        ));

        Ok(())
    }
}
