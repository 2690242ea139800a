//! The three level entry tree of a VPK index.
//!
//! Nodes are stored in one flat vector per level. Because the tree is written depth first, the
//! children of every node form a contiguous range in the next level, and every child keeps the
//! index of its parent.

use binrw::BinRead;
use byteorder::ReadBytesExt;
use std::{
    io::{Read, Seek},
    ops::Range,
};
use tracing::{debug, instrument};

use crate::{
    error::{truncated, truncated_binrw, Error, Result},
    types::{VpkFileInfo, ENTRY_TERMINATOR},
};

/// An extension, the first level of the tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionNode {
    /// Name of the extension, without the leading dot
    pub name: Box<str>,
    /// Indexes of this extension's directories
    pub directories: Range<usize>,
}

/// A directory, the second level of the tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryNode {
    /// Name of the directory. May itself contain `/`
    pub name: Box<str>,
    /// Index of the parent extension
    pub extension: usize,
    /// Indexes of this directory's files
    pub files: Range<usize>,
}

/// A file, the last level of the tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileNode {
    /// Name of the file, without directory or extension
    pub name: Box<str>,
    /// Raw file name. To be used when name was incorrectly decoded.
    pub name_raw: Box<[u8]>,
    /// Index of the parent directory
    pub directory: usize,
    /// Location and size of the file data
    pub info: VpkFileInfo,
    /// Bytes stored in the tree directly after the file info
    pub preload: Box<[u8]>,
}

/// Decoded entry tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VpkTree {
    extensions: Vec<ExtensionNode>,
    directories: Vec<DirectoryNode>,
    files: Vec<FileNode>,
}

impl VpkTree {
    /// Decode a tree from the current position of the reader.
    ///
    /// Stops after the empty name closing the extension list.
    #[instrument(skip_all, err)]
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<VpkTree> {
        let mut tree = VpkTree::default();

        loop {
            let name = read_name(reader)?;
            if name.is_empty() {
                break;
            }

            let extension = tree.extensions.len();
            let start = tree.directories.len();
            tree.extensions.push(ExtensionNode {
                name: decode_name(&name),
                directories: start..start,
            });

            tree.read_directories(reader, extension)?;
            tree.extensions[extension].directories.end = tree.directories.len();
        }

        debug!(
            extensions = tree.extensions.len(),
            directories = tree.directories.len(),
            files = tree.files.len(),
            "decoded tree"
        );

        Ok(tree)
    }

    fn read_directories<R: Read + Seek>(&mut self, reader: &mut R, extension: usize) -> Result<()> {
        loop {
            let name = read_name(reader)?;
            if name.is_empty() {
                return Ok(());
            }

            let directory = self.directories.len();
            let start = self.files.len();
            self.directories.push(DirectoryNode {
                name: decode_name(&name),
                extension,
                files: start..start,
            });

            self.read_files(reader, directory)?;
            self.directories[directory].files.end = self.files.len();
        }
    }

    fn read_files<R: Read + Seek>(&mut self, reader: &mut R, directory: usize) -> Result<()> {
        loop {
            let name = read_name(reader)?;
            if name.is_empty() {
                return Ok(());
            }

            let info = VpkFileInfo::read(reader).map_err(truncated_binrw("tree"))?;
            if info.terminator != ENTRY_TERMINATOR {
                return Err(Error::CorruptEntry(format!(
                    "entry {} ended with {:#06x} instead of {:#06x}",
                    String::from_utf8_lossy(&name),
                    info.terminator,
                    ENTRY_TERMINATOR
                )));
            }

            let mut preload = vec![0u8; info.preload_len()];
            reader.read_exact(&mut preload).map_err(truncated("tree"))?;

            self.files.push(FileNode {
                name: decode_name(&name),
                name_raw: name.into(),
                directory,
                info,
                preload: preload.into(),
            });
        }
    }

    /// Number of files in the tree
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the tree holds no files
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn extensions(&self) -> &[ExtensionNode] {
        &self.extensions
    }

    pub fn directories(&self) -> &[DirectoryNode] {
        &self.directories
    }

    /// All files, in the order they appear in the index
    pub fn files(&self) -> &[FileNode] {
        &self.files
    }

    pub fn file(&self, index: usize) -> Option<&FileNode> {
        self.files.get(index)
    }

    /// Parent directory of a file
    pub fn directory_of(&self, file: &FileNode) -> &DirectoryNode {
        &self.directories[file.directory]
    }

    /// Parent extension of a file
    pub fn extension_of(&self, file: &FileNode) -> &ExtensionNode {
        &self.extensions[self.directory_of(file).extension]
    }

    /// Logical path of a file, `directory/file.extension`
    pub fn file_path(&self, file: &FileNode) -> String {
        format!(
            "{}/{}.{}",
            self.directory_of(file).name,
            file.name,
            self.extension_of(file).name
        )
    }

    /// Find the single file whose logical path is exactly `path`.
    ///
    /// More than one match is reported as [`Error::AmbiguousPath`].
    pub fn find_exact(&self, path: &str) -> Result<Option<usize>> {
        let mut matches = self
            .files
            .iter()
            .enumerate()
            .filter(|(_, file)| self.path_matches(file, path))
            .map(|(index, _)| index);

        let Some(first) = matches.next() else {
            return Ok(None);
        };

        let others = matches.count();
        if others > 0 {
            return Err(Error::AmbiguousPath {
                path: path.to_owned(),
                count: others + 1,
            });
        }

        Ok(Some(first))
    }

    /// Every file in a directory named `directory` or nested below it, in tree order.
    pub fn find_under_directory(&self, directory: &str) -> Vec<usize> {
        self.directories
            .iter()
            .filter(|dir| is_same_or_nested(&dir.name, directory))
            .flat_map(|dir| dir.files.clone())
            .collect()
    }

    fn path_matches(&self, file: &FileNode, path: &str) -> bool {
        let directory = self.directory_of(file);
        let extension = self.extension_of(file);

        path.strip_prefix(&*directory.name)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|rest| rest.strip_prefix(&*file.name))
            .and_then(|rest| rest.strip_prefix('.'))
            .is_some_and(|rest| rest == &*extension.name)
    }
}

fn is_same_or_nested(name: &str, directory: &str) -> bool {
    name.strip_prefix(directory)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn read_name<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut name = Vec::new();
    loop {
        let char = reader.read_u8().map_err(truncated("tree"))?;
        if char == b'\0' {
            break;
        }
        name.push(char);
    }
    Ok(name)
}

fn decode_name(raw: &[u8]) -> Box<str> {
    String::from_utf8_lossy(raw).into()
}
