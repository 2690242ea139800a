#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{Cursor, Write};
use vpk_archive::types::{VpkFileInfo, SIGNATURE};

struct Directory {
    name: String,
    files: Vec<(String, VpkFileInfo, Vec<u8>)>,
}

struct Extension {
    name: String,
    directories: Vec<Directory>,
}

/// Builds index files in memory, keeping the order entries are added in
pub struct IndexBuilder {
    version: u32,
    extensions: Vec<Extension>,
    inline: Vec<u8>,
}

impl IndexBuilder {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            extensions: Vec::new(),
            inline: Vec::new(),
        }
    }

    /// Add a file stored entirely in its preload bytes
    pub fn preload(self, path: (&str, &str, &str), data: &[u8]) -> Self {
        let info = VpkFileInfo {
            preload_bytes: data.len() as i16,
            archive_index: vpk_archive::types::DIRECTORY_ARCHIVE_INDEX,
            ..Default::default()
        };
        self.file(path, info, data)
    }

    /// Add a file stored in a numbered archive
    pub fn archived(self, path: (&str, &str, &str), archive_index: i16, offset: u32, length: u32) -> Self {
        let info = VpkFileInfo {
            archive_index,
            entry_offset: offset,
            entry_length: length,
            ..Default::default()
        };
        self.file(path, info, &[])
    }

    /// Add a file stored after the tree, appending its data to the inline section
    pub fn inline(mut self, path: (&str, &str, &str), data: &[u8]) -> Self {
        let info = VpkFileInfo {
            archive_index: vpk_archive::types::DIRECTORY_ARCHIVE_INDEX,
            entry_offset: self.inline.len() as u32,
            entry_length: data.len() as u32,
            ..Default::default()
        };
        self.inline.extend_from_slice(data);
        self.file(path, info, &[])
    }

    /// Add a file with an explicit record, `path` is `(extension, directory, name)`
    pub fn file(mut self, path: (&str, &str, &str), info: VpkFileInfo, preload: &[u8]) -> Self {
        let (extension, directory, name) = path;

        let ext = match self.extensions.iter().position(|e| e.name == extension) {
            Some(i) => i,
            None => {
                self.extensions.push(Extension {
                    name: extension.to_owned(),
                    directories: Vec::new(),
                });
                self.extensions.len() - 1
            }
        };

        let directories = &mut self.extensions[ext].directories;
        let dir = match directories.iter().position(|d| d.name == directory) {
            Some(i) => i,
            None => {
                directories.push(Directory {
                    name: directory.to_owned(),
                    files: Vec::new(),
                });
                directories.len() - 1
            }
        };

        directories[dir]
            .files
            .push((name.to_owned(), info, preload.to_vec()));
        self
    }

    fn tree(&self) -> Vec<u8> {
        let mut tree = Cursor::new(Vec::new());
        for extension in &self.extensions {
            write_name(&mut tree, &extension.name);
            for directory in &extension.directories {
                write_name(&mut tree, &directory.name);
                for (name, info, preload) in &directory.files {
                    write_name(&mut tree, name);
                    write_info(&mut tree, info);
                    tree.write_all(preload).unwrap();
                }
                tree.write_all(&[0]).unwrap();
            }
            tree.write_all(&[0]).unwrap();
        }
        tree.write_all(&[0]).unwrap();
        tree.into_inner()
    }

    pub fn build(&self) -> Vec<u8> {
        let tree = self.tree();
        let tree_length = tree.len() as u32;

        let mut out = Cursor::new(Vec::new());
        out.write_u32::<LittleEndian>(SIGNATURE).unwrap();
        out.write_u32::<LittleEndian>(self.version).unwrap();
        out.write_u32::<LittleEndian>(tree_length).unwrap();
        if self.version == 2 {
            // unknown, footer length, unknown, unknown
            out.write_all(&[0; 16]).unwrap();
        }
        out.write_all(&tree).unwrap();
        out.write_all(&self.inline).unwrap();
        out.into_inner()
    }
}

fn write_name(out: &mut Cursor<Vec<u8>>, name: &str) {
    out.write_all(name.as_bytes()).unwrap();
    out.write_all(&[0]).unwrap();
}

/// Serialise a file info record the way it appears in the tree
pub fn write_info(out: &mut Cursor<Vec<u8>>, info: &VpkFileInfo) {
    out.write_u32::<LittleEndian>(info.crc).unwrap();
    out.write_i16::<LittleEndian>(info.preload_bytes).unwrap();
    out.write_i16::<LittleEndian>(info.archive_index).unwrap();
    out.write_u32::<LittleEndian>(info.entry_offset).unwrap();
    out.write_u32::<LittleEndian>(info.entry_length).unwrap();
    out.write_u16::<LittleEndian>(info.terminator).unwrap();
}

/// Data archive contents with `payload` placed at `offset`
pub fn archive_with(offset: usize, payload: &[u8]) -> Vec<u8> {
    let mut data = vec![0xAB; offset];
    data.extend_from_slice(payload);
    data.extend_from_slice(&[0xCD; 16]);
    data
}
