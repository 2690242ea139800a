//! Base types for structure of a VPK index.

use binrw::BinRead;
use std::io::{Read, Seek};

use crate::error::{truncated_binrw, Error, Result};

/// Signature every index file starts with
pub const SIGNATURE: u32 = 0x55AA1234;

/// Value closing every file info record
pub const ENTRY_TERMINATOR: u16 = 0xFFFF;

/// Archive index meaning the entry data is stored in the index file after the tree
pub const DIRECTORY_ARCHIVE_INDEX: i16 = 0x7FFF;

/// Version 1 header, following the signature and version
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct HeaderV1 {
    /// The size in bytes of the entry tree
    pub tree_length: u32,
}

/// Version 2 header, following the signature and version
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct HeaderV2 {
    /// The size in bytes of the entry tree
    pub tree_length: u32,

    /// Unknown, read and ignored
    pub unknown_1: i32,

    /// The size of the signature section at the end of the index
    pub footer_length: u32,

    /// Unknown, read and ignored
    pub unknown_2: i32,

    /// Unknown, read and ignored
    pub unknown_3: i32,
}

/// Version specific index header
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum VpkHeader {
    V1(HeaderV1),
    V2(HeaderV2),
}

impl VpkHeader {
    /// Read the header body for an already validated signature and the given version
    pub fn read_versioned<R: Read + Seek>(reader: &mut R, version: u32) -> Result<Self> {
        match version {
            1 => Ok(VpkHeader::V1(
                HeaderV1::read(reader).map_err(truncated_binrw("header"))?,
            )),
            2 => Ok(VpkHeader::V2(
                HeaderV2::read(reader).map_err(truncated_binrw("header"))?,
            )),
            v => Err(Error::UnsupportedVersion(v)),
        }
    }

    pub fn version(&self) -> u32 {
        match self {
            VpkHeader::V1(_) => 1,
            VpkHeader::V2(_) => 2,
        }
    }

    pub fn tree_length(&self) -> u32 {
        match self {
            VpkHeader::V1(h) => h.tree_length,
            VpkHeader::V2(h) => h.tree_length,
        }
    }

    /// Length of the trailing signature section, only present in version 2
    pub fn footer_length(&self) -> Option<u32> {
        match self {
            VpkHeader::V1(_) => None,
            VpkHeader::V2(h) => Some(h.footer_length),
        }
    }

    /// Size of the header including signature and version, where the tree starts
    pub fn header_length(&self) -> u64 {
        match self {
            VpkHeader::V1(_) => 12,
            VpkHeader::V2(_) => 28,
        }
    }

    /// Offset of inline data stored in the index after the tree
    pub fn data_start(&self) -> u64 {
        self.header_length() + self.tree_length() as u64
    }
}

/// File info record following every file name in the tree
#[derive(BinRead, Debug, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct VpkFileInfo {
    /// CRC32 of the entry data
    pub crc: u32,

    /// Number of bytes stored directly after this record
    pub preload_bytes: i16,

    /// Data archive holding the rest of the entry
    pub archive_index: i16,

    /// Offset of the entry inside its data archive
    pub entry_offset: u32,

    /// Number of bytes of the entry stored in its data archive
    pub entry_length: u32,

    /// Should always be [`ENTRY_TERMINATOR`]
    pub terminator: u16,
}

impl Default for VpkFileInfo {
    fn default() -> Self {
        Self {
            crc: Default::default(),
            preload_bytes: Default::default(),
            archive_index: Default::default(),
            entry_offset: Default::default(),
            entry_length: Default::default(),
            terminator: ENTRY_TERMINATOR,
        }
    }
}

impl VpkFileInfo {
    /// Whether the entry data lives in the index rather than a numbered archive
    pub fn is_inline(&self) -> bool {
        self.archive_index == DIRECTORY_ARCHIVE_INDEX
    }

    /// Preload length, treating negative counts as empty
    pub fn preload_len(&self) -> usize {
        self.preload_bytes.max(0) as usize
    }
}
