//! This library handles reading **VPK** directory indexes and extracting the entries they describe.
//!
//! # VPK Directory Format Documentation
//!
//! A VPK package is split into an index file (conventionally named `<name>_dir.vpk`) and zero or
//! more numbered data archives (`<name>_000.vpk`, `<name>_001.vpk`, ...). The index holds a tree
//! of every entry in the package, while the payload bytes live either inside the index itself or
//! at an offset inside one of the numbered archives.
//!
//! ## File Structure
//!
//! An index file consists of a header, followed by the entry tree and, optionally, inline data.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Signature              | 4 bytes: 0x55AA1234                                        |
//! | 0x0004         | Version                | 4 bytes: 1 or 2                                            |
//! | 0x0008         | Tree Length            | 4 bytes: Size in bytes of the entry tree                   |
//! | 0x000C         | Unknown (v2)           | 4 bytes: Signed, ignored                                   |
//! | 0x0010         | Footer Length (v2)     | 4 bytes: Size of the trailing signature section, ignored   |
//! | 0x0014         | Unknown (v2)           | 4 bytes: Signed, ignored                                   |
//! | 0x0018         | Unknown (v2)           | 4 bytes: Signed, ignored                                   |
//!
//! The header is 12 bytes long for version 1 and 28 bytes long for version 2. The tree starts
//! immediately after it.
//!
//! ### Entry Tree
//!
//! The tree is three levels deep: extensions, then directories, then files. Every level is a list
//! of null terminated names, and every list ends with an empty name. No counts are stored, the
//! empty name alone marks the end of a list.
//!
//! ```text
//! for each extension:      name\0
//!     for each directory:  name\0
//!         for each file:   name\0 <file info> <preload bytes>
//!         \0
//!     \0
//! \0
//! ```
//!
//! ### File Info
//!
//! Each file name is followed by a fixed 18 byte record:
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | CRC32                  | 4 bytes: Checksum of the entry data (not verified)      |
//! | 0x0004         | Preload Bytes          | 2 bytes: Signed count of bytes stored after the record  |
//! | 0x0006         | Archive Index          | 2 bytes: Signed number of the data archive              |
//! | 0x0008         | Entry Offset           | 4 bytes: Offset of the data inside the archive          |
//! | 0x000C         | Entry Length           | 4 bytes: Size of the data stored inside the archive     |
//! | 0x0010         | Terminator             | 2 bytes: Always 0xFFFF                                  |
//!
//! An archive index of `0x7FFF` means the data is stored in the index file itself, right after
//! the tree. Any other archive index `n` refers to the file `<name>_nnn.vpk`, zero padded to three
//! digits.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.vpk`
//! - **Endianness**: Little-endian for all multi-byte integers
//! - The logical path of a file is `directory/file.extension`
//!

pub mod error;
pub mod extract;
pub mod read;
pub mod tree;
pub mod types;

pub use extract::ExtractOptions;
pub use read::{Resolution, VpkArchive, VpkFile};
