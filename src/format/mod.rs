//! ZIP format constants, record definitions, and low-level parsing utilities.
//!
//! This module contains the magic numbers, flag bits, and fixed record sizes
//! defined by the PKWARE APPNOTE, along with the record codec in
//! [`records`]. All multi-byte fields are little-endian.

pub mod reader;
pub mod records;

pub use records::{
    CentralDirectoryRecord, DataDescriptor, EndOfCentralDirectory, LocalFileHeader, RecordKind,
};

/// Record signatures (magic bytes).
pub mod signature {
    /// Local file header: `PK\x03\x04`.
    pub const LOCAL_FILE_HEADER: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
    /// Central directory record: `PK\x01\x02`.
    pub const CENTRAL_DIRECTORY: [u8; 4] = [0x50, 0x4B, 0x01, 0x02];
    /// End of central directory: `PK\x05\x06`.
    pub const END_OF_CENTRAL_DIRECTORY: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];
    /// Optional data descriptor prefix: `PK\x07\x08`.
    pub const DATA_DESCRIPTOR: [u8; 4] = [0x50, 0x4B, 0x07, 0x08];
    /// Central directory digital signature: `PK\x05\x05`.
    pub const DIGITAL_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x05, 0x05];
    /// Zip64 end of central directory: `PK\x06\x06`.
    pub const ZIP64_END_OF_CENTRAL_DIRECTORY: [u8; 4] = [0x50, 0x4B, 0x06, 0x06];
    /// Zip64 end of central directory locator: `PK\x06\x07`.
    pub const ZIP64_LOCATOR: [u8; 4] = [0x50, 0x4B, 0x06, 0x07];
}

/// General-purpose bit flags.
pub mod flags {
    /// The entry is encrypted.
    pub const ENCRYPTED: u16 = 1 << 0;
    /// CRC and sizes follow the body in a data descriptor.
    pub const DATA_DESCRIPTOR: u16 = 1 << 3;
    /// Name and comment are UTF-8.
    pub const UTF8: u16 = 1 << 11;
}

/// MS-DOS external attribute values written for new entries.
pub mod attributes {
    /// `FILE_ATTRIBUTE_DIRECTORY`.
    pub const DIRECTORY: u32 = 0x10;
    /// `FILE_ATTRIBUTE_ARCHIVE`.
    pub const FILE: u32 = 0x20;
}

/// Version 2.0: Deflate, directories, data descriptors.
pub const VERSION_NEEDED: u16 = 20;

/// Version made by: MS-DOS host, APPNOTE 2.0.
pub const VERSION_MADE_BY: u16 = 20;

/// Fixed part of a local file header, including the signature.
pub const LOCAL_FILE_HEADER_SIZE: usize = 30;

/// Fixed part of a central directory record, including the signature.
pub const CENTRAL_DIRECTORY_RECORD_SIZE: usize = 46;

/// Fixed part of the end of central directory record, including the signature.
pub const END_OF_CENTRAL_DIRECTORY_SIZE: usize = 22;

/// Data descriptor without the optional signature.
pub const DATA_DESCRIPTOR_SIZE: usize = 12;

/// Largest value of a 16-bit length field (names, extras, comments).
pub const MAX_FIELD_LENGTH: usize = u16::MAX as usize;

/// 32-bit field value that defers to a Zip64 extra field.
pub const ZIP64_ESCAPE_U32: u32 = u32::MAX;

/// 16-bit entry count value that defers to the Zip64 end record.
pub const ZIP64_ESCAPE_U16: u16 = u16::MAX;
