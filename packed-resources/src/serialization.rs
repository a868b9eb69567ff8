// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Declares the foundational data primitives inside packed resources data. */

/// Header value for version 1 of resources payload.
pub const HEADER_V1: &[u8] = b"rsembed\x01";

/// Defines interior padding mechanism between entries in blob sections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlobInteriorPadding {
    /// No padding.
    ///
    /// Entries are packed next to each other. e.g. "foo" + "bar" = "foobar".
    None = 0x01,

    /// NULL byte padding.
    ///
    /// There exists a NULL byte between entries. e.g. "foo" + "bar" = "foo\0bar\0".
    Null = 0x02,
}

impl From<&BlobInteriorPadding> for u8 {
    fn from(source: &BlobInteriorPadding) -> Self {
        match source {
            BlobInteriorPadding::None => 0x01,
            BlobInteriorPadding::Null => 0x02,
        }
    }
}

impl TryFrom<u8> for BlobInteriorPadding {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(BlobInteriorPadding::None),
            0x02 => Ok(BlobInteriorPadding::Null),
            _ => Err("invalid value for interior padding field"),
        }
    }
}

/// Describes a blob section field type in the blob index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd)]
pub enum BlobSectionField {
    EndOfIndex = 0x00,
    StartOfEntry = 0x01,
    ResourceFieldType = 0x02,
    RawPayloadLength = 0x03,
    InteriorPadding = 0x04,
    EndOfEntry = 0xff,
}

impl From<BlobSectionField> for u8 {
    fn from(source: BlobSectionField) -> u8 {
        source as u8
    }
}

impl TryFrom<u8> for BlobSectionField {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(BlobSectionField::EndOfIndex),
            0x01 => Ok(BlobSectionField::StartOfEntry),
            0x02 => Ok(BlobSectionField::ResourceFieldType),
            0x03 => Ok(BlobSectionField::RawPayloadLength),
            0x04 => Ok(BlobSectionField::InteriorPadding),
            0xff => Ok(BlobSectionField::EndOfEntry),
            _ => Err("invalid blob index field type"),
        }
    }
}

/// Describes a resource field type in the resource index.
///
/// Fields carrying blob data have a dedicated blob section keyed by the
/// field's numeric value.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord)]
pub enum ResourceField {
    EndOfIndex = 0x00,
    StartOfEntry = 0x01,
    Name = 0x02,
    IsPackage = 0x03,
    InMemorySource = 0x04,
    RelativeFilesystemSource = 0x05,
    InMemoryPackageResources = 0x06,
    RelativeFilesystemPackageResources = 0x07,
    EndOfEntry = 0xff,
}

impl From<ResourceField> for u8 {
    fn from(field: ResourceField) -> Self {
        field as u8
    }
}

impl TryFrom<u8> for ResourceField {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(ResourceField::EndOfIndex),
            0x01 => Ok(ResourceField::StartOfEntry),
            0x02 => Ok(ResourceField::Name),
            0x03 => Ok(ResourceField::IsPackage),
            0x04 => Ok(ResourceField::InMemorySource),
            0x05 => Ok(ResourceField::RelativeFilesystemSource),
            0x06 => Ok(ResourceField::InMemoryPackageResources),
            0x07 => Ok(ResourceField::RelativeFilesystemPackageResources),
            0xff => Ok(ResourceField::EndOfEntry),
            _ => Err("invalid field type"),
        }
    }
}
