// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Locations of resource bytes. */

use {
    crate::error::{ResourceError, Result},
    log::debug,
    std::{
        fs::File,
        io::{Cursor, Read},
        path::{Path, PathBuf},
    },
};

/// Describes where the bytes of a resource live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ByteSource {
    /// Bytes owned by the store entry itself.
    Resident(Vec<u8>),

    /// A view into the backing buffer owned by the store.
    Embedded { offset: usize, length: usize },

    /// A file on the filesystem, read when opened.
    Filesystem(PathBuf),
}

/// Resolve an `Embedded` view, rejecting ranges outside `backing`.
fn embedded_slice(backing: &[u8], offset: usize, length: usize) -> Result<&[u8]> {
    offset
        .checked_add(length)
        .and_then(|end| backing.get(offset..end))
        .ok_or_else(|| {
            ResourceError::InvalidSnapshot(format!(
                "embedded range {}+{} exceeds {} byte snapshot",
                offset,
                length,
                backing.len()
            ))
        })
}

impl ByteSource {
    /// Open the source for reading.
    ///
    /// `backing` is the buffer `Embedded` offsets are relative to.
    pub fn open<'a>(&'a self, backing: &'a [u8]) -> Result<ResourceStream<'a>> {
        match self {
            Self::Resident(data) => Ok(ResourceStream::Memory(Cursor::new(data.as_slice()))),
            Self::Embedded { offset, length } => Ok(ResourceStream::Memory(Cursor::new(
                embedded_slice(backing, *offset, *length)?,
            ))),
            Self::Filesystem(path) => {
                debug!("opening resource file {}", path.display());
                Ok(ResourceStream::File(File::open(path)?))
            }
        }
    }

    /// Resolve the full content of this source.
    pub fn resolve(&self, backing: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Resident(data) => Ok(data.clone()),
            Self::Embedded { offset, length } => {
                Ok(embedded_slice(backing, *offset, *length)?.to_vec())
            }
            Self::Filesystem(path) => {
                debug!("reading resource file {}", path.display());
                Ok(std::fs::read(path)?)
            }
        }
    }

    /// The filesystem path backing this source, if there is one.
    pub fn real_path(&self) -> Option<&Path> {
        match self {
            Self::Filesystem(path) => Some(path),
            Self::Resident(_) | Self::Embedded { .. } => None,
        }
    }
}

/// A readable stream over resource bytes.
#[derive(Debug)]
pub enum ResourceStream<'a> {
    Memory(Cursor<&'a [u8]>),
    File(File),
}

impl<'a> ResourceStream<'a> {
    /// Read the remainder of the stream into a buffer.
    pub fn read_all(mut self) -> Result<Vec<u8>> {
        let mut buffer = match &self {
            Self::Memory(cursor) => Vec::with_capacity(cursor.get_ref().len()),
            Self::File(_) => Vec::new(),
        };
        self.read_to_end(&mut buffer)?;

        Ok(buffer)
    }
}

impl<'a> Read for ResourceStream<'a> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Memory(cursor) => cursor.read(buf),
            Self::File(f) => f.read(buf),
        }
    }
}
