// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Parsing of packed resources data blobs. */

use {
    crate::{
        resource::Resource,
        serialization::{BlobInteriorPadding, BlobSectionField, ResourceField, HEADER_V1},
    },
    byteorder::{LittleEndian, ReadBytesExt},
    std::{borrow::Cow, io::Cursor},
};

/// Represents a blob section in the blob index.
#[derive(Debug)]
struct BlobSection {
    resource_field: u8,
    raw_payload_length: usize,
    interior_padding: Option<BlobInteriorPadding>,
}

/// Holds state used to read an individual blob section.
#[derive(Clone, Copy, Debug)]
struct BlobSectionReadState {
    offset: usize,
    end: usize,
    interior_padding: BlobInteriorPadding,
}

/// An iterator over an actively parsed packed resources data structure.
///
/// The iterator emits [Resource] instances. The index data for a given resource is
/// not read or validated until the iterator attempts to deserialize it.
///
/// All emitted data borrows from the buffer passed to [load_resources].
pub struct ResourceParserIterator<'a> {
    done: bool,
    data: &'a [u8],
    reader: Cursor<&'a [u8]>,
    blob_sections: [Option<BlobSectionReadState>; 256],
    claimed_resources_count: usize,
    read_resources_count: usize,
}

impl<'a> ResourceParserIterator<'a> {
    /// The expected number of resources we will emit.
    pub fn expected_resources_count(&self) -> usize {
        self.claimed_resources_count
    }

    /// Resolve a slice to an individual blob's data.
    ///
    /// Advances the read offset of the blob section belonging to `resource_field`.
    fn resolve_blob_data(
        &mut self,
        resource_field: ResourceField,
        length: usize,
    ) -> Result<&'a [u8], &'static str> {
        let state = match self.blob_sections[resource_field as usize].as_mut() {
            Some(state) => state,
            // Empty values without padding don't produce a blob section.
            None if length == 0 => return Ok(&[]),
            None => return Err("blob section not found for resource field"),
        };

        let end = state
            .offset
            .checked_add(length)
            .ok_or("blob length overflow")?;

        if end > state.end {
            return Err("blob data extends beyond blob section");
        }

        let data = self.data;
        let blob = &data[state.offset..end];

        let increment = match &state.interior_padding {
            BlobInteriorPadding::None => length,
            BlobInteriorPadding::Null => length + 1,
        };

        state.offset += increment;

        Ok(blob)
    }

    fn resolve_str(
        &mut self,
        resource_field: ResourceField,
        length: usize,
    ) -> Result<&'a str, &'static str> {
        std::str::from_utf8(self.resolve_blob_data(resource_field, length)?)
            .map_err(|_| "invalid UTF-8 in string field")
    }

    fn parse_next(&mut self) -> Result<Option<Resource<'a>>, &'static str> {
        let mut current_resource = Resource::default();
        let mut current_resource_name = None;

        loop {
            let field_type = self
                .reader
                .read_u8()
                .map_err(|_| "failed reading field type")?;

            let field_type = ResourceField::try_from(field_type)?;

            match field_type {
                ResourceField::EndOfIndex => {
                    self.done = true;

                    if self.read_resources_count != self.claimed_resources_count {
                        return Err("mismatch between advertised index count and actual");
                    }

                    return Ok(None);
                }
                ResourceField::StartOfEntry => {
                    self.read_resources_count += 1;
                    current_resource = Resource::default();
                    current_resource_name = None;
                }
                ResourceField::EndOfEntry => {
                    return if current_resource_name.is_some() {
                        Ok(Some(current_resource))
                    } else {
                        Err("resource name field is required")
                    };
                }
                ResourceField::Name => {
                    let l = self
                        .reader
                        .read_u16::<LittleEndian>()
                        .map_err(|_| "failed reading resource name length")?
                        as usize;

                    let name = self.resolve_str(field_type, l)?;

                    current_resource_name = Some(name);
                    current_resource.name = Cow::Borrowed(name);
                }
                ResourceField::IsPackage => {
                    current_resource.is_package = true;
                }
                ResourceField::InMemorySource => {
                    let l = self
                        .reader
                        .read_u32::<LittleEndian>()
                        .map_err(|_| "failed reading source length")?
                        as usize;

                    current_resource.in_memory_source =
                        Some(Cow::Borrowed(self.resolve_blob_data(field_type, l)?));
                }
                ResourceField::RelativeFilesystemSource => {
                    let l = self
                        .reader
                        .read_u32::<LittleEndian>()
                        .map_err(|_| "failed reading source relative path length")?
                        as usize;

                    current_resource.relative_path_source =
                        Some(Cow::Borrowed(self.resolve_str(field_type, l)?));
                }
                ResourceField::InMemoryPackageResources => {
                    let resource_count = self
                        .reader
                        .read_u32::<LittleEndian>()
                        .map_err(|_| "failed reading resources length")?
                        as usize;

                    let mut resources = Vec::with_capacity(resource_count.min(1024));

                    for _ in 0..resource_count {
                        let resource_name_length = self
                            .reader
                            .read_u16::<LittleEndian>()
                            .map_err(|_| "failed reading resource name")?
                            as usize;

                        let resource_length = self
                            .reader
                            .read_u64::<LittleEndian>()
                            .map_err(|_| "failed reading resource length")?
                            as usize;

                        let resource_name = self.resolve_str(field_type, resource_name_length)?;
                        let resource_data = self.resolve_blob_data(field_type, resource_length)?;

                        resources
                            .push((Cow::Borrowed(resource_name), Cow::Borrowed(resource_data)));
                    }

                    current_resource.in_memory_package_resources = Some(resources);
                }
                ResourceField::RelativeFilesystemPackageResources => {
                    let resource_count =
                        self.reader.read_u32::<LittleEndian>().map_err(|_| {
                            "failed reading package resources relative path item count"
                        })? as usize;

                    let mut resources = Vec::with_capacity(resource_count.min(1024));

                    for _ in 0..resource_count {
                        let resource_name_length = self
                            .reader
                            .read_u16::<LittleEndian>()
                            .map_err(|_| "failed reading resource name")?
                            as usize;

                        let path_length = self
                            .reader
                            .read_u32::<LittleEndian>()
                            .map_err(|_| "failed reading resource path length")?
                            as usize;

                        let resource_name = self.resolve_str(field_type, resource_name_length)?;
                        let path = self.resolve_str(field_type, path_length)?;

                        resources.push((Cow::Borrowed(resource_name), Cow::Borrowed(path)));
                    }

                    current_resource.relative_path_package_resources = Some(resources);
                }
            }
        }
    }
}

impl<'a> Iterator for ResourceParserIterator<'a> {
    type Item = Result<Resource<'a>, &'static str>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.parse_next() {
            Ok(res) => res.map(Ok),
            Err(e) => {
                // A corrupt index cannot be resynchronized.
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Parse a packed resources data structure.
///
/// The data structure is parsed lazily via an iterator that emits reconstructed
/// [Resource] instances.
///
/// Error handling is kept primitive because this runs on every program start.
pub fn load_resources(data: &[u8]) -> Result<ResourceParserIterator<'_>, &'static str> {
    if data.len() < HEADER_V1.len() {
        return Err("error reading 8 byte header");
    }

    let header = &data[0..8];

    if header == HEADER_V1 {
        load_resources_v1(&data[8..])
    } else {
        Err("unrecognized file format")
    }
}

fn load_resources_v1(data: &[u8]) -> Result<ResourceParserIterator<'_>, &'static str> {
    let mut reader = Cursor::new(data);

    let blob_section_count = reader
        .read_u8()
        .map_err(|_| "failed reading blob section count")?;
    let blob_index_length = reader
        .read_u32::<LittleEndian>()
        .map_err(|_| "failed reading blob index length")? as usize;
    let resources_count = reader
        .read_u32::<LittleEndian>()
        .map_err(|_| "failed reading resources count")? as usize;
    let resources_index_length = reader
        .read_u32::<LittleEndian>()
        .map_err(|_| "failed reading resources index length")?
        as usize;

    let mut current_blob_field = None;
    let mut current_blob_raw_payload_length = None;
    let mut current_blob_interior_padding = None;
    let mut blob_entry_count = 0usize;
    let mut blob_sections = Vec::with_capacity(blob_section_count as usize);

    if blob_section_count != 0 || blob_index_length != 0 {
        loop {
            let field_type = reader
                .read_u8()
                .map_err(|_| "failed reading blob section field type")?;

            let field_type = BlobSectionField::try_from(field_type)?;

            match field_type {
                BlobSectionField::EndOfIndex => break,
                BlobSectionField::StartOfEntry => {
                    blob_entry_count += 1;

                    if blob_entry_count > blob_section_count as usize {
                        return Err("mismatch between blob sections count");
                    }
                    current_blob_field = None;
                    current_blob_raw_payload_length = None;
                    current_blob_interior_padding = None;
                }
                BlobSectionField::EndOfEntry => {
                    let resource_field =
                        current_blob_field.ok_or("blob resource field is required")?;
                    let raw_payload_length = current_blob_raw_payload_length
                        .ok_or("blob raw payload length is required")?;

                    blob_sections.push(BlobSection {
                        resource_field,
                        raw_payload_length,
                        interior_padding: current_blob_interior_padding,
                    });

                    current_blob_field = None;
                    current_blob_raw_payload_length = None;
                    current_blob_interior_padding = None;
                }
                BlobSectionField::ResourceFieldType => {
                    let field = reader
                        .read_u8()
                        .map_err(|_| "failed reading blob resource field value")?;
                    current_blob_field = Some(field);
                }
                BlobSectionField::RawPayloadLength => {
                    let l = reader
                        .read_u64::<LittleEndian>()
                        .map_err(|_| "failed reading raw payload length")?;
                    current_blob_raw_payload_length = Some(l as usize);
                }
                BlobSectionField::InteriorPadding => {
                    let padding = reader
                        .read_u8()
                        .map_err(|_| "failed reading interior padding field value")?;

                    current_blob_interior_padding = Some(BlobInteriorPadding::try_from(padding)?);
                }
            }
        }
    }

    if blob_entry_count != blob_section_count as usize {
        return Err("mismatch between blob sections count");
    }

    // Array indexing resource field to current payload offset within that section.
    let mut blob_offsets: [Option<BlobSectionReadState>; 256] = [None; 256];

    // Global payload offset where blobs data starts.
    // Global header, then both indices.
    let blob_start_offset = (1 + 4 + 4 + 4usize)
        .checked_add(blob_index_length)
        .and_then(|v| v.checked_add(resources_index_length))
        .ok_or("index length overflow")?;
    // Current offset from start of blobs data.
    let mut current_blob_offset = 0usize;

    for section in &blob_sections {
        let section_start_offset = blob_start_offset
            .checked_add(current_blob_offset)
            .ok_or("blob section offset overflow")?;
        let section_end_offset = section_start_offset
            .checked_add(section.raw_payload_length)
            .ok_or("blob section offset overflow")?;

        if section_end_offset > data.len() {
            return Err("blob section extends beyond end of data");
        }

        blob_offsets[section.resource_field as usize] = Some(BlobSectionReadState {
            offset: section_start_offset,
            end: section_end_offset,
            interior_padding: section.interior_padding.unwrap_or(BlobInteriorPadding::None),
        });
        current_blob_offset += section.raw_payload_length;
    }

    Ok(ResourceParserIterator {
        done: resources_index_length == 0 || resources_count == 0,
        data,
        reader,
        blob_sections: blob_offsets,
        claimed_resources_count: resources_count,
        read_resources_count: 0,
    })
}
