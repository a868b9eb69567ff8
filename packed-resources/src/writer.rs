// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Serialization of packed resources data blobs. */

use {
    crate::{
        resource::Resource,
        serialization::{BlobInteriorPadding, BlobSectionField, ResourceField, HEADER_V1},
    },
    anyhow::{anyhow, Context, Result},
    byteorder::{LittleEndian, WriteBytesExt},
    std::{collections::BTreeMap, io::Write},
};

/// Resource fields which have data stored in blob sections, in write order.
const BLOB_FIELDS: [ResourceField; 5] = [
    ResourceField::Name,
    ResourceField::InMemorySource,
    ResourceField::RelativeFilesystemSource,
    ResourceField::InMemoryPackageResources,
    ResourceField::RelativeFilesystemPackageResources,
];

#[derive(Debug)]
struct BlobSection {
    resource_field: ResourceField,
    raw_payload_length: usize,
    interior_padding: Option<BlobInteriorPadding>,
}

impl BlobSection {
    /// Compute length of index entry for version 1 payload format.
    fn index_v1_length(&self) -> usize {
        // Start of index entry.
        let mut index = 1;

        // Resource type field + its value.
        index += 2;

        // Raw payload length field + its value.
        index += 9;

        if self.interior_padding.is_some() {
            // Field + value.
            index += 2;
        }

        // End of index entry.
        index += 1;

        index
    }

    fn write_index_v1<W: Write>(&self, dest: &mut W) -> Result<()> {
        dest.write_u8(BlobSectionField::StartOfEntry.into())
            .context("writing start of index entry")?;

        dest.write_u8(BlobSectionField::ResourceFieldType.into())
            .context("writing resource field type field")?;
        dest.write_u8(self.resource_field.into())
            .context("writing resource field type value")?;

        dest.write_u8(BlobSectionField::RawPayloadLength.into())
            .context("writing raw payload length field")?;
        dest.write_u64::<LittleEndian>(self.raw_payload_length as u64)
            .context("writing raw payload length")?;

        if let Some(padding) = &self.interior_padding {
            dest.write_u8(BlobSectionField::InteriorPadding.into())
                .context("writing interior padding field")?;
            dest.write_u8(padding.into())
                .context("writing interior padding value")?;
        }

        dest.write_u8(BlobSectionField::EndOfEntry.into())
            .context("writing end of index entry")?;

        Ok(())
    }
}

/// Compute length of the resources index entry for a resource.
fn resource_index_v1_length(resource: &Resource) -> usize {
    // Start of index entry.
    let mut index = 1;

    // Name field + name length.
    index += 3;

    if resource.is_package {
        index += 1;
    }

    if resource.in_memory_source.is_some() {
        index += 5;
    }

    if resource.relative_path_source.is_some() {
        index += 5;
    }

    if let Some(resources) = &resource.in_memory_package_resources {
        index += 5;

        // u16 + u64 for resource name and data.
        index += 10 * resources.len();
    }

    if let Some(resources) = &resource.relative_path_package_resources {
        index += 5;

        // u16 + u32 for resource name and path.
        index += 6 * resources.len();
    }

    // End of index entry.
    index += 1;

    index
}

/// Compute the length of a field's blob data.
///
/// Interior padding is not part of the returned length.
fn field_blob_length(resource: &Resource, field: ResourceField) -> usize {
    match field {
        ResourceField::Name => resource.name.as_bytes().len(),
        ResourceField::InMemorySource => resource
            .in_memory_source
            .as_ref()
            .map(|source| source.len())
            .unwrap_or(0),
        ResourceField::RelativeFilesystemSource => resource
            .relative_path_source
            .as_ref()
            .map(|path| path.as_bytes().len())
            .unwrap_or(0),
        ResourceField::InMemoryPackageResources => resource
            .in_memory_package_resources
            .iter()
            .flatten()
            .map(|(name, data)| name.as_bytes().len() + data.len())
            .sum(),
        ResourceField::RelativeFilesystemPackageResources => resource
            .relative_path_package_resources
            .iter()
            .flatten()
            .map(|(name, path)| name.as_bytes().len() + path.as_bytes().len())
            .sum(),
        ResourceField::EndOfIndex
        | ResourceField::StartOfEntry
        | ResourceField::EndOfEntry
        | ResourceField::IsPackage => 0,
    }
}

/// Compute the size of interior padding for a specific field.
fn field_blob_interior_padding_length(
    resource: &Resource,
    field: ResourceField,
    padding: BlobInteriorPadding,
) -> usize {
    let elements_count = match field {
        ResourceField::Name => 1,
        ResourceField::InMemorySource => usize::from(resource.in_memory_source.is_some()),
        ResourceField::RelativeFilesystemSource => {
            usize::from(resource.relative_path_source.is_some())
        }
        ResourceField::InMemoryPackageResources => resource
            .in_memory_package_resources
            .as_ref()
            .map(|resources| resources.len() * 2)
            .unwrap_or(0),
        ResourceField::RelativeFilesystemPackageResources => resource
            .relative_path_package_resources
            .as_ref()
            .map(|resources| resources.len() * 2)
            .unwrap_or(0),
        ResourceField::EndOfIndex
        | ResourceField::StartOfEntry
        | ResourceField::EndOfEntry
        | ResourceField::IsPackage => 0,
    };

    let overhead = match padding {
        BlobInteriorPadding::None => 0,
        BlobInteriorPadding::Null => 1,
    };

    elements_count * overhead
}

/// Write the version 1 index entry for a resource.
fn write_resource_index_v1<W: Write>(resource: &Resource, dest: &mut W) -> Result<()> {
    let name_len =
        u16::try_from(resource.name.as_bytes().len()).context("converting name to u16")?;

    dest.write_u8(ResourceField::StartOfEntry.into())
        .context("writing start of index entry")?;

    dest.write_u8(ResourceField::Name.into())
        .context("writing name field")?;
    dest.write_u16::<LittleEndian>(name_len)
        .context("writing name length")?;

    if resource.is_package {
        dest.write_u8(ResourceField::IsPackage.into())
            .context("writing is_package field")?;
    }

    if let Some(source) = &resource.in_memory_source {
        let l = u32::try_from(source.len()).context("converting in-memory source length to u32")?;
        dest.write_u8(ResourceField::InMemorySource.into())
            .context("writing in-memory source field")?;
        dest.write_u32::<LittleEndian>(l)
            .context("writing in-memory source length")?;
    }

    if let Some(path) = &resource.relative_path_source {
        let l = u32::try_from(path.as_bytes().len())
            .context("converting relative source path length to u32")?;
        dest.write_u8(ResourceField::RelativeFilesystemSource.into())
            .context("writing relative source path field")?;
        dest.write_u32::<LittleEndian>(l)
            .context("writing relative source path length")?;
    }

    if let Some(resources) = &resource.in_memory_package_resources {
        let l = u32::try_from(resources.len())
            .context("converting in-memory package resources count to u32")?;
        dest.write_u8(ResourceField::InMemoryPackageResources.into())
            .context("writing in-memory package resources field")?;
        dest.write_u32::<LittleEndian>(l)
            .context("writing in-memory package resources count")?;

        for (name, value) in resources {
            let name_length = u16::try_from(name.as_bytes().len())
                .context("converting resource name length to u16")?;
            dest.write_u16::<LittleEndian>(name_length)
                .context("writing resource name length")?;
            dest.write_u64::<LittleEndian>(value.len() as u64)
                .context("writing resource data length")?;
        }
    }

    if let Some(resources) = &resource.relative_path_package_resources {
        let l = u32::try_from(resources.len())
            .context("converting relative path package resources count to u32")?;
        dest.write_u8(ResourceField::RelativeFilesystemPackageResources.into())
            .context("writing relative path package resources field")?;
        dest.write_u32::<LittleEndian>(l)
            .context("writing relative path package resources count")?;

        for (name, path) in resources {
            let name_length = u16::try_from(name.as_bytes().len())
                .context("converting resource name length to u16")?;
            let path_length = u32::try_from(path.as_bytes().len())
                .context("converting resource path length to u32")?;
            dest.write_u16::<LittleEndian>(name_length)
                .context("writing resource name length")?;
            dest.write_u32::<LittleEndian>(path_length)
                .context("writing resource path length")?;
        }
    }

    dest.write_u8(ResourceField::EndOfEntry.into())
        .map_err(|_| anyhow!("error writing end of index entry"))?;

    Ok(())
}

/// Write a packed resources data blob, version 1.
///
/// See the [crate::specifications] module for the format of this data structure.
pub fn write_packed_resources_v1<'a, T: AsRef<Resource<'a>>, W: Write>(
    resources: &[T],
    dest: &mut W,
    interior_padding: Option<BlobInteriorPadding>,
) -> Result<()> {
    let mut blob_sections = BTreeMap::new();

    // 1 for end of index field.
    let mut blob_index_length = 1;

    // 1 for end of index field.
    let mut resource_index_length = 1;

    let padding = interior_padding.unwrap_or(BlobInteriorPadding::None);

    for resource in resources {
        let resource = resource.as_ref();
        resource_index_length += resource_index_v1_length(resource);

        for field in BLOB_FIELDS {
            let l = field_blob_length(resource, field)
                + field_blob_interior_padding_length(resource, field, padding);

            if l > 0 {
                blob_sections
                    .entry(field)
                    .or_insert_with(|| BlobSection {
                        resource_field: field,
                        raw_payload_length: 0,
                        interior_padding,
                    })
                    .raw_payload_length += l;
            }
        }
    }

    let blob_section_count =
        u8::try_from(blob_sections.len()).context("converting blob section count to u8")?;
    blob_index_length += blob_sections
        .values()
        .map(|section| section.index_v1_length())
        .sum::<usize>();

    let add_interior_padding = |dest: &mut W| -> Result<()> {
        if interior_padding == Some(BlobInteriorPadding::Null) {
            dest.write_all(b"\0")?;
        }

        Ok(())
    };

    dest.write_all(HEADER_V1)?;

    dest.write_u8(blob_section_count)?;
    dest.write_u32::<LittleEndian>(
        u32::try_from(blob_index_length).context("converting blob index length to u32")?,
    )?;
    dest.write_u32::<LittleEndian>(
        u32::try_from(resources.len()).context("converting resources count to u32")?,
    )?;
    dest.write_u32::<LittleEndian>(
        u32::try_from(resource_index_length).context("converting resources index length to u32")?,
    )?;

    // Write the blob index.
    for section in blob_sections.values() {
        section.write_index_v1(dest)?;
    }
    dest.write_u8(BlobSectionField::EndOfIndex.into())?;

    // Write the resources index.
    for resource in resources {
        write_resource_index_v1(resource.as_ref(), dest)?;
    }
    dest.write_u8(ResourceField::EndOfIndex.into())?;

    // Write blob data, one field at a time.
    for resource in resources {
        dest.write_all(resource.as_ref().name.as_bytes())?;
        add_interior_padding(dest)?;
    }

    for resource in resources {
        if let Some(data) = &resource.as_ref().in_memory_source {
            dest.write_all(data)?;
            add_interior_padding(dest)?;
        }
    }

    for resource in resources {
        if let Some(path) = &resource.as_ref().relative_path_source {
            dest.write_all(path.as_bytes())?;
            add_interior_padding(dest)?;
        }
    }

    for resource in resources {
        if let Some(resources) = &resource.as_ref().in_memory_package_resources {
            for (key, value) in resources {
                dest.write_all(key.as_bytes())?;
                add_interior_padding(dest)?;
                dest.write_all(value)?;
                add_interior_padding(dest)?;
            }
        }
    }

    for resource in resources {
        if let Some(resources) = &resource.as_ref().relative_path_package_resources {
            for (key, path) in resources {
                dest.write_all(key.as_bytes())?;
                add_interior_padding(dest)?;
                dest.write_all(path.as_bytes())?;
                add_interior_padding(dest)?;
            }
        }
    }

    Ok(())
}
