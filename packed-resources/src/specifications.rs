// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*!
Specifications

# Packed Resources Data

A packed resources blob is a serialized index of named *resources* plus the
bytes they reference. A resource has a dotted name (`pkg.sub`), an optional
package flag, an optional source payload, and, when it is a package, a list
of named *package data files*. Data may live inside the blob itself or be
referenced by a filesystem path relative to some origin directory.

The blob is designed to be parsed with zero copies: every name, path and
payload handed back by the parser is a view into the original buffer.

The first 8 bytes is a magic header identifying the content as our data
type and the version of it. The first 7 bytes are `rsembed` and the
following 1 byte denotes a version.

## `rsembed\x01`

Version 1 of the packed resources data.

From a high-level, the serialized format consists of:

* A *global header* describing the overall payload.
* An index describing the blob sections present in the payload.
* An index describing each resource and its content.
* A series of blob sections holding the data referenced by the resources
  index.

The content of fields is stored in field-specific sections after the
indices. Each field has its own section and data for all resources is
stored next to each other. e.g. all resource names are followed by all
in-memory source payloads.

All integers are little-endian.

The first 13 bytes after the magic header denote a global header:

* A `u8` denoting the number of blob sections, `blob_sections_count`.
* A `u32` denoting the length of the blob index, `blob_index_length`.
* A `u32` denoting the total number of resources, `resources_count`.
* A `u32` denoting the length of the resources index,
  `resources_index_length`.

Following the *global header* is the *blob index*. Each entry is a *start
of entry* `u8` marker followed by field type values and their metadata,
followed by an *end of entry* `u8` marker. The index is terminated by an
*end of index* `u8` marker. The total number of bytes in the blob index,
including the end of index marker, is `blob_index_length`.

Following the *blob index* is the *resources index*, built the same way.
Each entry describes one resource through a sparse set of fields. The
total number of bytes in the resources index, including the end of index
marker, is `resources_index_length`.

Following the *resources index* are the blob sections, in the order of
the blob index. Blob data for a resource field is consumed sequentially:
the first resource holding a field reads from offset 0 of that field's
section, the next one continues where the previous read ended.

### Blob Index Fields

`0x00` - End of index. Terminates the blob index.

`0x01` - Start of blob section entry.

`0x02` - Resource field type. The next `u8` is the resources index field
this blob section holds data for. Required.

`0x03` - Raw payload length. The next `u64` is the number of bytes in the
section. Required.

`0x04` - Interior padding. The next `u8` is `0x01` for no padding or
`0x02` for a NULL byte after every element. Absent means no padding.

`0xff` - End of blob section entry.

### Resources Index Fields

`0x00` - End of index. Terminates the resources index.

`0x01` - Start of resource entry.

`0x02` - Resource name. The next `u16` is the length of the UTF-8 name in
the name blob section. Required.

`0x03` - Is package. The resource can own package data files.

`0x04` - In-memory source. The next `u32` is the length of the payload in
its blob section.

`0x05` - Relative filesystem source. The next `u32` is the length of a
UTF-8 path, relative to the origin directory, in its blob section.

`0x06` - In-memory package resources. The next `u32` is the number of
package data files. Each file is then described by a `u16` name length
and a `u64` data length. In the blob section, each name is immediately
followed by its data.

`0x07` - Relative filesystem package resources. The next `u32` is the
number of package data files. Each file is then described by a `u16` name
length and a `u32` path length. In the blob section, each name is
immediately followed by its path.

`0xff` - End of resource entry.

Package data file names are `/` delimited paths relative to the owning
package. Paths of relative filesystem fields also use `/` as separator.
*/
