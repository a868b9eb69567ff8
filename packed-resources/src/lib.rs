// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Packed Resources

This crate defines and implements a data format for storing named resources
so they can be embedded in a binary and consumed at run time. We call this
data format *packed resources*.

The idea is that a producer collects resources - package source code and
arbitrary package data files - attaches metadata to those resources (e.g.
whether a named entry is a package capable of owning data files), and then
serializes all of this out to a binary data structure.

Later, this data structure is parsed back into composite parts without
copying: every name and every blob emitted by the parser borrows from the
original buffer. Consumers (see the `oxidized-resources` crate) index these
records and answer resource queries against them.

See the [specifications] module for the canonical description of the
format.
*/

mod parser;
mod resource;
mod serialization;
pub mod specifications;
mod writer;

pub use crate::{
    parser::{load_resources, ResourceParserIterator},
    resource::Resource,
    serialization::{BlobInteriorPadding, HEADER_V1},
    writer::write_packed_resources_v1,
};
