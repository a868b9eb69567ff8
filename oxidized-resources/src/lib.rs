// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Indexed access to embedded package resources.

A [ResourceStore] indexes a packed resources snapshot (see the
`packed-resources` crate). A [ResourceFinder] owns a store and hands out a
[ResourceReader] per package, which answers listing, existence and open
queries against `/` delimited resource names. [ResourceReader::files]
exposes the same resources as a [Traversable] directory tree.

Resource bytes may live in the snapshot, in memory owned by the store, or in
files next to the executable. Consumers see the same API regardless.

The [scanning] and [collector] modules produce snapshots from a directory
tree.
*/

mod byte_source;
pub mod collector;
mod error;
mod finder;
mod reader;
pub mod scanning;
mod store;
mod traversable;

pub use crate::{
    byte_source::{ByteSource, ResourceStream},
    error::{ResourceError, Result},
    finder::{IndexedResource, ResourceFinder},
    reader::ResourceReader,
    store::{BackingData, PackageResource, ResourceEntry, ResourceStore, StoreConfig},
    traversable::{DecodeErrors, TextOptions, Traversable},
};
