// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Entry point for resolving package resources. */

use {
    crate::{
        byte_source::ResourceStream,
        error::{ResourceError, Result},
        reader::ResourceReader,
        store::ResourceStore,
    },
    std::path::{Component, Path},
};

/// Describes an entry known to a [ResourceFinder].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexedResource<'a> {
    pub name: &'a str,
    pub is_package: bool,
}

/// Resolves resource readers against a [ResourceStore].
///
/// Each finder owns its store. Any number of finders can coexist.
#[derive(Debug)]
pub struct ResourceFinder {
    store: ResourceStore,
}

impl From<ResourceStore> for ResourceFinder {
    fn from(store: ResourceStore) -> Self {
        Self::new(store)
    }
}

impl ResourceFinder {
    pub fn new(store: ResourceStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    /// Obtain a reader for the resources of a package.
    ///
    /// Returns `None` if the name is unknown or isn't a package.
    pub fn get_resource_reader(&self, package: &str) -> Option<ResourceReader<'_>> {
        let entry = self.store.lookup(package)?;

        if entry.is_package() {
            Some(ResourceReader::new(&self.store, entry))
        } else {
            None
        }
    }

    /// Iterate over every known entry, in store order.
    pub fn indexed_resources(&self) -> impl Iterator<Item = IndexedResource<'_>> + '_ {
        self.store.entries().map(|entry| IndexedResource {
            name: entry.name(),
            is_package: entry.is_package(),
        })
    }

    /// Open the source code of an entry.
    pub fn open_source(&self, name: &str) -> Result<ResourceStream<'_>> {
        let source = self
            .store
            .lookup(name)
            .and_then(|entry| entry.source())
            .ok_or_else(|| ResourceError::SourceNotFound(name.to_string()))?;

        self.store.open(source)
    }

    /// Resolve resource data given a filesystem path.
    ///
    /// Paths under the current executable address resources held in memory,
    /// as if the executable were an archive. Paths under the origin directory
    /// address resources installed as files. Only registered resources
    /// resolve; other files are never read.
    ///
    /// The boundary between package and resource name in the relative path
    /// is found by moving trailing components into the resource name until a
    /// known package is found. The search stops at the first package, so
    /// package boundaries are never crossed.
    pub fn resolve_resource_data_from_path(&self, path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let path = path.as_ref();
        let config = self.store.config();
        let not_found = || ResourceError::not_found("", &path.display().to_string());

        let strip = |prefix: &Path| {
            if prefix.as_os_str().is_empty() {
                None
            } else {
                path.strip_prefix(prefix).ok()
            }
        };

        let (relative_path, in_memory) = if let Some(relative) = strip(config.current_exe()) {
            (relative, true)
        } else if let Some(relative) = strip(config.origin()) {
            (relative, false)
        } else {
            return Err(not_found());
        };

        let components = relative_path
            .components()
            .map(|c| match c {
                Component::Normal(value) => value.to_str(),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(not_found)?;

        // Resources require a package. So there must be at least 2 components.
        if components.len() < 2 {
            return Err(not_found());
        }

        for split in (1..components.len()).rev() {
            let package = components[0..split].join(".");

            if let Some(entry) = self.store.lookup(&package) {
                let resource_name = components[split..].join("/");

                if let Some(source) = entry.byte_source(&resource_name) {
                    if source.real_path().is_some() != in_memory {
                        return self.store.resolve(source);
                    }
                }

                break;
            }
        }

        Err(not_found())
    }
}
