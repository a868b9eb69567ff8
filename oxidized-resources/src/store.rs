// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*!
Indexed storage of resource entries.

A [ResourceStore] is built once from a packed resources snapshot and is
immutable afterwards. Resource bytes that were serialized into the snapshot
are not copied: entries record offsets into the snapshot buffer, which the
store owns for its whole lifetime.
*/

use {
    crate::{
        byte_source::{ByteSource, ResourceStream},
        error::{ResourceError, Result},
    },
    log::debug,
    packed_resources::Resource,
    std::{
        borrow::Cow,
        collections::{hash_map::Entry, HashMap},
        path::{Path, PathBuf},
    },
};

/// Memory holding a packed resources snapshot.
#[derive(Debug)]
pub enum BackingData {
    /// Heap memory owned by the store.
    Owned(Vec<u8>),

    /// Memory living for the whole program, such as data included in the binary.
    Static(&'static [u8]),

    /// A memory mapped file.
    Mapped(memmap2::Mmap),
}

impl BackingData {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::Owned(data) => data.as_slice(),
            Self::Static(data) => data,
            Self::Mapped(mapped) => &mapped[..],
        }
    }
}

impl From<Vec<u8>> for BackingData {
    fn from(data: Vec<u8>) -> Self {
        Self::Owned(data)
    }
}

impl From<&'static [u8]> for BackingData {
    fn from(data: &'static [u8]) -> Self {
        Self::Static(data)
    }
}

/// Environment state used to resolve filesystem locations of resources.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path to currently running executable.
    current_exe: PathBuf,

    /// Directory from which relative paths should be evaluated.
    ///
    /// Probably the directory of `current_exe`.
    origin: PathBuf,
}

impl StoreConfig {
    /// Construct an instance from environment state.
    pub fn new_from_env() -> Result<Self, &'static str> {
        let exe = std::env::current_exe().map_err(|_| "unable to obtain current executable")?;
        let origin = exe
            .parent()
            .ok_or("unable to get executable parent")?
            .to_path_buf();

        Ok(Self {
            current_exe: exe,
            origin,
        })
    }

    /// Obtain the path of the current executable.
    pub fn current_exe(&self) -> &Path {
        &self.current_exe
    }

    /// Set the path of the current executable.
    pub fn set_current_exe(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.current_exe = path.into();
        self
    }

    /// Obtain the source path that relative paths are relative to.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Set the source path that relative paths are relative to.
    pub fn set_origin(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.origin = path.into();
        self
    }
}

/// A named data file owned by a package entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageResource {
    name: String,
    source: ByteSource,
}

impl PackageResource {
    /// `/` delimited name relative to the owning package.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &ByteSource {
        &self.source
    }
}

/// An indexed resource record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceEntry {
    name: String,
    is_package: bool,
    source: Option<ByteSource>,
    resources: Vec<PackageResource>,
    resources_index: HashMap<String, usize>,
}

/// Whether a package resource name is well formed.
///
/// Names are relative paths: no leading or trailing separator and no empty
/// segments.
fn is_valid_resource_name(name: &str) -> bool {
    !name.is_empty() && name.split('/').all(|segment| !segment.is_empty())
}

/// Derive the byte source for blob data emitted by the snapshot parser.
///
/// Data borrowed from `backing` becomes a view into it. Anything else is
/// copied into the entry.
fn memory_byte_source(data: &Cow<[u8]>, backing: &[u8]) -> ByteSource {
    if let Cow::Borrowed(slice) = data {
        let start = backing.as_ptr() as usize;
        let end = start + backing.len();
        let ptr = slice.as_ptr() as usize;

        if !backing.is_empty() && ptr >= start && ptr + slice.len() <= end {
            return ByteSource::Embedded {
                offset: ptr - start,
                length: slice.len(),
            };
        }
    }

    ByteSource::Resident(data.to_vec())
}

impl ResourceEntry {
    fn from_resource(resource: &Resource, backing: &[u8], origin: &Path) -> Result<Self> {
        let invalid = |message: String| ResourceError::InvalidSnapshot(message);

        if resource.name.is_empty() {
            return Err(invalid("resource entry has an empty name".to_string()));
        }

        let source = if let Some(data) = &resource.in_memory_source {
            Some(memory_byte_source(data, backing))
        } else {
            resource
                .relative_path_source
                .as_ref()
                .map(|path| ByteSource::Filesystem(origin.join(path.as_ref())))
        };

        let memory = resource
            .in_memory_package_resources
            .iter()
            .flatten()
            .map(|(name, data)| (name, memory_byte_source(data, backing)));
        let relative = resource
            .relative_path_package_resources
            .iter()
            .flatten()
            .map(|(name, path)| (name, ByteSource::Filesystem(origin.join(path.as_ref()))));

        let mut resources = Vec::new();
        let mut resources_index = HashMap::new();

        for (name, source) in memory.chain(relative) {
            if !resource.is_package {
                return Err(invalid(format!(
                    "{} is not a package but owns resource {}",
                    resource.name, name
                )));
            }

            if !is_valid_resource_name(name) {
                return Err(invalid(format!(
                    "malformed resource name in {}: {:?}",
                    resource.name, name
                )));
            }

            match resources_index.entry(name.to_string()) {
                Entry::Occupied(_) => {
                    return Err(invalid(format!(
                        "duplicate resource {} in {}",
                        name, resource.name
                    )));
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(resources.len());
                }
            }

            resources.push(PackageResource {
                name: name.to_string(),
                source,
            });
        }

        Ok(Self {
            name: resource.name.to_string(),
            is_package: resource.is_package,
            source,
            resources,
            resources_index,
        })
    }

    /// Dotted name of this entry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this entry is a package capable of owning resources.
    pub fn is_package(&self) -> bool {
        self.is_package
    }

    /// Location of source code for this entry, if any.
    pub fn source(&self) -> Option<&ByteSource> {
        self.source.as_ref()
    }

    /// Names of the resources owned by this entry, in store order.
    pub fn resource_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.resources.iter().map(|resource| resource.name.as_str())
    }

    /// Resources owned by this entry, in store order.
    pub fn resources(&self) -> &[PackageResource] {
        &self.resources
    }

    /// Whether a resource with exactly this name is registered.
    pub fn has_resource(&self, name: &str) -> bool {
        self.resources_index.contains_key(name)
    }

    /// Obtain the byte source for a named resource.
    pub fn byte_source(&self, name: &str) -> Option<&ByteSource> {
        self.resources_index
            .get(name)
            .map(|index| &self.resources[*index].source)
    }
}

/// An immutable collection of indexed resource entries.
#[derive(Debug)]
pub struct ResourceStore {
    backing: BackingData,
    config: StoreConfig,
    entries: Vec<ResourceEntry>,
    index: HashMap<String, usize>,
}

impl ResourceStore {
    fn build<'a>(
        resources: impl Iterator<Item = Result<Resource<'a>>>,
        backing: &[u8],
        config: &StoreConfig,
    ) -> Result<(Vec<ResourceEntry>, HashMap<String, usize>)> {
        let mut entries = Vec::new();
        let mut index = HashMap::new();

        for resource in resources {
            let entry = ResourceEntry::from_resource(&resource?, backing, config.origin())?;

            match index.entry(entry.name.clone()) {
                Entry::Occupied(_) => {
                    return Err(ResourceError::InvalidSnapshot(format!(
                        "duplicate resource entry {}",
                        entry.name
                    )));
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(entries.len());
                }
            }

            entries.push(entry);
        }

        Ok((entries, index))
    }

    /// Construct a store from resources held in memory.
    ///
    /// In-memory data is copied into the store. Relative paths resolve against
    /// the configured origin.
    pub fn from_resources<'a>(
        resources: impl IntoIterator<Item = Resource<'a>>,
        config: &StoreConfig,
    ) -> Result<Self> {
        let (entries, index) = Self::build(resources.into_iter().map(Ok), &[], config)?;

        debug!("indexed {} resource entries from memory", entries.len());

        Ok(Self {
            backing: BackingData::Owned(vec![]),
            config: config.clone(),
            entries,
            index,
        })
    }

    /// Construct a store by parsing a packed resources snapshot.
    ///
    /// The store takes ownership of the snapshot memory and references
    /// in-memory resource data in place.
    pub fn from_snapshot(backing: impl Into<BackingData>, config: &StoreConfig) -> Result<Self> {
        let backing = backing.into();

        let (entries, index) = {
            let data = backing.as_slice();
            let parser = packed_resources::load_resources(data)
                .map_err(|e| ResourceError::InvalidSnapshot(e.to_string()))?;

            let expected = parser.expected_resources_count();
            let resources =
                parser.map(|r| r.map_err(|e| ResourceError::InvalidSnapshot(e.to_string())));
            let built = Self::build(resources, data, config)?;

            if built.0.len() != expected {
                return Err(ResourceError::InvalidSnapshot(format!(
                    "expected {} resources; got {}",
                    expected,
                    built.0.len()
                )));
            }

            built
        };

        debug!(
            "indexed {} resource entries from {} byte snapshot",
            entries.len(),
            backing.as_slice().len()
        );

        Ok(Self {
            backing,
            config: config.clone(),
            entries,
            index,
        })
    }

    /// Construct a store from a snapshot file using memory mapped I/O.
    pub fn from_path_memory_mapped(path: impl AsRef<Path>, config: &StoreConfig) -> Result<Self> {
        let path = path.as_ref();
        debug!("memory mapping resources snapshot {}", path.display());

        let f = std::fs::File::open(path)?;
        let mapped = unsafe { memmap2::Mmap::map(&f) }?;

        Self::from_snapshot(BackingData::Mapped(mapped), config)
    }

    /// Find an entry by its exact name.
    pub fn lookup(&self, name: &str) -> Option<&ResourceEntry> {
        self.index.get(name).map(|index| &self.entries[*index])
    }

    /// All entries, in the order they were indexed.
    pub fn entries(&self) -> impl Iterator<Item = &ResourceEntry> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The snapshot memory `Embedded` byte sources point into.
    pub fn backing_data(&self) -> &[u8] {
        self.backing.as_slice()
    }

    /// Open a byte source belonging to this store.
    pub fn open<'s>(&'s self, source: &'s ByteSource) -> Result<ResourceStream<'s>> {
        source.open(self.backing.as_slice())
    }

    /// Resolve the full content of a byte source belonging to this store.
    pub fn resolve(&self, source: &ByteSource) -> Result<Vec<u8>> {
        source.resolve(self.backing.as_slice())
    }
}
