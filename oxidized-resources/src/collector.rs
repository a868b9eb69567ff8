// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Collection of discovered resources into packed snapshots. */

use {
    crate::scanning::DiscoveredResource,
    anyhow::{anyhow, Context, Result},
    log::debug,
    packed_resources::{write_packed_resources_v1, Resource},
    simple_file_manifest::{FileData, FileEntry, FileManifest},
    std::{
        borrow::Cow,
        collections::{btree_map::Entry, BTreeMap},
        fmt,
    },
};

/// Describes where collected resource data is stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceLocation {
    /// Data is stored inside the snapshot.
    InMemory,

    /// Data is installed as files in a directory relative to the origin.
    RelativePath(String),
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InMemory => write!(f, "in-memory"),
            Self::RelativePath(prefix) => write!(f, "filesystem-relative:{}", prefix),
        }
    }
}

impl TryFrom<&str> for ResourceLocation {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value == "in-memory" {
            Ok(Self::InMemory)
        } else if let Some(prefix) = value.strip_prefix("filesystem-relative:") {
            Ok(Self::RelativePath(prefix.to_string()))
        } else {
            Err(format!("{} is not a valid resource location", value))
        }
    }
}

/// Join path parts with `/`, skipping empty parts.
fn relative_path<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Output of a [ResourceCollector].
pub struct CollectedResources {
    /// Packed resources snapshot.
    pub snapshot: Vec<u8>,

    /// Files to install next to the snapshot, keyed by path relative to the
    /// origin directory.
    pub extra_files: FileManifest,
}

/// Accumulates discovered resources and turns them into a snapshot.
#[derive(Debug)]
pub struct ResourceCollector {
    location: ResourceLocation,
    resources: BTreeMap<String, Resource<'static>>,
    extra_files: FileManifest,
}

impl ResourceCollector {
    pub fn new(location: ResourceLocation) -> Self {
        Self {
            location,
            resources: BTreeMap::new(),
            extra_files: FileManifest::default(),
        }
    }

    pub fn location(&self) -> &ResourceLocation {
        &self.location
    }

    fn install_file(&mut self, path: &str, data: &FileData) -> Result<()> {
        self.extra_files
            .add_file_entry(path, FileEntry::new_from_data(data.clone(), false))
            .with_context(|| format!("registering file {}", path))
    }

    fn merge(&mut self, resource: Resource<'static>) -> Result<()> {
        match self.resources.entry(resource.name.to_string()) {
            Entry::Occupied(existing) => {
                let existing = existing.into_mut();

                let has_source = |r: &Resource| {
                    r.in_memory_source.is_some() || r.relative_path_source.is_some()
                };
                if has_source(&*existing) && has_source(&resource) {
                    return Err(anyhow!("duplicate source for {}", resource.name));
                }

                for name in resource.package_resource_names() {
                    if existing.package_resource_names().any(|n| n == name) {
                        return Err(anyhow!(
                            "duplicate resource {} in {}",
                            name,
                            resource.name
                        ));
                    }
                }

                existing.merge_from(resource).map_err(|e| anyhow!(e))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(resource);
                Ok(())
            }
        }
    }

    /// Add a discovered resource to the collection.
    pub fn add(&mut self, resource: &DiscoveredResource) -> Result<()> {
        match resource {
            DiscoveredResource::Module {
                name,
                is_package,
                source,
            } => {
                let mut entry = Resource {
                    name: Cow::Owned(name.clone()),
                    is_package: *is_package,
                    ..Resource::default()
                };

                match &self.location {
                    ResourceLocation::InMemory => {
                        let data = source
                            .resolve_content()
                            .with_context(|| format!("reading source of {}", name))?;
                        entry.in_memory_source = Some(Cow::Owned(data));
                    }
                    ResourceLocation::RelativePath(prefix) => {
                        let file_name = match source {
                            FileData::Path(path) => path
                                .file_name()
                                .and_then(|s| s.to_str())
                                .map(|s| s.to_string()),
                            FileData::Memory(_) => None,
                        }
                        .ok_or_else(|| anyhow!("unable to resolve file name for {}", name))?;

                        let mut parts = name.split('.').collect::<Vec<_>>();
                        if !*is_package {
                            parts.pop();
                        }

                        let path = relative_path(
                            std::iter::once(prefix.as_str())
                                .chain(parts)
                                .chain(std::iter::once(file_name.as_str())),
                        );

                        self.install_file(&path, source)?;
                        entry.relative_path_source = Some(Cow::Owned(path));
                    }
                }

                self.merge(entry)
            }
            DiscoveredResource::PackageResource {
                package,
                relative_name,
                data,
            } => {
                let mut entry = Resource {
                    name: Cow::Owned(package.clone()),
                    is_package: true,
                    ..Resource::default()
                };

                match &self.location {
                    ResourceLocation::InMemory => {
                        let content = data.resolve_content().with_context(|| {
                            format!("reading resource {} of {}", relative_name, package)
                        })?;

                        entry.in_memory_package_resources = Some(vec![(
                            Cow::Owned(relative_name.clone()),
                            Cow::Owned(content),
                        )]);
                    }
                    ResourceLocation::RelativePath(prefix) => {
                        let path = relative_path(
                            std::iter::once(prefix.as_str())
                                .chain(package.split('.'))
                                .chain(std::iter::once(relative_name.as_str())),
                        );

                        self.install_file(&path, data)?;
                        entry.relative_path_package_resources =
                            Some(vec![(Cow::Owned(relative_name.clone()), Cow::Owned(path))]);
                    }
                }

                self.merge(entry)
            }
        }
    }

    /// Serialize the collection.
    pub fn oxidize(self) -> Result<CollectedResources> {
        let resources = self.resources.into_values().collect::<Vec<_>>();

        let mut snapshot = Vec::new();
        write_packed_resources_v1(&resources, &mut snapshot, None)
            .context("writing packed resources")?;

        debug!(
            "collected {} resources into {} byte snapshot",
            resources.len(),
            snapshot.len()
        );

        Ok(CollectedResources {
            snapshot,
            extra_files: self.extra_files,
        })
    }
}
