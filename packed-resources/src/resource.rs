// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::borrow::Cow;

/// A named data file owned by a package, as `(relative name, value)`.
pub type PackageResourceItem<'a, V> = (Cow<'a, str>, V);

/// Represents an indexed resource.
///
/// The resource has a dotted name and is optionally a package. Packages can
/// own data files, which are addressed by slash-delimited names relative to
/// the package.
///
/// The data for the resource may be present in the instance or referenced
/// via a filesystem path relative to some origin directory.
///
/// Data fields are `Cow<T>` and can either hold a borrowed reference or
/// owned data. This allows the use of a single type to both hold
/// data or reference it from some other location.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resource<'a> {
    /// The resource name.
    pub name: Cow<'a, str>,

    /// Whether this resource is a package capable of owning data files.
    pub is_package: bool,

    /// Source code for this resource, held in memory.
    pub in_memory_source: Option<Cow<'a, [u8]>>,

    /// Relative path to file containing source code, encoded in UTF-8.
    pub relative_path_source: Option<Cow<'a, str>>,

    /// Package data files with their content held in memory.
    ///
    /// Order is preserved from the producer.
    pub in_memory_package_resources: Option<Vec<PackageResourceItem<'a, Cow<'a, [u8]>>>>,

    /// Package data files with their content living at relative filesystem paths.
    ///
    /// Paths are UTF-8 and use `/` as the directory separator.
    pub relative_path_package_resources: Option<Vec<PackageResourceItem<'a, Cow<'a, str>>>>,
}

impl<'a> AsRef<Resource<'a>> for Resource<'a> {
    fn as_ref(&self) -> &Resource<'a> {
        self
    }
}

impl<'a> Resource<'a> {
    /// Iterate over the names of all package data files, in producer order.
    ///
    /// In-memory resources are emitted before filesystem relative ones.
    pub fn package_resource_names(&self) -> impl Iterator<Item = &str> + '_ {
        let memory = self
            .in_memory_package_resources
            .iter()
            .flatten()
            .map(|(name, _)| name.as_ref());
        let relative = self
            .relative_path_package_resources
            .iter()
            .flatten()
            .map(|(name, _)| name.as_ref());

        memory.chain(relative)
    }

    /// Merge another resource into this one.
    ///
    /// Scalar fields from other will overwrite fields from self. Package
    /// resource lists are appended.
    pub fn merge_from(&mut self, other: Resource<'a>) -> Result<(), &'static str> {
        if self.name != other.name {
            return Err("resource names must be identical to perform a merge");
        }

        self.is_package |= other.is_package;
        if let Some(value) = other.in_memory_source {
            self.in_memory_source.replace(value);
        }
        if let Some(value) = other.relative_path_source {
            self.relative_path_source.replace(value);
        }
        if let Some(value) = other.in_memory_package_resources {
            self.in_memory_package_resources
                .get_or_insert_with(Vec::new)
                .extend(value);
        }
        if let Some(value) = other.relative_path_package_resources {
            self.relative_path_package_resources
                .get_or_insert_with(Vec::new)
                .extend(value);
        }

        Ok(())
    }

    /// Obtain a copy of this resource that owns all of its data.
    pub fn to_owned(&self) -> Resource<'static> {
        Resource {
            name: Cow::Owned(self.name.clone().into_owned()),
            is_package: self.is_package,
            in_memory_source: self
                .in_memory_source
                .as_ref()
                .map(|value| Cow::Owned(value.clone().into_owned())),
            relative_path_source: self
                .relative_path_source
                .as_ref()
                .map(|value| Cow::Owned(value.clone().into_owned())),
            in_memory_package_resources: self.in_memory_package_resources.as_ref().map(|value| {
                value
                    .iter()
                    .map(|(k, v)| {
                        (
                            Cow::Owned(k.clone().into_owned()),
                            Cow::Owned(v.clone().into_owned()),
                        )
                    })
                    .collect()
            }),
            relative_path_package_resources: self.relative_path_package_resources.as_ref().map(
                |value| {
                    value
                        .iter()
                        .map(|(k, v)| {
                            (
                                Cow::Owned(k.clone().into_owned()),
                                Cow::Owned(v.clone().into_owned()),
                            )
                        })
                        .collect()
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_name_mismatch() {
        let mut a = Resource {
            name: Cow::from("foo"),
            ..Resource::default()
        };

        let b = Resource {
            name: Cow::from("bar"),
            ..Resource::default()
        };

        assert_eq!(
            a.merge_from(b),
            Err("resource names must be identical to perform a merge")
        );
    }

    #[test]
    fn test_merge_appends_package_resources() {
        let mut a = Resource {
            name: Cow::from("foo"),
            in_memory_source: Some(Cow::from(b"source".to_vec())),
            in_memory_package_resources: Some(vec![(
                Cow::from("a.txt"),
                Cow::from(b"a".to_vec()),
            )]),
            ..Resource::default()
        };

        let b = Resource {
            name: Cow::from("foo"),
            is_package: true,
            in_memory_package_resources: Some(vec![(
                Cow::from("b.txt"),
                Cow::from(b"b".to_vec()),
            )]),
            ..Resource::default()
        };

        a.merge_from(b).unwrap();

        assert!(a.is_package);
        assert_eq!(a.in_memory_source.as_deref(), Some(&b"source"[..]));
        assert_eq!(
            a.package_resource_names().collect::<Vec<_>>(),
            vec!["a.txt", "b.txt"]
        );
    }

    #[test]
    fn test_to_owned() {
        let data = b"content".to_vec();

        let resource = Resource {
            name: Cow::Borrowed("foo"),
            relative_path_package_resources: Some(vec![(
                Cow::Borrowed("dir/file.txt"),
                Cow::Borrowed("lib/foo/dir/file.txt"),
            )]),
            in_memory_package_resources: Some(vec![(
                Cow::Borrowed("resource.txt"),
                Cow::Borrowed(data.as_slice()),
            )]),
            ..Resource::default()
        };

        let owned = resource.to_owned();
        drop(resource);
        drop(data);

        assert_eq!(owned.name, "foo");
        assert_eq!(
            owned.package_resource_names().collect::<Vec<_>>(),
            vec!["resource.txt", "dir/file.txt"]
        );
    }
}
