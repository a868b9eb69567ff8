// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{
        byte_source::ResourceStream,
        error::{ResourceError, Result},
        store::{ResourceEntry, ResourceStore},
        traversable::Traversable,
    },
    std::{collections::BTreeSet, path::Path},
};

/// Provides access to the resources of a single package.
///
/// Resource names are `/` delimited paths relative to the package.
#[derive(Clone, Copy, Debug)]
pub struct ResourceReader<'s> {
    store: &'s ResourceStore,
    entry: &'s ResourceEntry,
}

impl<'s> ResourceReader<'s> {
    pub(crate) fn new(store: &'s ResourceStore, entry: &'s ResourceEntry) -> Self {
        Self { store, entry }
    }

    /// Name of the package this reader is bound to.
    pub fn package(&self) -> &'s str {
        self.entry.name()
    }

    /// Names of all resources in the package, sorted.
    pub fn contents(&self) -> Vec<&'s str> {
        let mut names = self.entry.resource_names().collect::<Vec<_>>();
        names.sort_unstable();

        names
    }

    /// Whether `name` is a resource.
    ///
    /// Returns `true` for a registered resource and `false` for a directory
    /// containing resources. Any other name is [ResourceError::NotFound].
    pub fn is_resource(&self, name: &str) -> Result<bool> {
        if self.entry.has_resource(name) {
            Ok(true)
        } else if self.is_directory(name) {
            Ok(false)
        } else {
            Err(ResourceError::not_found(self.package(), name))
        }
    }

    /// Open a resource for reading.
    pub fn open_resource(&self, name: &str) -> Result<ResourceStream<'s>> {
        let source = self
            .entry
            .byte_source(name)
            .ok_or_else(|| ResourceError::not_found(self.package(), name))?;

        self.store.open(source)
    }

    /// Read the full content of a resource.
    pub fn read_resource(&self, name: &str) -> Result<Vec<u8>> {
        let source = self
            .entry
            .byte_source(name)
            .ok_or_else(|| ResourceError::not_found(self.package(), name))?;

        self.store.resolve(source)
    }

    /// Obtain the filesystem path of a resource.
    ///
    /// Resources whose bytes don't live in a file are
    /// [ResourceError::PathUnsupported].
    pub fn resource_path(&self, name: &str) -> Result<&'s Path> {
        let source = self
            .entry
            .byte_source(name)
            .ok_or_else(|| ResourceError::not_found(self.package(), name))?;

        source
            .real_path()
            .ok_or_else(|| ResourceError::path_unsupported(self.package(), name))
    }

    /// Obtain the root of the package as a traversable tree.
    pub fn files(&self) -> Traversable<'s> {
        Traversable::root(*self)
    }

    /// Whether the given name is a directory containing resources.
    ///
    /// Names are compared exactly, so a trailing `/` never matches.
    pub fn is_directory(&self, name: &str) -> bool {
        let prefix = format!("{}/", name);

        self.entry
            .resource_names()
            .any(|path| path.starts_with(&prefix))
    }

    /// List the immediate children of a directory, sorted.
    ///
    /// The empty string denotes the package root. Sub-directories are
    /// listed by their name.
    pub fn list_directory(&self, name: &str) -> Vec<&'s str> {
        let prefix = if name.is_empty() {
            String::new()
        } else {
            format!("{}/", name)
        };

        let entries = self
            .entry
            .resource_names()
            .filter_map(|path| path.strip_prefix(prefix.as_str()))
            .filter_map(|remaining| remaining.split('/').next())
            .collect::<BTreeSet<_>>();

        entries.into_iter().collect::<Vec<_>>()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            finder::ResourceFinder,
            store::{ResourceStore, StoreConfig},
        },
        once_cell::sync::Lazy,
        packed_resources::Resource,
        std::borrow::Cow,
    };

    static FINDER: Lazy<ResourceFinder> = Lazy::new(|| {
        let pkg = Resource {
            name: Cow::from("pkg"),
            is_package: true,
            in_memory_package_resources: Some(vec![
                (Cow::from("z.txt"), Cow::from(b"z".to_vec())),
                (Cow::from("dir/b.txt"), Cow::from(b"b".to_vec())),
                (Cow::from("dir/a.txt"), Cow::from(b"a".to_vec())),
                (Cow::from("dir/sub/c.txt"), Cow::from(b"c".to_vec())),
            ]),
            ..Resource::default()
        };

        let store = ResourceStore::from_resources(vec![pkg], &StoreConfig::default())
            .expect("store should build");

        ResourceFinder::new(store)
    });

    fn reader() -> ResourceReader<'static> {
        FINDER.get_resource_reader("pkg").unwrap()
    }

    #[test]
    fn test_contents_sorted() {
        let reader = reader();

        let expected = vec!["dir/a.txt", "dir/b.txt", "dir/sub/c.txt", "z.txt"];
        assert_eq!(reader.contents(), expected);
        assert_eq!(reader.contents(), expected);
    }

    #[test]
    fn test_is_resource() -> anyhow::Result<()> {
        let reader = reader();

        assert!(reader.is_resource("z.txt")?);
        assert!(reader.is_resource("dir/sub/c.txt")?);
        assert!(!reader.is_resource("dir")?);
        assert!(!reader.is_resource("dir/sub")?);
        assert!(matches!(
            reader.is_resource("dir/"),
            Err(ResourceError::NotFound { .. })
        ));
        assert!(matches!(
            reader.is_resource("missing"),
            Err(ResourceError::NotFound { .. })
        ));
        assert!(matches!(
            reader.is_resource("di"),
            Err(ResourceError::NotFound { .. })
        ));

        Ok(())
    }

    #[test]
    fn test_open_resource() -> anyhow::Result<()> {
        let reader = reader();

        assert_eq!(reader.open_resource("dir/a.txt")?.read_all()?, b"a");
        assert_eq!(reader.read_resource("z.txt")?, b"z");
        assert!(matches!(
            reader.open_resource("dir"),
            Err(ResourceError::NotFound { .. })
        ));

        Ok(())
    }

    #[test]
    fn test_resource_path_in_memory() {
        let reader = reader();

        assert!(matches!(
            reader.resource_path("z.txt"),
            Err(ResourceError::PathUnsupported { .. })
        ));
        assert!(matches!(
            reader.resource_path("missing"),
            Err(ResourceError::NotFound { .. })
        ));
    }

    #[test]
    fn test_directories() {
        let reader = reader();

        assert!(reader.is_directory("dir"));
        assert!(!reader.is_directory("dir/"));
        assert!(reader.is_directory("dir/sub"));
        assert!(!reader.is_directory("z.txt"));
        assert!(!reader.is_directory("di"));

        assert_eq!(reader.list_directory(""), vec!["dir", "z.txt"]);
        assert_eq!(reader.list_directory("dir"), vec!["a.txt", "b.txt", "sub"]);
        assert_eq!(reader.list_directory("dir/sub"), vec!["c.txt"]);
        assert!(reader.list_directory("dir/sub/").is_empty());
        assert!(reader.list_directory("missing").is_empty());
    }
}
