// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Functionality for scanning the filesystem for package resources. */

use {
    anyhow::{anyhow, Context, Result},
    log::debug,
    simple_file_manifest::FileData,
    std::{
        collections::HashSet,
        path::{Path, PathBuf},
    },
};

/// Settings controlling how files are classified during a scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanSettings {
    /// File suffixes denoting module source, including the leading dot.
    pub module_suffixes: Vec<String>,

    /// File stem marking a directory as a package.
    pub package_init_stem: String,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            module_suffixes: vec![".py".to_string()],
            package_init_stem: "__init__".to_string(),
        }
    }
}

impl ScanSettings {
    /// Resolve the module stem of a file name, if it is a module.
    fn module_stem<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        self.module_suffixes
            .iter()
            .find_map(|suffix| file_name.strip_suffix(suffix.as_str()))
            .filter(|stem| !stem.is_empty() && !stem.contains('.'))
    }
}

/// A resource discovered on the filesystem.
#[derive(Clone, Debug, PartialEq)]
pub enum DiscoveredResource {
    /// Source code for a module or package.
    Module {
        name: String,
        is_package: bool,
        source: FileData,
    },

    /// A non-module file belonging to a package.
    PackageResource {
        /// Leaf-most package containing the file.
        package: String,
        /// `/` delimited path relative to the package directory.
        relative_name: String,
        data: FileData,
    },
}

/// Walk a directory tree, sorted by file name, returning all files.
fn walk_tree_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = vec![];

    for entry in walkdir::WalkDir::new(root).sort_by(|a, b| a.file_name().cmp(b.file_name())) {
        let entry = entry.context("reading directory entry")?;

        if !entry.file_type().is_dir() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Find package resources in a directory.
///
/// Files with a module suffix become [DiscoveredResource::Module]. Every other
/// file is attributed to the leaf-most package directory containing it and
/// becomes a [DiscoveredResource::PackageResource]. Files not inside any
/// package are ignored.
///
/// Modules are emitted in walk order, followed by package resources.
pub fn find_resources_in_path(
    root: &Path,
    settings: &ScanSettings,
) -> Result<Vec<DiscoveredResource>> {
    if !root.is_dir() {
        return Err(anyhow!("path is not a directory: {}", root.display()));
    }

    let mut res = vec![];
    let mut seen_packages = HashSet::new();
    let mut resource_files = vec![];

    for path in walk_tree_files(root)? {
        let rel_path = path
            .strip_prefix(root)
            .context("stripping path prefix")?
            .to_path_buf();

        let components = match rel_path
            .iter()
            .map(|c| c.to_str())
            .collect::<Option<Vec<_>>>()
        {
            Some(components) => components,
            None => {
                debug!("ignoring non UTF-8 path {}", path.display());
                continue;
            }
        };

        let (file_name, directories) = match components.split_last() {
            Some(v) => v,
            None => continue,
        };

        if let Some(stem) = settings.module_stem(file_name) {
            let (name, is_package) = if stem == settings.package_init_stem {
                if directories.is_empty() {
                    debug!("ignoring package marker at scan root: {}", path.display());
                    continue;
                }

                (directories.join("."), true)
            } else {
                let mut parts = directories.to_vec();
                parts.push(stem);

                (parts.join("."), false)
            };

            if is_package {
                seen_packages.insert(name.clone());
            }

            res.push(DiscoveredResource::Module {
                name,
                is_package,
                source: FileData::Path(path.clone()),
            });
        } else {
            let components = components
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>();

            resource_files.push((path.clone(), components));
        }
    }

    // Packages are only fully known after the walk, so resource attribution
    // happens last.
    for (path, mut components) in resource_files {
        let mut relative_components = match components.pop() {
            Some(basename) => vec![basename],
            None => continue,
        };

        let mut package = None;

        while !components.is_empty() {
            let candidate = components.join(".");

            if seen_packages.contains(&candidate) {
                package = Some(candidate);
                break;
            }

            if let Some(popped) = components.pop() {
                relative_components.push(popped);
            }
        }

        match package {
            Some(package) => {
                relative_components.reverse();

                res.push(DiscoveredResource::PackageResource {
                    package,
                    relative_name: relative_components.join("/"),
                    data: FileData::Path(path),
                });
            }
            None => {
                debug!("ignoring file outside of any package: {}", path.display());
            }
        }
    }

    Ok(res)
}
