// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*!
Hierarchical views of package resources.

Resource names are flat `/` delimited strings. A [Traversable] is a node in
the virtual directory tree implied by those names. Nodes carry only their
path and are classified on demand against the package's resource names, so
joining never fails and nothing is cached.
*/

use {
    crate::{
        byte_source::ResourceStream,
        error::{ResourceError, Result},
        reader::ResourceReader,
    },
    encoding_rs::{DecoderResult, Encoding},
    std::{fmt, io::Cursor, ops::Div},
};

/// How to handle malformed input when decoding text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeErrors {
    /// Malformed input is an error.
    Strict,
    /// Malformed sequences are replaced with U+FFFD.
    Replace,
    /// Malformed sequences are dropped.
    Ignore,
}

impl TryFrom<&str> for DecodeErrors {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "strict" => Ok(Self::Strict),
            "replace" => Ok(Self::Replace),
            "ignore" => Ok(Self::Ignore),
            _ => Err(format!("{} is not a valid decode errors policy", value)),
        }
    }
}

/// Options for reading a resource as text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextOptions {
    encoding: String,
    errors: DecodeErrors,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            encoding: "utf-8".to_string(),
            errors: DecodeErrors::Strict,
        }
    }
}

impl TextOptions {
    /// Set the encoding label, e.g. `latin-1` or `utf-16le`.
    pub fn with_encoding(mut self, label: impl ToString) -> Self {
        self.encoding = label.to_string();
        self
    }

    pub fn with_errors(mut self, errors: DecodeErrors) -> Self {
        self.errors = errors;
        self
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn errors(&self) -> DecodeErrors {
        self.errors
    }

    /// Decode bytes according to these options.
    pub fn decode(&self, data: &[u8]) -> Result<String> {
        let encoding = Encoding::for_label(self.encoding.as_bytes()).ok_or_else(|| {
            ResourceError::Decode(format!("unknown encoding: {}", self.encoding))
        })?;

        match self.errors {
            DecodeErrors::Strict => encoding
                .decode_without_bom_handling_and_without_replacement(data)
                .map(|s| s.into_owned())
                .ok_or_else(|| {
                    ResourceError::Decode(format!("data is not valid {}", encoding.name()))
                }),
            DecodeErrors::Replace => Ok(encoding.decode_without_bom_handling(data).0.into_owned()),
            DecodeErrors::Ignore => {
                let mut decoder = encoding.new_decoder_without_bom_handling();
                let mut output = String::with_capacity(
                    decoder
                        .max_utf8_buffer_length_without_replacement(data.len())
                        .unwrap_or(data.len()),
                );
                let mut input = data;

                loop {
                    let (result, read) =
                        decoder.decode_to_string_without_replacement(input, &mut output, true);
                    input = &input[read..];

                    match result {
                        DecoderResult::InputEmpty => break,
                        DecoderResult::OutputFull => {
                            let additional = decoder
                                .max_utf8_buffer_length_without_replacement(input.len())
                                .unwrap_or(input.len());
                            output.reserve(additional.max(4));
                        }
                        DecoderResult::Malformed(_, _) => {}
                    }
                }

                Ok(output)
            }
        }
    }
}

/// Split user provided path strings into normalized segments.
fn split_segments<'a>(value: &'a str) -> impl Iterator<Item = &'a str> {
    value.split('/').filter(|segment| !segment.is_empty())
}

/// A node in the virtual directory tree of a package's resources.
#[derive(Clone, Debug)]
pub struct Traversable<'s> {
    reader: ResourceReader<'s>,
    segments: Vec<String>,
}

impl<'s> Traversable<'s> {
    pub(crate) fn root(reader: ResourceReader<'s>) -> Self {
        Self {
            reader,
            segments: vec![],
        }
    }

    /// Name of the package this node belongs to.
    pub fn package(&self) -> &'s str {
        self.reader.package()
    }

    /// Path of this node relative to the package root.
    ///
    /// The root node has an empty path.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    /// Final segment of this node's path.
    ///
    /// The root node is named after its package.
    pub fn name(&self) -> &str {
        match self.segments.last() {
            Some(segment) => segment.as_str(),
            None => self.package(),
        }
    }

    /// Whether this node is a registered resource.
    pub fn is_file(&self) -> bool {
        !self.segments.is_empty() && matches!(self.reader.is_resource(&self.path()), Ok(true))
    }

    /// Whether this node is a directory containing resources.
    pub fn is_dir(&self) -> bool {
        self.segments.is_empty() || self.reader.is_directory(&self.path())
    }

    /// Obtain a child node.
    ///
    /// `child` may contain `/` to descend multiple levels.
    pub fn join(&self, child: &str) -> Self {
        self.joinpath([child])
    }

    /// Obtain a descendant node by joining multiple children.
    pub fn joinpath<I, S>(&self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut segments = self.segments.clone();

        for child in children {
            segments.extend(split_segments(child.as_ref()).map(|s| s.to_string()));
        }

        Self {
            reader: self.reader,
            segments,
        }
    }

    /// Immediate children of this node, sorted by name.
    ///
    /// Files have no children.
    pub fn iterdir(&self) -> Vec<Traversable<'s>> {
        if !self.is_dir() {
            return vec![];
        }

        self.reader
            .list_directory(&self.path())
            .into_iter()
            .map(|name| self.join(name))
            .collect()
    }

    /// Open this node for reading bytes.
    pub fn open(&self) -> Result<ResourceStream<'s>> {
        self.reader.open_resource(&self.path())
    }

    /// Read the full content of this node.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        self.reader.read_resource(&self.path())
    }

    /// Open this node for reading decoded text.
    pub fn open_text(&self, options: &TextOptions) -> Result<Cursor<String>> {
        Ok(Cursor::new(self.read_text(options)?))
    }

    /// Read the full content of this node as decoded text.
    pub fn read_text(&self, options: &TextOptions) -> Result<String> {
        options.decode(&self.read_bytes()?)
    }
}

impl<'s> PartialEq for Traversable<'s> {
    fn eq(&self, other: &Self) -> bool {
        self.package() == other.package() && self.segments == other.segments
    }
}

impl<'s> Eq for Traversable<'s> {}

impl<'s> fmt::Display for Traversable<'s> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "{}", self.package())
        } else {
            write!(f, "{}/{}", self.package(), self.path())
        }
    }
}

impl<'a, 's> Div<&'a str> for &Traversable<'s> {
    type Output = Traversable<'s>;

    fn div(self, rhs: &'a str) -> Self::Output {
        self.join(rhs)
    }
}

impl<'a, 's> Div<&'a str> for Traversable<'s> {
    type Output = Traversable<'s>;

    fn div(self, rhs: &'a str) -> Self::Output {
        self.join(rhs)
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
        packed_resources::Resource,
        std::{borrow::Cow, io::BufRead},
    };

    fn finder(files: &[(&str, &[u8])]) -> ResourceFinder {
        let pkg = Resource {
            name: Cow::from("pkg"),
            is_package: true,
            in_memory_package_resources: Some(
                files
                    .iter()
                    .map(|(k, v)| (Cow::Owned(k.to_string()), Cow::Owned(v.to_vec())))
                    .collect(),
            ),
            ..Resource::default()
        };

        ResourceFinder::new(
            ResourceStore::from_resources(vec![pkg], &StoreConfig::default()).unwrap(),
        )
    }

    #[test]
    fn test_join_conventions_equivalent() -> anyhow::Result<()> {
        let finder = finder(&[("a/b/c", b"leaf")]);
        let root = finder.get_resource_reader("pkg").unwrap().files();

        let single = root.join("a/b/c");
        let chained = root.join("a").join("b").join("c");
        let multiple = root.joinpath(["a", "b", "c"]);
        let mixed = root.joinpath(vec!["a/b", "c"]);
        let operator = &root / "a" / "b/c";

        for node in [&chained, &multiple, &mixed, &operator] {
            assert_eq!(node, &single);
            assert_eq!(node.name(), "c");
            assert_eq!(node.read_bytes()?, b"leaf");
        }

        Ok(())
    }

    #[test]
    fn test_empty_segments_ignored() {
        let finder = finder(&[("a/b.txt", b"")]);
        let root = finder.get_resource_reader("pkg").unwrap().files();

        assert_eq!(root.join("/a//b.txt/"), root.join("a").join("b.txt"));
        assert_eq!(root.join(""), root);
    }

    #[test]
    fn test_equality_includes_package() {
        let finder = finder(&[("a.txt", b"")]);
        let other = ResourceFinder::new(
            ResourceStore::from_resources(
                vec![Resource {
                    name: Cow::from("other"),
                    is_package: true,
                    ..Resource::default()
                }],
                &StoreConfig::default(),
            )
            .unwrap(),
        );

        let a = finder.get_resource_reader("pkg").unwrap().files().join("a.txt");
        let b = other
            .get_resource_reader("other")
            .unwrap()
            .files()
            .join("a.txt");

        assert_ne!(a, b);
    }

    #[test]
    fn test_classification() {
        let finder = finder(&[("child0/child1/b.txt", b"b")]);
        let root = finder.get_resource_reader("pkg").unwrap().files();

        assert!(root.is_dir());
        assert!(!root.is_file());
        assert_eq!(root.name(), "pkg");
        assert_eq!(root.to_string(), "pkg");

        let dir = root.join("child0");
        assert!(dir.is_dir());
        assert!(!dir.is_file());
        assert!(matches!(dir.open(), Err(ResourceError::NotFound { .. })));

        let leaf = dir.join("child1/b.txt");
        assert!(leaf.is_file());
        assert!(!leaf.is_dir());
        assert_eq!(leaf.path(), "child0/child1/b.txt");
        assert_eq!(leaf.to_string(), "pkg/child0/child1/b.txt");

        let missing = root.join("nope");
        assert!(!missing.is_file());
        assert!(!missing.is_dir());
        assert!(matches!(
            missing.read_bytes(),
            Err(ResourceError::NotFound { .. })
        ));
        assert!(matches!(root.open(), Err(ResourceError::NotFound { .. })));
    }

    #[test]
    fn test_iterdir() {
        let finder = finder(&[("b.txt", b""), ("a/x.txt", b""), ("a/y/z.txt", b"")]);
        let root = finder.get_resource_reader("pkg").unwrap().files();

        let names = |node: &Traversable| {
            node.iterdir()
                .iter()
                .map(|n| n.name().to_string())
                .collect::<Vec<_>>()
        };

        assert_eq!(names(&root), vec!["a", "b.txt"]);
        assert_eq!(names(&root.join("a")), vec!["x.txt", "y"]);
        assert!(root.join("b.txt").iterdir().is_empty());
        assert_eq!(root.iterdir()[0], root.join("a"));
    }

    #[test]
    fn test_text() -> anyhow::Result<()> {
        let finder = finder(&[
            ("utf8.txt", "héllo\nworld".as_bytes()),
            ("latin1.txt", b"caf\xe9"),
            ("bad.txt", b"ok\xffok"),
        ]);
        let root = finder.get_resource_reader("pkg").unwrap().files();

        let utf8 = root.join("utf8.txt");
        assert_eq!(utf8.read_text(&TextOptions::default())?, "héllo\nworld");
        let lines = utf8
            .open_text(&TextOptions::default())?
            .lines()
            .collect::<std::io::Result<Vec<_>>>()?;
        assert_eq!(lines, vec!["héllo", "world"]);

        let latin1 = TextOptions::default().with_encoding("latin1");
        assert_eq!(root.join("latin1.txt").read_text(&latin1)?, "café");

        let bad = root.join("bad.txt");
        assert!(matches!(
            bad.read_text(&TextOptions::default()),
            Err(ResourceError::Decode(_))
        ));
        assert_eq!(
            bad.read_text(&TextOptions::default().with_errors(DecodeErrors::Replace))?,
            "ok\u{fffd}ok"
        );
        assert_eq!(
            bad.read_text(&TextOptions::default().with_errors(DecodeErrors::Ignore))?,
            "okok"
        );

        assert!(matches!(
            bad.read_text(&TextOptions::default().with_encoding("no-such-codec")),
            Err(ResourceError::Decode(_))
        ));

        Ok(())
    }

    #[test]
    fn test_decode_errors_from_str() {
        assert_eq!(DecodeErrors::try_from("ignore"), Ok(DecodeErrors::Ignore));
        assert!(DecodeErrors::try_from("bogus").is_err());
    }
}
