// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    anyhow::Result,
    oxidized_resources::{ResourceError, ResourceFinder, ResourceStore, StoreConfig, TextOptions},
    packed_resources::{write_packed_resources_v1, BlobInteriorPadding, Resource},
    std::borrow::Cow,
};

/// Build a finder over a snapshot holding one package with in-memory files.
fn finder_with_package(package: &str, files: &[(&str, &[u8])]) -> Result<ResourceFinder> {
    let resource = Resource {
        name: Cow::Owned(package.to_string()),
        is_package: true,
        in_memory_package_resources: if files.is_empty() {
            None
        } else {
            Some(
                files
                    .iter()
                    .map(|(name, data)| (Cow::Owned(name.to_string()), Cow::Owned(data.to_vec())))
                    .collect(),
            )
        },
        ..Resource::default()
    };

    let mut data = Vec::new();
    write_packed_resources_v1(&[resource], &mut data, Some(BlobInteriorPadding::Null))?;

    Ok(ResourceFinder::new(ResourceStore::from_snapshot(
        data,
        &StoreConfig::default(),
    )?))
}

#[test]
fn empty_package() -> Result<()> {
    let finder = finder_with_package("pkg", &[])?;
    let reader = finder.get_resource_reader("pkg").unwrap();

    assert!(reader.contents().is_empty());
    assert!(matches!(
        reader.is_resource("anything"),
        Err(ResourceError::NotFound { .. })
    ));
    assert!(matches!(
        reader.open_resource("anything"),
        Err(ResourceError::NotFound { .. })
    ));
    assert!(reader.files().iterdir().is_empty());

    Ok(())
}

#[test]
fn registered_resources_round_trip() -> Result<()> {
    let files: &[(&str, &[u8])] = &[
        ("a.bin", b"\x00\x01\x02"),
        ("empty", b""),
        ("nested/deep/c.txt", b"deep"),
    ];
    let finder = finder_with_package("pkg", files)?;
    let reader = finder.get_resource_reader("pkg").unwrap();

    for (name, data) in files {
        assert!(reader.is_resource(name)?);
        assert_eq!(&reader.open_resource(name)?.read_all()?, data);
        assert!(matches!(
            reader.resource_path(name),
            Err(ResourceError::PathUnsupported { .. })
        ));
    }

    Ok(())
}

#[test]
fn contents_sorted_and_stable() -> Result<()> {
    let finder = finder_with_package("pkg", &[("b", b""), ("a/z", b""), ("a", b""), ("C", b"")])?;
    let reader = finder.get_resource_reader("pkg").unwrap();

    let first = reader.contents();
    assert_eq!(first, vec!["C", "a", "a/z", "b"]);
    assert_eq!(reader.contents(), first);

    Ok(())
}

#[test]
fn single_resource() -> Result<()> {
    let finder = finder_with_package("pkg", &[("resource.txt", b"my resource")])?;
    let reader = finder.get_resource_reader("pkg").unwrap();

    assert_eq!(reader.contents(), vec!["resource.txt"]);
    assert!(matches!(
        reader.is_resource("missing"),
        Err(ResourceError::NotFound { .. })
    ));
    assert_eq!(
        reader.open_resource("resource.txt")?.read_all()?,
        b"my resource"
    );

    Ok(())
}

#[test]
fn nested_resources() -> Result<()> {
    let finder = finder_with_package("pkg", &[("child1/b.txt", b"b"), ("child0/a.txt", b"a")])?;
    let reader = finder.get_resource_reader("pkg").unwrap();

    assert_eq!(reader.contents(), vec!["child0/a.txt", "child1/b.txt"]);
    assert_eq!(reader.open_resource("child0/a.txt")?.read_all()?, b"a");
    assert_eq!(reader.open_resource("child1/b.txt")?.read_all()?, b"b");

    let root = reader.files();
    assert_eq!(root.join("child0/a.txt").read_bytes()?, b"a");
    assert_eq!(root.join("child1").join("b.txt").read_bytes()?, b"b");

    Ok(())
}

#[test]
fn traversable_join_equivalence() -> Result<()> {
    let finder = finder_with_package("pkg", &[("child0/child1/b.txt", b"b")])?;
    let root = finder.get_resource_reader("pkg").unwrap().files();

    assert_eq!(root.join("child0/child1"), root.join("child0").join("child1"));
    assert_eq!(
        root.joinpath(["child0", "child1"]),
        root.join("child0").join("child1")
    );

    let leaf = root.join("child0/child1/b.txt");
    assert_eq!(leaf.name(), "b.txt");
    assert_eq!(leaf, &root / "child0" / "child1" / "b.txt");
    assert_eq!(leaf.read_text(&TextOptions::default())?, "b");

    let abc = finder_with_package("pkg", &[("a/b/c", b"abc")])?;
    let root = abc.get_resource_reader("pkg").unwrap().files();
    let one = root.join("a/b/c");
    let chained = root.join("a").join("b").join("c");
    let multi = root.joinpath(["a", "b", "c"]);

    assert_eq!(one, chained);
    assert_eq!(one, multi);
    for node in [&one, &chained, &multi] {
        assert_eq!(node.name(), "c");
        assert_eq!(node.open()?.read_all()?, b"abc");
    }

    Ok(())
}

#[test]
fn text_round_trip() -> Result<()> {
    let text = "línea 1\nline 2 ✓\n";
    let finder = finder_with_package("pkg", &[("text.txt", text.as_bytes())])?;
    let node = finder
        .get_resource_reader("pkg")
        .unwrap()
        .files()
        .join("text.txt");

    assert_eq!(node.read_bytes()?, text.as_bytes());
    assert_eq!(node.read_text(&TextOptions::default())?, text);

    Ok(())
}

#[test]
fn multiple_finders_coexist() -> Result<()> {
    let first = finder_with_package("pkg", &[("a.txt", b"first")])?;
    let second = finder_with_package("pkg", &[("a.txt", b"second")])?;

    let a = first.get_resource_reader("pkg").unwrap();
    let b = second.get_resource_reader("pkg").unwrap();

    assert_eq!(a.open_resource("a.txt")?.read_all()?, b"first");
    assert_eq!(b.open_resource("a.txt")?.read_all()?, b"second");

    Ok(())
}

#[test]
fn concurrent_readers() -> Result<()> {
    let finder = finder_with_package("pkg", &[("a.txt", b"shared"), ("b/c.txt", b"nested")])?;

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let reader = finder.get_resource_reader("pkg").unwrap();
                assert_eq!(reader.contents(), vec!["a.txt", "b/c.txt"]);
                assert_eq!(reader.read_resource("b/c.txt").unwrap(), b"nested");
            });
        }
    });

    Ok(())
}
