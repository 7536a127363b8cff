//! Integration tests for creating and mutating packages.

#![allow(non_snake_case)]

mod common;

use common::*;
use qmod::{
    ArchiveMode, FileCopy, Manifest, OpenOptions, Package, QmodError, ReadOnly, WriteOnly,
};
use std::io::Cursor;

// =============================================================================
// Creation
// =============================================================================

mod creation {
    use super::*;

    #[test]
    fn create___full_stream___updatable() {
        let package = Package::create(Cursor::new(Vec::new()), new_manifest()).unwrap();

        assert_eq!(package.mode(), ArchiveMode::Updatable);
        assert!(package.is_manifest_dirty());
    }

    #[test]
    fn create___write_only_stream___create_only() {
        let package = Package::create(WriteOnly(Vec::<u8>::new()), new_manifest()).unwrap();

        assert_eq!(package.mode(), ArchiveMode::CreateOnly);
    }

    #[test]
    fn create___read_only_stream___invalid_argument() {
        let bytes = example_package();

        let result = Package::create(ReadOnly(bytes.as_slice()), new_manifest());

        assert!(matches!(result, Err(QmodError::InvalidArgument(_))));
    }

    #[test]
    fn create___requested_read_only___invalid_argument() {
        let result = Package::create_with_mode(
            Cursor::new(Vec::new()),
            new_manifest(),
            Some(ArchiveMode::ReadOnly),
        );

        assert!(matches!(result, Err(QmodError::InvalidArgument(_))));
    }

    #[test]
    fn create___close___writes_manifest_and_files() {
        let mut buffer = Vec::new();
        let mut package = Package::create(Cursor::new(&mut buffer), new_manifest()).unwrap();
        package.create_mod_file("libmy-mod.so", &b"mod"[..]).unwrap();
        package
            .create_library_file("libbeatsaber-hook.so", &b"hook"[..])
            .unwrap();
        package.close().unwrap();

        let package = Package::open(Cursor::new(buffer), OpenOptions::default()).unwrap();
        assert_eq!(package.id(), "my-mod");
        assert_eq!(package.mod_files(), ["libmy-mod.so"]);
        assert_eq!(package.library_files(), ["libbeatsaber-hook.so"]);
    }

    #[test]
    fn create___create_only___writes_everything_on_close() {
        let mut buffer = Vec::new();
        let mut package = Package::create(WriteOnly(&mut buffer), new_manifest()).unwrap();
        package.create_mod_file("libmy-mod.so", &b"mod"[..]).unwrap();
        package.write_cover_image("cover.png", &b"cover"[..]).unwrap();
        package
            .add_file_copy(
                FileCopy::new("data.bin", "/sdcard/data.bin"),
                Some(&mut &b"data"[..]),
            )
            .unwrap();
        package.set_porter(Some("me")).unwrap();
        package.close().unwrap();

        let manifest = Manifest::parse(&read_raw_entry(&buffer, "mod.json").unwrap()).unwrap();
        assert_eq!(manifest.mod_files(), ["libmy-mod.so"]);
        assert_eq!(manifest.cover_image_path(), Some("cover.png"));
        assert_eq!(manifest.porter(), Some("me"));
        assert_eq!(read_raw_entry(&buffer, "data.bin").unwrap(), b"data");
        assert_eq!(read_raw_entry(&buffer, "cover.png").unwrap(), b"cover");
    }
}

// =============================================================================
// Create-only restrictions
// =============================================================================

mod create_only {
    use super::*;

    #[test]
    fn create_only___open_mod_file___invalid_operation() {
        let mut package = Package::create(WriteOnly(Vec::<u8>::new()), new_manifest()).unwrap();
        package.create_mod_file("libmy-mod.so", &b"mod"[..]).unwrap();

        let result = package.open_mod_file("libmy-mod.so");

        assert!(matches!(result, Err(QmodError::InvalidOperation(_))));
    }

    #[test]
    fn create_only___overwrite_mod_file___invalid_operation() {
        let mut package = Package::create(WriteOnly(Vec::<u8>::new()), new_manifest()).unwrap();
        package.create_mod_file("libmy-mod.so", &b"v1"[..]).unwrap();

        let result = package.create_mod_file("libmy-mod.so", &b"v2"[..]);

        assert!(matches!(result, Err(QmodError::InvalidOperation(_))));
    }

    #[test]
    fn create_only___delete_mod_file___invalid_operation() {
        let mut package = Package::create(WriteOnly(Vec::<u8>::new()), new_manifest()).unwrap();
        package.create_mod_file("libmy-mod.so", &b"v1"[..]).unwrap();

        let result = package.delete_mod_file("libmy-mod.so");

        assert!(matches!(result, Err(QmodError::InvalidOperation(_))));
        assert_eq!(package.mod_files(), ["libmy-mod.so"]);
    }

    #[test]
    fn create_only___set_cover_image_path___invalid_operation() {
        let mut package = Package::create(WriteOnly(Vec::<u8>::new()), new_manifest()).unwrap();
        package.write_cover_image("cover.png", &b"cover"[..]).unwrap();

        let result = package.set_cover_image_path(Some("other.png"));

        assert!(matches!(result, Err(QmodError::InvalidOperation(_))));
    }

    #[test]
    fn create_only___open_cover_image___invalid_operation() {
        let mut package = Package::create(WriteOnly(Vec::<u8>::new()), new_manifest()).unwrap();
        package.write_cover_image("cover.png", &b"cover"[..]).unwrap();

        assert!(matches!(
            package.open_cover_image(),
            Err(QmodError::InvalidOperation(_))
        ));
    }
}

// =============================================================================
// Read-only restrictions
// =============================================================================

mod read_only {
    use super::*;

    fn assert_invalid_operation<T: std::fmt::Debug>(result: Result<T, QmodError>) {
        assert!(
            matches!(result, Err(QmodError::InvalidOperation(_))),
            "expected InvalidOperation, got {result:?}"
        );
    }

    #[test]
    fn read_only___rejects_every_mutation() {
        let bytes = example_package();
        let mut package = Package::open(ReadOnly(bytes.as_slice()), OpenOptions::default()).unwrap();

        assert_invalid_operation(package.set_id("other-id"));
        assert_invalid_operation(package.set_author("someone"));
        assert_invalid_operation(package.set_version("3.0.0"));
        assert_invalid_operation(package.create_mod_file("libnew.so", &b"x"[..]));
        assert_invalid_operation(package.create_library_file("libnew.so", &b"x"[..]));
        assert_invalid_operation(package.delete_mod_file("libexample-mod.so"));
        assert_invalid_operation(package.write_cover_image("cover.png", &b"x"[..]));
        assert_invalid_operation(package.set_cover_image_path(None));
        assert_invalid_operation(
            package.add_file_copy(FileCopy::new("new.txt", "/sdcard/new.txt"), Some(&mut &b"x"[..])),
        );
        assert_invalid_operation(package.remove_file_copy(&FileCopy::new(
            "myFile.png",
            "/sdcard/ModData/com.my.game/myFile.png",
        )));

        assert!(!package.is_manifest_dirty());
    }

    #[test]
    fn read_only___permits_reads() {
        let bytes = example_package();
        let mut package = Package::open(ReadOnly(bytes.as_slice()), OpenOptions::default()).unwrap();

        assert_eq!(
            read_all(package.open_mod_file("libexample-mod.so").unwrap()),
            b"mod file"
        );
        assert_eq!(read_all(package.open_cover_image().unwrap()), b"cover image");
    }
}

// =============================================================================
// Mod and library files
// =============================================================================

mod role_files {
    use super::*;

    fn open_example() -> Package<qmod::ZipStore<Cursor<Vec<u8>>>> {
        Package::open(Cursor::new(example_package()), OpenOptions::default()).unwrap()
    }

    #[test]
    fn create_mod_file___new_path___appends_to_list() {
        let mut package = open_example();

        package.create_mod_file("libsecond.so", &b"second"[..]).unwrap();

        assert_eq!(package.mod_files(), ["libexample-mod.so", "libsecond.so"]);
        assert!(package.is_manifest_dirty());
    }

    #[test]
    fn create_mod_file___listed_path___overwrites_contents() {
        let mut package = open_example();

        package
            .create_mod_file("libexample-mod.so", &b"updated"[..])
            .unwrap();

        assert_eq!(package.mod_files(), ["libexample-mod.so"]);
        assert_eq!(
            read_all(package.open_mod_file("libexample-mod.so").unwrap()),
            b"updated"
        );
    }

    #[test]
    fn create_library_file___path_of_mod_file___invalid_argument() {
        let mut package = open_example();

        let result = package.create_library_file("libexample-mod.so", &b"lib"[..]);

        assert!(matches!(result, Err(QmodError::InvalidArgument(_))));
        assert_eq!(package.library_files(), ["libmy-library.so"]);
    }

    #[test]
    fn create_mod_file___manifest_path___invalid_argument() {
        let mut package = open_example();

        let result = package.create_mod_file("mod.json", &b"{}"[..]);

        assert!(matches!(result, Err(QmodError::InvalidArgument(_))));
    }

    #[test]
    fn delete_mod_file___removes_entry_and_listing() {
        let mut package = open_example();

        package.delete_mod_file("libexample-mod.so").unwrap();

        assert!(package.mod_files().is_empty());
        assert!(!package.has_entry("libexample-mod.so"));
    }

    #[test]
    fn delete_mod_file___unlisted___not_found() {
        let mut package = open_example();

        let result = package.delete_mod_file("libmy-library.so");

        assert!(matches!(result, Err(QmodError::NotFound(_))));
        assert!(package.has_entry("libmy-library.so"));
    }

    #[test]
    fn open_library_file___unlisted___not_found() {
        let mut package = open_example();

        assert!(matches!(
            package.open_library_file("libexample-mod.so"),
            Err(QmodError::NotFound(_))
        ));
    }
}

// =============================================================================
// File copies
// =============================================================================

mod file_copies {
    use super::*;

    fn empty_package() -> Package<qmod::ZipStore<Cursor<Vec<u8>>>> {
        Package::create(Cursor::new(Vec::new()), new_manifest()).unwrap()
    }

    #[test]
    fn add_file_copy___shared_origin___written_once_and_refcounted() {
        let mut package = empty_package();
        let first = FileCopy::new("shared.bin", "/sdcard/first.bin");
        let second = FileCopy::new("shared.bin", "/sdcard/second.bin");

        package
            .add_file_copy(first.clone(), Some(&mut &b"shared"[..]))
            .unwrap();
        package.add_file_copy(second.clone(), None).unwrap();

        assert_eq!(package.file_copies(), [first.clone(), second.clone()]);
        assert_eq!(read_all(package.open_file_copy(&second).unwrap()), b"shared");

        package.remove_file_copy(&first).unwrap();
        assert!(package.has_entry("shared.bin"));
        assert_eq!(package.file_copies(), [second.clone()]);

        package.remove_file_copy(&second).unwrap();
        assert!(!package.has_entry("shared.bin"));
        assert!(package.file_copies().is_empty());
    }

    #[test]
    fn add_file_copy___no_origin_and_no_source___invalid_argument() {
        let mut package = empty_package();

        let result = package.add_file_copy(FileCopy::new("data.bin", "/sdcard/data.bin"), None);

        assert!(matches!(result, Err(QmodError::InvalidArgument(_))));
        assert!(package.file_copies().is_empty());
    }

    #[test]
    fn add_file_copy___unrelated_existing_entry___invalid_argument() {
        let mut package = empty_package();
        package.create_mod_file("libmod.so", &b"elf"[..]).unwrap();

        let result = package.add_file_copy(
            FileCopy::new("libmod.so", "/sdcard/libmod.so"),
            Some(&mut &b"other"[..]),
        );

        assert!(matches!(result, Err(QmodError::InvalidArgument(_))));
        assert_eq!(read_all(package.open_mod_file("libmod.so").unwrap()), b"elf");
    }

    #[test]
    fn add_file_copy___shared_origin_with_source___overwrites_origin() {
        let mut package = empty_package();
        let copy = FileCopy::new("data.bin", "/sdcard/data.bin");
        package
            .add_file_copy(copy.clone(), Some(&mut &b"v1"[..]))
            .unwrap();

        package
            .add_file_copy(
                FileCopy::new("data.bin", "/sdcard/other.bin"),
                Some(&mut &b"v2"[..]),
            )
            .unwrap();

        assert_eq!(read_all(package.open_file_copy(&copy).unwrap()), b"v2");
        assert_eq!(package.file_copies().len(), 2);
    }

    #[test]
    fn add_file_copy___same_record_twice___listed_once() {
        let mut package = empty_package();
        let copy = FileCopy::new("data.bin", "/sdcard/data.bin");

        package
            .add_file_copy(copy.clone(), Some(&mut &b"v1"[..]))
            .unwrap();
        package.add_file_copy(copy.clone(), None).unwrap();

        assert_eq!(package.file_copies(), [copy]);
    }

    #[test]
    fn remove_file_copy___unknown_record___not_found() {
        let mut package = empty_package();
        package
            .add_file_copy(
                FileCopy::new("data.bin", "/sdcard/data.bin"),
                Some(&mut &b"data"[..]),
            )
            .unwrap();

        let result = package.remove_file_copy(&FileCopy::new("data.bin", "/sdcard/elsewhere.bin"));

        assert!(matches!(result, Err(QmodError::NotFound(_))));
        assert!(package.has_entry("data.bin"));
    }

    #[test]
    fn open_file_copy___unknown___not_found() {
        let mut package = empty_package();

        let result = package.open_file_copy(&FileCopy::new("data.bin", "/sdcard/data.bin"));

        assert!(matches!(result, Err(QmodError::NotFound(_))));
    }
}

// =============================================================================
// Cover image
// =============================================================================

mod cover_image {
    use super::*;

    #[test]
    fn set_cover_image_path___rename___byte_identical() {
        let mut package =
            Package::open(Cursor::new(example_package()), OpenOptions::default()).unwrap();

        package.set_cover_image_path(Some("renamed.png")).unwrap();

        assert!(!package.has_entry("myCover.png"));
        assert!(package.has_entry("renamed.png"));
        assert_eq!(read_all(package.open_cover_image().unwrap()), b"cover image");
    }

    #[test]
    fn set_cover_image_path___onto_stated_file___rejected() {
        let mut package =
            Package::open(Cursor::new(example_package()), OpenOptions::default()).unwrap();

        let result = package.set_cover_image_path(Some("libexample-mod.so"));

        assert!(matches!(result, Err(QmodError::InvalidArgument(_))));
        assert_eq!(package.cover_image_path(), Some("myCover.png"));
        assert!(!package.is_manifest_dirty());
    }

    #[test]
    fn write_cover_image___new_package___sets_path() {
        let mut package = Package::create(Cursor::new(Vec::new()), new_manifest()).unwrap();

        package.write_cover_image("cover.png", &b"png"[..]).unwrap();

        assert_eq!(package.cover_image_path(), Some("cover.png"));
        assert_eq!(read_all(package.open_cover_image().unwrap()), b"png");
    }
}
