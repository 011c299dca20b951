#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for archive chain resolution
//!
//! Every test writes a small game directory with `ArchiveBuilder` and
//! opens it through `ArchiveChain`.

use ons_archive::compression::bits::BitWriter;
use ons_archive::{
    ArchiveBuilder, ArchiveChain, ArchiveConfig, ArchiveError, ArchiveKind, ArchiveKinds,
    CompressionType, KeyTable,
};
use pretty_assertions::assert_eq;
use std::path::Path;
use tempfile::TempDir;

fn write_archive(dir: &Path, name: &str, kind: ArchiveKind, files: &[(&str, &str)]) {
    let mut builder = ArchiveBuilder::new(kind);
    for (file_name, data) in files {
        builder.add_file(*file_name, data.as_bytes());
    }
    builder.write_to(dir.join(name)).expect("write archive");
}

fn open(dir: &TempDir) -> ArchiveChain {
    ArchiveChain::open(ArchiveConfig::new(dir.path())).expect("open chain")
}

// --- Precedence and provenance ---

#[test]
fn test_nsa_primary_wins_over_extras() {
    let dir = TempDir::new().expect("temp dir");
    write_archive(dir.path(), "arc.nsa", ArchiveKind::Nsa, &[("a.txt", "primary")]);
    write_archive(
        dir.path(),
        "arc1.nsa",
        ArchiveKind::Nsa,
        &[("a.txt", "extra copy"), ("b.txt", "only in extra")],
    );

    let mut chain = open(&dir);
    assert_eq!(chain.archives().len(), 2);
    assert_eq!(chain.num_files(), 3);
    assert_eq!(chain.archive_name(), "nsa");

    let a = chain.get_file("a.txt").expect("a.txt");
    assert_eq!(a.data, b"primary");
    assert_eq!(a.location, Some(ArchiveKind::Nsa));
    assert_eq!(chain.file_length("a.txt"), 7);

    let b = chain.get_file("b.txt").expect("b.txt");
    assert_eq!(b.data, b"only in extra");
    assert_eq!(b.location, Some(ArchiveKind::Nsa));
}

#[test]
fn test_loose_files_shadow_archives() {
    let dir = TempDir::new().expect("temp dir");
    write_archive(dir.path(), "arc.nsa", ArchiveKind::Nsa, &[("a.txt", "archived")]);
    std::fs::write(dir.path().join("a.txt"), b"patched on disk").expect("write");
    std::fs::create_dir(dir.path().join("voice")).expect("mkdir");
    std::fs::write(dir.path().join("voice").join("v1.ogg"), b"OggS").expect("write");

    let mut chain = open(&dir);
    let a = chain.get_file("a.txt").expect("a.txt");
    assert_eq!(a.data, b"patched on disk");
    assert_eq!(a.location, None);
    assert_eq!(chain.file_length("a.txt"), 15);

    let voice = chain.get_file(b"voice\\v1.ogg").expect("voice");
    assert_eq!(voice.location, None);
}

#[test]
fn test_lengths_agree_with_reads_in_every_generation() {
    let dir = TempDir::new().expect("temp dir");
    write_archive(
        dir.path(),
        "00.ns2",
        ArchiveKind::Ns2,
        &[("first.txt", "one"), ("shared.txt", "from 00")],
    );
    write_archive(
        dir.path(),
        "01.ns2",
        ArchiveKind::Ns2,
        &[("second.txt", "two!"), ("shared.txt", "from 01, longer")],
    );

    let mut chain = open(&dir);
    for name in ["first.txt", "second.txt", "shared.txt"] {
        let file = chain.get_file(name).expect("present");
        assert_eq!(chain.file_length(name), file.data.len() as u64, "{name}");
        assert_eq!(file.location, Some(ArchiveKind::Ns2));
    }
    assert_eq!(chain.get_file("shared.txt").expect("shared").data, b"from 00");
}

#[test]
fn test_missing_asset_is_zero_and_none() {
    let dir = TempDir::new().expect("temp dir");
    write_archive(dir.path(), "arc.nsa", ArchiveKind::Nsa, &[("a.txt", "x")]);

    let mut chain = open(&dir);
    assert_eq!(chain.file_length("nowhere.txt"), 0);
    assert!(chain.get_file("nowhere.txt").is_none());
    // names are matched byte for byte
    assert!(chain.get_file("A.TXT").is_none());
}

// --- Generation selection ---

#[test]
fn test_ns2_excludes_nsa() {
    let dir = TempDir::new().expect("temp dir");
    write_archive(dir.path(), "00.ns2", ArchiveKind::Ns2, &[("new.txt", "ns2")]);
    write_archive(dir.path(), "arc.nsa", ArchiveKind::Nsa, &[("old.txt", "nsa")]);

    let mut chain = open(&dir);
    assert_eq!(chain.archives().len(), 1);
    assert_eq!(chain.num_files(), 1);
    assert!(chain.get_file("new.txt").is_some());
    assert!(chain.get_file("old.txt").is_none());
    assert_eq!(chain.file_length("old.txt"), 0);
}

#[test]
fn test_nsa_used_when_ns2_disabled() {
    let dir = TempDir::new().expect("temp dir");
    write_archive(dir.path(), "00.ns2", ArchiveKind::Ns2, &[("new.txt", "ns2")]);
    write_archive(dir.path(), "arc.nsa", ArchiveKind::Nsa, &[("old.txt", "nsa")]);

    let config = ArchiveConfig::new(dir.path()).with_kinds(ArchiveKinds {
        nsa: true,
        ns2: false,
    });
    let mut chain = ArchiveChain::open(config).expect("open");
    assert!(chain.get_file("old.txt").is_some());
    assert!(chain.get_file("new.txt").is_none());
}

#[test]
fn test_probing_stops_at_first_gap() {
    let dir = TempDir::new().expect("temp dir");
    for (name, entry) in [("00.ns2", "a"), ("01.ns2", "b"), ("03.ns2", "d")] {
        write_archive(dir.path(), name, ArchiveKind::Ns2, &[(entry, "data")]);
    }

    let mut chain = open(&dir);
    assert_eq!(chain.archives().len(), 2);
    assert!(chain.get_file("b").is_some());
    assert!(chain.get_file("d").is_none());

    let dir = TempDir::new().expect("temp dir");
    for (name, entry) in [("arc.nsa", "a"), ("arc1.nsa", "b"), ("arc3.nsa", "d")] {
        write_archive(dir.path(), name, ArchiveKind::Nsa, &[(entry, "data")]);
    }
    assert_eq!(open(&dir).archives().len(), 2);
}

#[test]
fn test_extras_without_primary_are_not_probed() {
    let dir = TempDir::new().expect("temp dir");
    write_archive(dir.path(), "arc1.nsa", ArchiveKind::Nsa, &[("a.txt", "x")]);

    let result = ArchiveChain::open(ArchiveConfig::new(dir.path()));
    assert!(matches!(result, Err(ArchiveError::ArchiveNotFound(_))));
}

#[test]
fn test_sar_selects_single_archive_mode() {
    let dir = TempDir::new().expect("temp dir");
    write_archive(dir.path(), "arc.sar", ArchiveKind::Sar, &[("bg.bmp", "BMsar")]);
    write_archive(dir.path(), "arc.nsa", ArchiveKind::Nsa, &[("other.txt", "nsa")]);

    let mut chain = open(&dir);
    assert!(chain.is_single_archive());
    assert_eq!(chain.archive_name(), "sar");
    assert_eq!(chain.num_files(), 1);

    let bg = chain.get_file("bg.bmp").expect("bg.bmp");
    assert_eq!(bg.data, b"BMsar");
    assert_eq!(bg.location, Some(ArchiveKind::Sar));
    assert!(chain.get_file("other.txt").is_none());
}

#[test]
fn test_corrupt_archive_aborts_open() {
    let dir = TempDir::new().expect("temp dir");
    write_archive(dir.path(), "arc.nsa", ArchiveKind::Nsa, &[("a.txt", "ok")]);
    // count says 5 files, the directory ends after 2 bytes
    std::fs::write(dir.path().join("arc1.nsa"), [0, 5, 0, 0]).expect("write");

    let result = ArchiveChain::open(ArchiveConfig::new(dir.path()));
    match result {
        Err(ArchiveError::InvalidArchive { path, .. }) => {
            assert!(path.ends_with("arc1.nsa"));
        }
        other => panic!("expected InvalidArchive, got {other:?}"),
    }
}

// --- Archive options ---

#[test]
fn test_key_table_archives() {
    let dir = TempDir::new().expect("temp dir");
    let key_bytes: Vec<u8> = (0u8..=255).map(|b| b.rotate_left(3) ^ 0xA5).collect();
    let key = KeyTable::from_bytes(&key_bytes).expect("key");

    let mut builder = ArchiveBuilder::new(ArchiveKind::Nsa)
        .with_key_table(&key)
        .expect("permutation");
    builder.add_file("script.txt", b"*start".to_vec());
    builder.write_to(dir.path().join("arc.___")).expect("write");

    let config = ArchiveConfig::new(dir.path()).with_key_table(key);
    let mut chain = ArchiveChain::open(config).expect("open");
    assert_eq!(chain.get_file("script.txt").expect("script").data, b"*start");

    // without the key the keyed extension is never probed
    let result = ArchiveChain::open(ArchiveConfig::new(dir.path()));
    assert!(matches!(result, Err(ArchiveError::ArchiveNotFound(_))));
}

#[test]
fn test_header_offset_is_applied_to_every_archive() {
    let dir = TempDir::new().expect("temp dir");
    for (name, content) in [("arc.nsa", &b"first"[..]), ("arc1.nsa", &b"second"[..])] {
        let mut builder = ArchiveBuilder::new(ArchiveKind::Nsa).with_header_offset(32);
        builder.add_file(format!("{name}.txt"), content.to_vec());
        builder.write_to(dir.path().join(name)).expect("write");
    }

    let config = ArchiveConfig::new(dir.path()).with_nsa_offset(32);
    let mut chain = ArchiveChain::open(config).expect("open");
    assert_eq!(chain.get_file("arc1.nsa.txt").expect("second").data, b"second");
}

// --- Compressed entries ---

#[test]
fn test_nbz_entry_length_and_content() {
    let dir = TempDir::new().expect("temp dir");
    let image = vec![0x42u8; 5000];
    let mut builder = ArchiveBuilder::new(ArchiveKind::Nsa);
    builder.add_nbz("cg\\ev01.bmp", &image).expect("nbz");
    builder.write_to(dir.path().join("arc.nsa")).expect("write");

    let mut chain = open(&dir);
    assert_eq!(chain.archives()[0].entries()[0].original_length, 0);
    assert_eq!(chain.file_length(b"cg\\ev01.bmp"), 5000);
    assert_eq!(chain.archives()[0].entries()[0].original_length, 5000);
    assert_eq!(chain.get_file(b"cg\\ev01.bmp").expect("cg").data, image);
}

#[test]
fn test_registered_extension_is_decoded() {
    let dir = TempDir::new().expect("temp dir");
    let data = b"jpeg bytes ".repeat(40);
    let payload = ons_archive::compression::nbz::encode(&data).expect("encode");
    let mut builder = ArchiveBuilder::new(ArchiveKind::Sar);
    builder.add_raw("bg1.jpg", CompressionType::None, payload.len() as u32, payload.clone());
    builder.write_to(dir.path().join("arc.sar")).expect("write");

    let mut chain = open(&dir);
    // unregistered: stored bytes as-is
    assert_eq!(chain.get_file("bg1.jpg").expect("raw").data, payload);

    let config = ArchiveConfig::new(dir.path()).with_compression_type("jpg", CompressionType::Nbz);
    let mut chain = ArchiveChain::open(config).expect("open");
    assert_eq!(chain.file_length("bg1.jpg"), data.len() as u64);
    assert_eq!(chain.get_file("bg1.jpg").expect("decoded").data, data);
}

#[test]
fn test_register_compression_type_after_open() {
    let dir = TempDir::new().expect("temp dir");
    let data = vec![1u8; 64];
    let payload = ons_archive::compression::nbz::encode(&data).expect("encode");
    let mut builder = ArchiveBuilder::new(ArchiveKind::Nsa);
    builder.add_raw("a.dat", CompressionType::None, 0, payload);
    builder.write_to(dir.path().join("arc.nsa")).expect("write");

    let mut chain = open(&dir);
    assert_eq!(chain.file_length("a.dat"), 0);
    chain.register_compression_type("dat", CompressionType::Nbz);
    assert_eq!(chain.file_length("a.dat"), 64);
}

#[test]
fn test_registration_after_open_replaces_stored_length() {
    let dir = TempDir::new().expect("temp dir");
    let data = vec![1u8; 64];
    let payload = ons_archive::compression::nbz::encode(&data).expect("encode");
    let mut builder = ArchiveBuilder::new(ArchiveKind::Nsa);
    builder.add_file("a.dat", payload.clone());
    builder.write_to(dir.path().join("arc.nsa")).expect("write");

    let mut chain = open(&dir);
    assert_eq!(chain.file_length("a.dat"), payload.len() as u64);

    chain.register_compression_type("dat", CompressionType::Nbz);
    assert_eq!(chain.file_length("a.dat"), 64);
    let file = chain.get_file("a.dat").expect("decoded");
    assert_eq!(file.data.len() as u64, chain.file_length("a.dat"));
    assert_eq!(file.data, data);
}

#[test]
fn test_lzss_entry() {
    let dir = TempDir::new().expect("temp dir");
    let mut bits = BitWriter::new();
    for &byte in b"ab" {
        bits.write(1, 1).write(u32::from(byte), 8);
    }
    bits.write(0, 1).write(239, 8).write(2, 4);

    let mut builder = ArchiveBuilder::new(ArchiveKind::Nsa);
    builder.add_raw("text.dat", CompressionType::Lzss, 6, bits.finish());
    builder.write_to(dir.path().join("arc.nsa")).expect("write");

    let mut chain = open(&dir);
    assert_eq!(chain.file_length("text.dat"), 6);
    assert_eq!(chain.get_file("text.dat").expect("lzss").data, b"ababab");
}

#[test]
fn test_spb_entry_length_from_dimensions() {
    let dir = TempDir::new().expect("temp dir");
    let mut bits = BitWriter::new();
    for value in [10u32, 20, 30] {
        bits.write(value, 8).write(0, 3);
    }
    let mut payload = Vec::new();
    payload.extend_from_slice(&2u16.to_be_bytes());
    payload.extend_from_slice(&2u16.to_be_bytes());
    payload.extend_from_slice(&bits.finish());

    let mut builder = ArchiveBuilder::new(ArchiveKind::Nsa);
    builder.add_raw("face.bmp", CompressionType::Spb, 0, payload);
    builder.write_to(dir.path().join("arc.nsa")).expect("write");

    let mut chain = open(&dir);
    // 2 pixels * 3 bytes padded to 8, two rows, 54-byte header
    assert_eq!(chain.file_length("face.bmp"), 70);
    let bmp = chain.get_file("face.bmp").expect("spb").data;
    assert_eq!(bmp.len(), 70);
    assert_eq!(&bmp[..2], b"BM");
    assert_eq!(&bmp[54..57], &[10, 20, 30]);
}
