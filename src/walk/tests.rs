//! Tests for the archive walker.

use crate::header::{EntryType, Header, HEADER_SIZE};

use super::*;

/// Helper to create a tar archive using the tar crate.
fn build_tar<F>(f: F) -> Vec<u8>
where
    F: FnOnce(&mut tar::Builder<&mut Vec<u8>>),
{
    let mut data = Vec::new();
    {
        let mut builder = tar::Builder::new(&mut data);
        f(&mut builder);
        builder.finish().unwrap();
    }
    data
}

/// Helper to append a file to a tar builder.
fn append_file(builder: &mut tar::Builder<&mut Vec<u8>>, path: &str, content: &[u8]) {
    let mut header = tar::Header::new_ustar();
    header.set_mode(0o644);
    header.set_size(content.len() as u64);
    header.set_entry_type(tar::EntryType::Regular);
    builder.append_data(&mut header, path, content).unwrap();
}

/// Rewrite a block's checksum field so it validates again after patching.
fn fix_checksum(block: &mut [u8]) {
    let sum = Header::from_bytes(block).unwrap().compute_checksum();
    block[148..156].copy_from_slice(format!("{sum:06o}\0 ").as_bytes());
}

fn collect_triples(buf: &[u8]) -> Vec<(String, EntryType, u64)> {
    let mut walker = ArchiveWalker::with_defaults(buf);
    let mut triples = Vec::new();
    while let Some((entry, _payload)) = walker.next_entry().unwrap() {
        triples.push((entry.name.clone(), entry.entry_type, entry.size));
        walker.record_accepted();
    }
    triples
}

#[test]
fn test_single_file() {
    let data = build_tar(|b| append_file(b, "hello.txt", b"hi"));
    let mut walker = ArchiveWalker::with_defaults(&data);

    let (entry, payload) = walker.next_entry().unwrap().expect("should have entry");
    assert_eq!(entry.name, "hello.txt");
    assert_eq!(entry.entry_type, EntryType::Regular);
    assert_eq!(entry.size, 2);
    assert_eq!(payload, b"hi");
    walker.record_accepted();

    assert!(walker.next_entry().unwrap().is_none());
}

#[test]
fn test_symlink_entry() {
    let data = build_tar(|b| {
        let mut header = tar::Header::new_ustar();
        header.set_mode(0o777);
        header.set_size(0);
        header.set_entry_type(tar::EntryType::Symlink);
        b.append_link(&mut header, "link", "target.txt").unwrap();
        append_file(b, "real.txt", b"x");
    });

    let mut walker = ArchiveWalker::with_defaults(&data);
    let (entry, payload) = walker.next_entry().unwrap().expect("should have entry");
    assert_eq!(entry.entry_type, EntryType::Symlink);
    assert_eq!(entry.name, "link");
    assert_eq!(entry.link_target, "target.txt");
    assert!(payload.is_empty());
}

#[test]
fn test_empty_archive_rejected() {
    // A builder with no entries still writes the end-of-archive zero blocks.
    let data = build_tar(|_| {});
    let mut walker = ArchiveWalker::with_defaults(&data);
    assert!(matches!(walker.next_entry(), Err(WalkError::Empty)));
}

#[test]
fn test_lone_zero_block_rejected() {
    let data = [0u8; HEADER_SIZE];
    let mut walker = ArchiveWalker::with_defaults(&data);
    assert!(matches!(walker.next_entry(), Err(WalkError::Empty)));
}

#[test]
fn test_unaccepted_entries_still_reject_archive() {
    // One zero-length file: yielded by the walker, but the driver never
    // records it as accepted, so the archive ends empty.
    let data = build_tar(|b| append_file(b, "empty", b""));
    let mut walker = ArchiveWalker::with_defaults(&data);

    let (entry, payload) = walker.next_entry().unwrap().expect("should have entry");
    assert_eq!(entry.size, 0);
    assert!(payload.is_empty());

    assert!(matches!(walker.next_entry(), Err(WalkError::Empty)));
}

#[test]
fn test_short_input_is_truncated() {
    let data = [0u8; 100];
    let mut walker = ArchiveWalker::with_defaults(&data);
    assert!(matches!(
        walker.next_entry(),
        Err(WalkError::TruncatedHeader {
            offset: 0,
            remaining: 100,
        })
    ));
}

#[test]
fn test_truncated_payload_names_entry() {
    let mut data = build_tar(|b| append_file(b, "hello.txt", b"hi"));
    // Cut into the payload: a full header remains but its 2 content bytes
    // do not fit.
    data.truncate(HEADER_SIZE + 1);

    let mut walker = ArchiveWalker::with_defaults(&data);
    match walker.next_entry() {
        Err(WalkError::TruncatedPayload { name, offset, size }) => {
            assert_eq!(name, "hello.txt");
            assert_eq!(offset, 0);
            assert_eq!(size, 2);
        }
        other => panic!("expected TruncatedPayload, got {other:?}"),
    }
}

#[test]
fn test_missing_terminator_is_truncated() {
    let mut data = build_tar(|b| append_file(b, "hello.txt", b"hi"));
    // Strip the two end-of-archive zero blocks.
    data.truncate(data.len() - 2 * HEADER_SIZE);

    let mut walker = ArchiveWalker::with_defaults(&data);
    let (entry, _) = walker.next_entry().unwrap().expect("should have entry");
    assert_eq!(entry.name, "hello.txt");
    walker.record_accepted();

    assert!(matches!(
        walker.next_entry(),
        Err(WalkError::TruncatedHeader { .. })
    ));
}

#[test]
fn test_padding_law() {
    for size in [0usize, 1, 511, 512, 513] {
        let content = vec![b'a'; size];
        let data = build_tar(|b| append_file(b, "f", &content));

        let mut walker = ArchiveWalker::with_defaults(&data);
        let (entry, payload) = walker.next_entry().unwrap().expect("should have entry");
        assert_eq!(payload.len(), size);

        let expected = 512 + 512 * entry.size.div_ceil(512);
        assert_eq!(
            walker.offset(),
            expected,
            "offset delta for size {size} should be {expected}"
        );
    }
}

#[test]
fn test_two_bad_blocks_recovered() {
    let mut data = vec![b'X'; 2 * HEADER_SIZE];
    data.extend_from_slice(&build_tar(|b| append_file(b, "hello.txt", b"hi")));

    let mut walker = ArchiveWalker::with_defaults(&data);
    let (entry, payload) = walker.next_entry().unwrap().expect("should have entry");
    assert_eq!(entry.name, "hello.txt");
    assert_eq!(payload, b"hi");
    walker.record_accepted();
    assert!(walker.next_entry().unwrap().is_none());
}

#[test]
fn test_three_bad_blocks_corrupt() {
    let mut data = vec![b'X'; 3 * HEADER_SIZE];
    data.extend_from_slice(&build_tar(|b| append_file(b, "hello.txt", b"hi")));

    let mut walker = ArchiveWalker::with_defaults(&data);
    assert!(matches!(
        walker.next_entry(),
        Err(WalkError::TooManyInvalidHeaders { count: 3, .. })
    ));
    // Fatal: the walker does not resume.
    assert!(walker.next_entry().unwrap().is_none());
}

#[test]
fn test_threshold_is_configurable() {
    let mut data = vec![b'X'; 2 * HEADER_SIZE];
    data.extend_from_slice(&build_tar(|b| append_file(b, "hello.txt", b"hi")));

    let policy = Policy {
        invalid_header_threshold: 2,
        ..Policy::default()
    };
    let mut walker = ArchiveWalker::new(&data, policy);
    assert!(matches!(
        walker.next_entry(),
        Err(WalkError::TooManyInvalidHeaders { count: 2, .. })
    ));
}

#[test]
fn test_valid_header_resets_recovery_counter() {
    // bad, good, bad, bad, good: four invalid blocks total, but never
    // three in a row.
    let good = build_tar(|b| append_file(b, "a.txt", b"1"));
    let good_len = good.len();
    let mut data = vec![b'X'; HEADER_SIZE];
    data.extend_from_slice(&good[..good_len - 2 * HEADER_SIZE]);
    data.extend_from_slice(&vec![b'X'; 2 * HEADER_SIZE]);
    data.extend_from_slice(&build_tar(|b| append_file(b, "b.txt", b"2")));

    let mut walker = ArchiveWalker::with_defaults(&data);
    let (first, _) = walker.next_entry().unwrap().expect("first entry");
    assert_eq!(first.name, "a.txt");
    walker.record_accepted();
    let (second, _) = walker.next_entry().unwrap().expect("second entry");
    assert_eq!(second.name, "b.txt");
    walker.record_accepted();
    assert!(walker.next_entry().unwrap().is_none());
}

#[test]
fn test_corrupted_checksum_counts_as_invalid() {
    let mut data = build_tar(|b| {
        append_file(b, "broken.txt", b"zap");
        append_file(b, "fine.txt", b"ok");
    });
    // Flip one name byte in the first header without fixing the checksum.
    data[0] ^= 0xff;

    let triples = collect_triples(&data);
    // The bad header is skipped one block at a time; its payload block
    // fails validation too, then the second entry scans clean.
    assert_eq!(triples.len(), 1);
    assert_eq!(triples[0].0, "fine.txt");
}

#[test]
fn test_garbage_size_field_counts_as_invalid() {
    let mut data = build_tar(|b| {
        append_file(b, "bad-size", b"");
        append_file(b, "fine.txt", b"ok");
    });
    // Magic and checksum stay valid, but the size field no longer decodes.
    data[124..136].copy_from_slice(b"zzzzzzzzzzz\0");
    fix_checksum(&mut data[..HEADER_SIZE]);

    let triples = collect_triples(&data);
    assert_eq!(triples.len(), 1);
    assert_eq!(triples[0].0, "fine.txt");
}

#[test]
fn test_pax_entries_skipped_with_correct_advance() {
    let data = build_tar(|b| {
        append_file(b, "PaxHeaders.0/hello.txt", &[b'p'; 30]);
        append_file(b, "hello.txt", b"hi");
    });

    let mut walker = ArchiveWalker::with_defaults(&data);
    let (entry, payload) = walker.next_entry().unwrap().expect("should have entry");
    assert_eq!(entry.name, "hello.txt");
    assert_eq!(payload, b"hi");
    // pax header + padded pax payload + real header + padded real payload
    assert_eq!(walker.offset(), 4 * HEADER_SIZE as u64);
    walker.record_accepted();
    assert!(walker.next_entry().unwrap().is_none());
}

#[test]
fn test_idempotent_decode() {
    let data = build_tar(|b| {
        append_file(b, "one.txt", b"1");
        let mut header = tar::Header::new_ustar();
        header.set_mode(0o755);
        header.set_size(0);
        header.set_entry_type(tar::EntryType::Directory);
        b.append_data(&mut header, "dir/", std::io::empty()).unwrap();
        append_file(b, "two.txt", &[b'2'; 700]);
    });

    let first = collect_triples(&data);
    let second = collect_triples(&data);
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert_eq!(first[1], ("dir/".to_owned(), EntryType::Directory, 0));
}
