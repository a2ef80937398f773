use std::convert::TryInto;
use std::io::Read;

use poolfs::{FileSystem, FsConfig, SNAPSHOT_MAGIC};

const BLOCK_SIZE: usize = 8;
const BLOCK_COUNT: usize = 6;

fn populated_fs() -> FileSystem {
    let mut fs = FileSystem::new(FsConfig {
        block_size: BLOCK_SIZE,
        pool_size: BLOCK_SIZE * BLOCK_COUNT,
    });
    fs.create_directory("docs").unwrap();
    fs.change_directory("docs").unwrap();
    fs.create_file("readme").unwrap();
    fs.write("readme", b"hello snapshot").unwrap();
    fs.change_directory("..").unwrap();
    fs
}

/// Cursor over the snapshot stream mirroring the fixed layout: magic,
/// length-prefixed tree text, file entries with raw blocks, length-prefixed
/// occupancy text.
struct Stream<'a> {
    bytes: &'a [u8],
    at: usize,
}

impl<'a> Stream<'a> {
    fn take(&mut self, n: usize) -> &'a [u8] {
        let slice = &self.bytes[self.at..self.at + n];
        self.at += n;
        slice
    }

    fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.take(8).try_into().unwrap())
    }
}

#[test]
fn snapshot_follows_the_fixed_byte_layout() {
    let fs = populated_fs();
    let file = tempfile::NamedTempFile::new().unwrap();
    fs.snapshot(file.path()).unwrap();

    let mut bytes = Vec::new();
    file.reopen().unwrap().read_to_end(&mut bytes).unwrap();
    let mut stream = Stream {
        bytes: &bytes,
        at: 0,
    };

    assert_eq!(stream.take(8), SNAPSHOT_MAGIC);

    let tree_len = stream.u64() as usize;
    let tree = std::str::from_utf8(stream.take(tree_len)).unwrap();
    let expected_tree = "FileSystemTree Structure:\n\
                         [D] root (ID: 1)\n  \
                         [D] docs (ID: 2)\n    \
                         [F] readme (ID: 3, fileSize: 14)\n";
    assert_eq!(tree, expected_tree);

    let entry_count = stream.u64();
    assert_eq!(entry_count, 1);

    assert_eq!(stream.u64(), 3); // identity
    assert_eq!(stream.u64(), 14); // byte length
    let block_count = stream.u64() as usize;
    assert_eq!(block_count, 2);
    // Whole blocks land in the stream, zero tail included.
    let blocks = stream.take(block_count * BLOCK_SIZE);
    assert_eq!(&blocks[..14], b"hello snapshot");
    assert_eq!(&blocks[14..], &[0, 0]);

    let bitmap_len = stream.u64() as usize;
    assert_eq!(bitmap_len, BLOCK_COUNT);
    let bitmap = std::str::from_utf8(stream.take(bitmap_len)).unwrap();
    assert_eq!(bitmap, "110000");

    assert_eq!(stream.at, bytes.len());
}

#[test]
fn snapshot_lists_file_entries_in_ascending_identity_order() {
    let mut fs = populated_fs();
    fs.create_file("zzz").unwrap();
    fs.create_file("aaa").unwrap();

    let file = tempfile::NamedTempFile::new().unwrap();
    fs.snapshot(file.path()).unwrap();

    let mut bytes = Vec::new();
    file.reopen().unwrap().read_to_end(&mut bytes).unwrap();
    let mut stream = Stream {
        bytes: &bytes,
        at: 0,
    };

    stream.take(8);
    let tree_len = stream.u64() as usize;
    stream.take(tree_len);

    let entry_count = stream.u64();
    assert_eq!(entry_count, 3);
    let mut ids = Vec::new();
    for _ in 0..entry_count {
        ids.push(stream.u64());
        let _len = stream.u64();
        let block_count = stream.u64() as usize;
        stream.take(block_count * BLOCK_SIZE);
    }
    // readme=3, zzz=4, aaa=5: numeric identity order, not name order.
    assert_eq!(ids, vec![3, 4, 5]);
}

#[test]
fn snapshot_into_an_unwritable_destination_reports_io_failure() {
    let fs = populated_fs();
    let dir = tempfile::tempdir().unwrap();

    let err = fs.snapshot(dir.path().join("missing/state.bin")).unwrap_err();
    match err {
        poolfs::FsError::Io(_) => (),
        other => panic!("unexpected error: {:?}", other),
    }
}
