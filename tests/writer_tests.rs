//! Tests for Writer
//!
//! These tests verify:
//! - Writes to arenas and files land where the cursor says
//! - Whole-source copies through the fast and chunked paths
//! - File sizing and removal

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use ypak::{ByteArena, Source, Writer, YpakError};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_file() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("output.bin");
    (temp_dir, path)
}

// =============================================================================
// Arena Target Tests
// =============================================================================

#[test]
fn test_buffer_grows_across_pages() {
    let page = ByteArena::granularity();
    let mut buffer = ByteArena::new();
    {
        let mut writer = Writer::from_buffer(&mut buffer);
        for i in 0..3 * page {
            writer.write(&[(i % 256) as u8]).unwrap();
        }
        assert_eq!(writer.size(), 3 * page as u64);
    }
    assert_eq!(buffer.size(), 3 * page);
    assert_eq!(buffer.capacity() % page, 0);
    assert_eq!(buffer[page + 1], ((page + 1) % 256) as u8);
}

#[test]
fn test_write_source_direct() {
    let mut buffer = ByteArena::new();
    let mut writer = Writer::from_buffer(&mut buffer);
    writer.write(b"<").unwrap();
    writer.write_source(&Source::from_static(b"payload")).unwrap();
    writer.write(b">").unwrap();
    drop(writer);
    assert_eq!(buffer.as_slice(), b"<payload>");
}

#[test]
fn test_reserve_keeps_size() {
    let mut buffer = ByteArena::new();
    let mut writer = Writer::from_buffer(&mut buffer);
    writer.reserve(10_000).unwrap();
    assert_eq!(writer.size(), 0);
    drop(writer);
    assert!(buffer.capacity() >= 10_000);
    assert!(buffer.is_empty());
}

// =============================================================================
// File Target Tests
// =============================================================================

#[test]
fn test_file_write_and_patch() {
    let (_temp, path) = setup_temp_file();
    let mut writer = Writer::create(&path).unwrap();
    writer.write(&[0u8; 4]).unwrap();
    writer.write(b"body").unwrap();
    writer.write_at(0, &8u32.to_le_bytes()).unwrap();
    assert_eq!(writer.offset(), 8);
    writer.sync().unwrap();
    drop(writer);

    let data = fs::read(&path).unwrap();
    assert_eq!(&data[..4], &8u32.to_le_bytes());
    assert_eq!(&data[4..], b"body");
}

#[test]
fn test_create_truncates() {
    let (_temp, path) = setup_temp_file();
    fs::write(&path, b"previous contents").unwrap();
    let mut writer = Writer::create(&path).unwrap();
    writer.write(b"new").unwrap();
    drop(writer);
    assert_eq!(fs::read(&path).unwrap(), b"new");
}

#[test]
fn test_file_resize() {
    let (_temp, path) = setup_temp_file();
    let mut writer = Writer::create(&path).unwrap();
    writer.resize(16).unwrap();
    assert_eq!(writer.size(), 16);
    assert!(writer.seek(16));
    writer.write(b"!").unwrap();
    drop(writer);

    let data = fs::read(&path).unwrap();
    assert_eq!(data.len(), 17);
    assert!(data[..16].iter().all(|&b| b == 0));
}

#[test]
fn test_file_write_at_past_end() {
    let (_temp, path) = setup_temp_file();
    let mut writer = Writer::create(&path).unwrap();
    assert!(matches!(
        writer.write_at(1, b"x"),
        Err(YpakError::InvalidOffset { offset: 1, size: 0 })
    ));
}

#[test]
fn test_create_in_missing_directory() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("missing").join("file.bin");
    assert!(matches!(Writer::create(&path), Err(YpakError::Io(_))));
}
