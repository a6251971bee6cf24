//! Integration tests for the verification pipeline.
//!
//! These tests drive a full run through the public API:
//! - Newest-first matching and early exit
//! - Empty targets and empty cards
//! - Directory exclusion
//! - The capture-time cutoff
//! - Event reporting
//! - Hidden files on both sides
//! - EXIF matching of renamed stills

use chrono::{Local, TimeZone};
use exif::{Field, In, Tag, Value};
use filetime::{set_file_mtime, FileTime};
use sdcard_verify::core::fingerprint::{
    Fingerprint, FingerprintBackend, FingerprintKind, Fingerprinted, Fingerprinter,
};
use sdcard_verify::core::matcher::Termination;
use sdcard_verify::core::pipeline::Verifier;
use sdcard_verify::error::FingerprintError;
use sdcard_verify::events::{Event, EventChannel, MatchEvent, VerifyEvent};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Write `content` at `name` under `dir` with the given modification time
fn place(dir: &TempDir, name: &str, content: &str, mtime_secs: i64) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    set_file_mtime(&path, FileTime::from_unix_time(mtime_secs, 0)).unwrap();
    path
}

/// Write a JPEG with an APP1/EXIF segment holding the capture fields
fn write_exif_jpeg(path: &Path, taken: &str, model: &str, payload: &[u8]) {
    let fields = [
        Field {
            tag: Tag::Model,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![model.as_bytes().to_vec()]),
        },
        Field {
            tag: Tag::DateTimeOriginal,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![taken.as_bytes().to_vec()]),
        },
    ];
    let mut writer = exif::experimental::Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&((8 + tiff.len()) as u16).to_be_bytes());
    jpeg.extend_from_slice(b"Exif\0\0");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(payload);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);

    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, jpeg).unwrap();
}

/// Reads files of the form `id;captured=<unix secs>` and reports the capture time
struct DatedFingerprinter;

impl Fingerprinter for DatedFingerprinter {
    fn fingerprint(&self, path: &Path) -> Result<Fingerprinted, FingerprintError> {
        let text = std::fs::read_to_string(path).map_err(|source| FingerprintError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (id, captured) = text.split_once(";captured=").unwrap_or((text.as_str(), ""));
        Ok(Fingerprinted {
            fingerprint: Fingerprint::new(FingerprintKind::Metadata, id.as_bytes().to_vec()),
            captured_at: captured
                .parse::<u64>()
                .ok()
                .map(|secs| SystemTime::UNIX_EPOCH + Duration::from_secs(secs)),
        })
    }

    fn name(&self) -> &'static str {
        "dated"
    }
}

#[test]
fn every_card_file_found_ends_early() {
    let card = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    place(&card, "DCIM/100CANON/IMG_1.jpg", "first shot", 1_000);
    place(&card, "DCIM/100CANON/IMG_2.jpg", "second shot", 1_000);
    place(&target, "2024/06/IMG_1.jpg", "first shot", 3_000);
    place(&target, "2024/05/IMG_2.jpg", "second shot", 2_000);
    place(&target, "2019/old.jpg", "unrelated", 100);

    let report = Verifier::builder()
        .source(card.path())
        .target(target.path())
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(report.all_found());
    assert_eq!(report.found, 2);
    assert_eq!(report.termination, Some(Termination::AllMatched));
    assert_eq!(report.candidates_total, 3);
    assert_eq!(report.candidates_fingerprinted, 2);
}

#[test]
fn empty_target_reports_every_card_file() {
    let card = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let first = place(&card, "IMG_1.jpg", "one", 1_000);
    let second = place(&card, "IMG_2.mov", "two", 1_000);

    let report = Verifier::builder()
        .source(card.path())
        .target(target.path())
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.found, 0);
    assert_eq!(report.missing, vec![first, second]);
    assert_eq!(report.termination, Some(Termination::Exhausted));
}

#[test]
fn card_without_media_is_nothing_to_verify() {
    let card = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    place(&card, "notes.txt", "not media", 1_000);
    place(&target, "IMG_1.jpg", "one", 1_000);

    let report = Verifier::builder()
        .source(card.path())
        .target(target.path())
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(report.nothing_to_verify());
    assert_eq!(report.source_files_seen, 0);
    assert_eq!(report.termination, None);
    assert_eq!(report.candidates_total, 0);
}

#[test]
fn copy_inside_excluded_directory_does_not_count() {
    let card = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let shot = place(&card, "IMG_1.jpg", "only copy is in backup", 1_000);
    place(&target, "backup/IMG_1.jpg", "only copy is in backup", 2_000);
    place(&target, "backup/nested/IMG_1.jpg", "only copy is in backup", 2_000);

    let report = Verifier::builder()
        .source(card.path())
        .target(target.path())
        .exclude("^backup/")
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.missing, vec![shot]);
    assert_eq!(report.candidates_total, 0);
}

#[test]
fn extension_matching_ignores_case() {
    let card = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    place(&card, "DCIM/IMG_1.JPG", "upper", 1_000);
    place(&target, "import/img_1.jpg", "upper", 2_000);

    let report = Verifier::builder()
        .source(card.path())
        .target(target.path())
        .extensions(vec![".jpg".to_string()])
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.catalog_size, 1);
    assert!(report.all_found());
}

#[test]
fn search_stops_at_files_older_than_the_card() {
    let card = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let missing = place(&card, "IMG_1.jpg", "shot-1;captured=5000", 6_000);
    place(&card, "IMG_2.jpg", "shot-2;captured=5500", 6_000);
    place(&target, "new/IMG_2.jpg", "shot-2;captured=5500", 7_000);
    // Copy exists but was last modified before anything on the card was captured
    place(&target, "old/IMG_1.jpg", "shot-1;captured=5000", 4_000);

    let verifier = Verifier::builder()
        .source(card.path())
        .target(target.path())
        .fingerprinter(Arc::new(DatedFingerprinter))
        .build()
        .unwrap();
    let report = verifier.run().unwrap();

    assert_eq!(report.missing, vec![missing]);
    assert_eq!(report.termination, Some(Termination::CutoffReached));
    assert!(report.cutoff_applied);
    assert_eq!(
        report.cutoff,
        Some(SystemTime::UNIX_EPOCH + Duration::from_secs(5_000))
    );
    assert_eq!(report.candidates_fingerprinted, 1);
}

#[test]
fn disabling_the_cutoff_searches_everything() {
    let card = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    place(&card, "IMG_1.jpg", "shot-1;captured=5000", 6_000);
    place(&target, "old/IMG_1.jpg", "shot-1;captured=5000", 4_000);

    let report = Verifier::builder()
        .source(card.path())
        .target(target.path())
        .fingerprinter(Arc::new(DatedFingerprinter))
        .use_cutoff(false)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(report.all_found());
    assert!(!report.cutoff_applied);
    assert!(report.cutoff.is_some());
}

#[test]
fn card_collision_keeps_later_file() {
    let card = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let earlier = place(&card, "a/IMG_1.jpg", "same bytes", 1_000);
    let later = place(&card, "b/IMG_1.jpg", "same bytes", 1_000);

    let report = Verifier::builder()
        .source(card.path())
        .target(target.path())
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.source_files_seen, 2);
    assert_eq!(report.catalog_size, 1);
    assert_eq!(report.unverifiable(), 1);
    assert_eq!(report.collisions.len(), 1);
    assert_eq!(report.collisions[0].kept, later);
    assert_eq!(report.collisions[0].replaced, earlier);
    assert_eq!(report.missing, vec![later]);
}

#[test]
fn worker_pool_agrees_with_sequential_search() {
    let card = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    for i in 0..12 {
        place(&card, &format!("IMG_{:02}.jpg", i), &format!("shot {}", i), 1_000);
        if i % 3 != 0 {
            place(
                &target,
                &format!("dir{}/IMG_{:02}.jpg", i % 4, i),
                &format!("shot {}", i),
                2_000 + i as i64,
            );
        }
    }

    let run = |workers: usize| {
        Verifier::builder()
            .source(card.path())
            .target(target.path())
            .workers(workers)
            .build()
            .unwrap()
            .run()
            .unwrap()
    };
    let sequential = run(1);
    let pooled = run(4);

    assert_eq!(sequential.missing.len(), 4);
    assert_eq!(sequential.missing, pooled.missing);
    assert_eq!(sequential.found, pooled.found);
}

#[test]
fn metadata_backend_falls_back_to_content_for_videos() {
    let card = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    place(&card, "MVI_0001.MOV", "video frames", 1_000);
    place(&target, "clips/MVI_0001.MOV", "video frames", 2_000);

    let report = Verifier::builder()
        .source(card.path())
        .target(target.path())
        .backend(FingerprintBackend::Metadata)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.fingerprinter, "exif");
    assert!(report.all_found());
}

#[test]
fn events_describe_the_run() {
    let card = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    place(&card, "IMG_1.jpg", "one", 1_000);
    place(&target, "copy/IMG_1.jpg", "one", 2_000);

    let verifier = Verifier::builder()
        .source(card.path())
        .target(target.path())
        .build()
        .unwrap();

    let (sender, receiver) = EventChannel::new();
    verifier.run_with_events(&sender).unwrap();
    drop(sender);

    let events: Vec<Event> = receiver.iter().collect();
    assert!(matches!(events.first(), Some(Event::Verify(VerifyEvent::Started))));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::Match(MatchEvent::Matched { .. }))));
    assert!(matches!(
        events.last(),
        Some(Event::Verify(VerifyEvent::Completed { missing: 0, .. }))
    ));
}

#[test]
fn invalid_exclusion_pattern_fails_to_build() {
    let result = Verifier::builder()
        .source("/media/card")
        .target("/pictures")
        .exclude("backup/(")
        .build();
    assert!(result.is_err());
}

#[test]
fn hidden_card_file_is_verified() {
    let card = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    place(&card, "DCIM/IMG_1.jpg", "visible", 1_000);
    let hidden = place(&card, "DCIM/.IMG_2.jpg", "hidden", 1_000);
    place(&target, "2024/IMG_1.jpg", "visible", 2_000);

    let report = Verifier::builder()
        .source(card.path())
        .target(target.path())
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.source_files_seen, 2);
    assert_eq!(report.missing, vec![hidden]);
    assert!(!report.all_found());
}

#[test]
fn copy_under_hidden_target_directory_is_found() {
    let card = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    place(&card, "DCIM/IMG_1.jpg", "synced", 1_000);
    place(&target, ".sync/2024/IMG_1.jpg", "synced", 2_000);

    let report = Verifier::builder()
        .source(card.path())
        .target(target.path())
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(report.all_found());
    assert_eq!(report.candidates_total, 1);
}

#[test]
fn skipping_hidden_entries_is_opt_in() {
    let card = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let shot = place(&card, "DCIM/IMG_1.jpg", "synced", 1_000);
    place(&card, "DCIM/.IMG_2.jpg", "hidden", 1_000);
    place(&target, ".sync/IMG_1.jpg", "synced", 2_000);

    let report = Verifier::builder()
        .source(card.path())
        .target(target.path())
        .skip_hidden(true)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.source_files_seen, 1);
    assert_eq!(report.missing, vec![shot]);
}

#[test]
fn renamed_still_matches_by_exif() {
    let card = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let shot = card.path().join("DCIM/100CANON/IMG_0001.JPG");
    write_exif_jpeg(&shot, "2024:07:14 09:30:05", "Canon EOS R6", b"original pixels");
    write_exif_jpeg(
        &target.path().join("2024/07/beach.jpg"),
        "2024:07:14 09:30:05",
        "Canon EOS R6",
        b"edited and re-saved",
    );
    let unmatched = card.path().join("DCIM/100CANON/IMG_0002.JPG");
    write_exif_jpeg(&unmatched, "2024:07:14 09:31:00", "Canon EOS R6", b"second");

    let report = Verifier::builder()
        .source(card.path())
        .target(target.path())
        .backend(FingerprintBackend::Metadata)
        .build()
        .unwrap()
        .run()
        .unwrap();

    let earliest = Local
        .with_ymd_and_hms(2024, 7, 14, 9, 30, 5)
        .earliest()
        .map(SystemTime::from);
    assert_eq!(report.cutoff, earliest);
    assert!(report.cutoff_applied);
    assert_eq!(report.found, 1);
    assert_eq!(report.missing, vec![unmatched]);
}
