//! # Metadata Module
//!
//! Extracts the EXIF fields that identify a single exposure.
//!
//! ## Extracted Fields
//! - Capture date/time (DateTimeOriginal)
//! - Sub-second part of the capture time (SubSecTimeOriginal)
//! - Camera model
//! - Camera body serial number
//!
//! Together these survive renames, re-encoding of sidecar data and most
//! copy tools, which makes them usable as a fingerprint for stills.

use crate::error::FingerprintError;
use chrono::{Local, NaiveDateTime, TimeZone};
use exif::{In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::SystemTime;

/// EXIF date format: "YYYY:MM:DD HH:MM:SS"
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Identifying capture metadata of a still image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureMetadata {
    /// Original capture date/time as recorded by the camera (no time zone)
    pub date_taken: Option<NaiveDateTime>,
    /// Fractional seconds of the capture time, as written by the camera
    pub subsec: Option<String>,
    /// Camera model (e.g., "Canon EOS R6")
    pub camera_model: Option<String>,
    /// Camera body serial number
    pub serial_number: Option<String>,
}

impl CaptureMetadata {
    /// Check if any identifying field was extracted
    pub fn has_data(&self) -> bool {
        self.date_taken.is_some()
            || self.subsec.is_some()
            || self.camera_model.is_some()
            || self.serial_number.is_some()
    }

    /// A stable identifier built from all fields, `-` standing in for a missing one
    ///
    /// Returns `None` when nothing was extracted, so files without EXIF never
    /// share an identifier.
    pub fn identifier(&self) -> Option<String> {
        if !self.has_data() {
            return None;
        }

        let date = self
            .date_taken
            .map(|d| d.format(EXIF_DATE_FORMAT).to_string());

        Some(format!(
            "{}-{} | {} | {}",
            date.as_deref().unwrap_or("-"),
            self.subsec.as_deref().unwrap_or("-"),
            self.camera_model.as_deref().unwrap_or("-"),
            self.serial_number.as_deref().unwrap_or("-"),
        ))
    }

    /// Capture time as an absolute instant
    ///
    /// Cameras record wall-clock time, so it is interpreted in the local time
    /// zone, the same frame file modification times are shown in.
    pub fn capture_time(&self) -> Option<SystemTime> {
        let naive = self.date_taken?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(SystemTime::from)
    }
}

/// Extract capture metadata from an image file
pub fn extract_metadata(path: &Path) -> Result<CaptureMetadata, FingerprintError> {
    let file = File::open(path).map_err(|e| FingerprintError::io(path, e))?;

    let mut bufreader = BufReader::new(&file);
    let exif_reader = Reader::new()
        .read_from_container(&mut bufreader)
        .map_err(|e| match e {
            exif::Error::Io(source) => FingerprintError::io(path, source),
            other => FingerprintError::Exif {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        })?;

    let mut metadata = CaptureMetadata::default();

    if let Some(field) = exif_reader.get_field(Tag::DateTimeOriginal, In::PRIMARY) {
        metadata.date_taken = get_string_value(&field.value)
            .and_then(|s| NaiveDateTime::parse_from_str(&s, EXIF_DATE_FORMAT).ok());
    }

    if let Some(field) = exif_reader.get_field(Tag::SubSecTimeOriginal, In::PRIMARY) {
        metadata.subsec = get_string_value(&field.value);
    }

    if let Some(field) = exif_reader.get_field(Tag::Model, In::PRIMARY) {
        metadata.camera_model = get_string_value(&field.value);
    }

    if let Some(field) = exif_reader.get_field(Tag::BodySerialNumber, In::PRIMARY) {
        metadata.serial_number = get_string_value(&field.value);
    }

    Ok(metadata)
}

/// Helper to extract string from EXIF ASCII value
fn get_string_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        if let Some(bytes) = vec.first() {
            if let Ok(s) = std::str::from_utf8(bytes) {
                let trimmed = s.trim_end_matches('\0').trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}
