//! The on-disk records file: a concatenation of delimited frames.

use std::fs::{self, OpenOptions};
use std::io::{self, Cursor};
use std::path::Path;

use super::frame::{read_delimited, FrameError};
use super::histogram::ParsingLogResult;

#[derive(Debug, Default)]
pub struct ParsedRecords {
    /// Well-formed frames, in file order.
    pub frames: Vec<Vec<u8>>,
    /// Byte length of the well-formed prefix.
    pub valid_len: u64,
    /// None when the file was absent or empty.
    pub result: Option<ParsingLogResult>,
}

/// Read every frame up to EOF or the first malformed one.
pub fn parse_records(path: &Path) -> ParsedRecords {
    let data = match fs::read(path) {
        Ok(d) => d,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return ParsedRecords::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), "read records file: {}", e);
            return ParsedRecords {
                result: Some(ParsingLogResult::IoException),
                ..ParsedRecords::default()
            };
        }
    };
    if data.is_empty() {
        return ParsedRecords::default();
    }

    let total = data.len() as u64;
    let mut cursor = Cursor::new(data);
    let mut parsed = ParsedRecords::default();
    loop {
        let start = cursor.position();
        match read_delimited(&mut cursor) {
            Ok(Some(frame)) => {
                parsed.frames.push(frame);
                parsed.valid_len = cursor.position();
            }
            Ok(None) => {
                parsed.result = Some(ParsingLogResult::Success);
                break;
            }
            Err(FrameError::Parse(reason)) => {
                tracing::warn!(
                    path = %path.display(),
                    offset = start,
                    discarded = total - start,
                    "malformed record: {}",
                    reason
                );
                parsed.result = Some(ParsingLogResult::MalformedRecord);
                break;
            }
            Err(FrameError::Io(e)) => {
                tracing::warn!(path = %path.display(), "read record: {}", e);
                parsed.result = Some(ParsingLogResult::IoException);
                break;
            }
        }
    }
    parsed
}

/// Cut the file back to its well-formed prefix.
pub fn truncate_records(path: &Path, valid_len: u64) -> io::Result<()> {
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_len(valid_len)?;
    file.sync_all()
}

/// Delete the records file. When it cannot be deleted it is emptied in place,
/// so a later startup does not load frames that were already handed out.
pub fn clear_records(path: &Path) -> io::Result<()> {
    clear_records_with(path, |p| fs::remove_file(p))
}

fn clear_records_with(path: &Path, remove: impl FnOnce(&Path) -> io::Result<()>) -> io::Result<()> {
    match remove(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            tracing::warn!(path = %path.display(), "delete records file: {}; truncating", e);
            truncate_records(path, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::frame::encode_delimited;

    #[test]
    fn absent_and_empty_files_have_no_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records");
        let parsed = parse_records(&path);
        assert!(parsed.frames.is_empty());
        assert_eq!(parsed.result, None);

        fs::write(&path, b"").unwrap();
        assert_eq!(parse_records(&path).result, None);
    }

    #[test]
    fn well_formed_file_parses_fully() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records");
        let mut data = encode_delimited(b"one");
        data.extend(encode_delimited(b"two"));
        fs::write(&path, &data).unwrap();

        let parsed = parse_records(&path);
        assert_eq!(parsed.frames, vec![b"one".to_vec(), b"two".to_vec()]);
        assert_eq!(parsed.valid_len, data.len() as u64);
        assert_eq!(parsed.result, Some(ParsingLogResult::Success));
    }

    #[test]
    fn truncated_tail_keeps_leading_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records");
        let mut data = encode_delimited(b"one");
        let good = data.len() as u64;
        data.extend_from_slice(&[0x0a, b'x', b'y']);
        fs::write(&path, &data).unwrap();

        let parsed = parse_records(&path);
        assert_eq!(parsed.frames, vec![b"one".to_vec()]);
        assert_eq!(parsed.valid_len, good);
        assert_eq!(parsed.result, Some(ParsingLogResult::MalformedRecord));

        truncate_records(&path, parsed.valid_len).unwrap();
        assert_eq!(fs::read(&path).unwrap(), encode_delimited(b"one"));
    }

    #[test]
    fn clear_falls_back_to_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records");
        fs::write(&path, encode_delimited(b"drained")).unwrap();

        clear_records_with(&path, |_| Err(io::ErrorKind::PermissionDenied.into())).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
        assert!(parse_records(&path).frames.is_empty());

        clear_records(&path).unwrap();
        assert!(!path.exists());
        clear_records(&path).unwrap();
    }

    #[test]
    fn clear_reports_error_when_truncation_fails_too() {
        let dir = tempfile::tempdir().unwrap();
        assert!(clear_records(dir.path()).is_err());
    }

    #[test]
    fn unreadable_path_is_io_exception() {
        let dir = tempfile::tempdir().unwrap();
        let parsed = parse_records(dir.path());
        assert_eq!(parsed.result, Some(ParsingLogResult::IoException));
        assert!(parsed.frames.is_empty());
    }
}
