//! ZIP archive tools

use crate::file::{mime_from_name, Blob, InputFile};
use std::io::{Cursor, Read, Write};
use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const ZIP_MIME: &str = "application/zip";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("Failed to read archive: {0}")]
    Read(String),

    #[error("Failed to write archive: {0}")]
    Write(String),

    #[error("Archive contains no files")]
    Empty,
}

/// A file stored in an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// Bundle files into a deflated ZIP, one entry per file name.
///
/// A later file with the same name replaces the earlier one.
pub fn create_zip<'a, I>(entries: I) -> Result<Blob, ArchiveError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut unique: Vec<(&str, &[u8])> = Vec::new();
    for (name, data) in entries {
        match unique.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = data,
            None => unique.push((name, data)),
        }
    }

    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in unique {
        writer
            .start_file(name, options)
            .map_err(|e| ArchiveError::Write(e.to_string()))?;
        writer
            .write_all(data)
            .map_err(|e| ArchiveError::Write(e.to_string()))?;
    }
    let cursor = writer
        .finish()
        .map_err(|e| ArchiveError::Write(e.to_string()))?;

    Ok(Blob::new(cursor.into_inner(), ZIP_MIME))
}

/// Bundle input files under their own names
pub fn create_zip_from_files(files: &[InputFile]) -> Result<Blob, ArchiveError> {
    create_zip(files.iter().map(|f| (f.name.as_str(), f.data.as_slice())))
}

fn open(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>, ArchiveError> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| ArchiveError::Read(e.to_string()))
}

/// Every file entry in archive order; directories are skipped
pub fn read_entries(bytes: &[u8]) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let mut archive = open(bytes)?;
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| ArchiveError::Read(e.to_string()))?;
        if file.is_dir() {
            continue;
        }
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)
            .map_err(|e| ArchiveError::Read(format!("{}: {}", file.name(), e)))?;
        entries.push(ArchiveEntry {
            name: file.name().to_string(),
            data,
        });
    }
    Ok(entries)
}

/// Unpack an archive.
///
/// A single file comes back as itself, typed by its name; several files are
/// bundled into a fresh ZIP.
pub fn extract_zip(bytes: &[u8]) -> Result<Blob, ArchiveError> {
    let mut entries = read_entries(bytes)?;
    match entries.len() {
        0 => Err(ArchiveError::Empty),
        1 => {
            let entry = entries.remove(0);
            let mime = mime_from_name(&entry.name);
            Ok(Blob::new(entry.data, mime))
        }
        _ => create_zip(
            entries
                .iter()
                .map(|e| (e.name.as_str(), e.data.as_slice())),
        ),
    }
}

/// Names of the file entries, one per line
pub fn list_contents(bytes: &[u8]) -> Result<Blob, ArchiveError> {
    let mut archive = open(bytes)?;
    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive
            .by_index_raw(i)
            .map_err(|e| ArchiveError::Read(e.to_string()))?;
        if !file.is_dir() {
            names.push(file.name().to_string());
        }
    }
    Ok(Blob::text(names.join("\n"), "text/plain"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<u8> {
        let options = FileOptions::default();
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.add_directory("docs/", options).unwrap();
        writer.start_file("docs/readme.txt", options).unwrap();
        writer.write_all(b"hello").unwrap();
        writer.start_file("data.json", options).unwrap();
        writer.write_all(b"{}").unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_create_then_read_keeps_order() {
        let blob = create_zip([("b.txt", &b"bee"[..]), ("a.txt", &b"ay"[..])]).unwrap();
        assert_eq!(blob.mime, "application/zip");

        let entries = read_entries(&blob.data).unwrap();
        assert_eq!(
            entries,
            vec![
                ArchiveEntry { name: "b.txt".into(), data: b"bee".to_vec() },
                ArchiveEntry { name: "a.txt".into(), data: b"ay".to_vec() },
            ]
        );
    }

    #[test]
    fn test_duplicate_names_keep_last() {
        let blob = create_zip([("a.txt", &b"1"[..]), ("a.txt", &b"2"[..])]).unwrap();
        let entries = read_entries(&blob.data).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].data, b"2");
    }

    #[test]
    fn test_list_skips_directories() {
        let listing = list_contents(&sample()).unwrap();
        assert_eq!(listing.data, b"docs/readme.txt\ndata.json");
    }

    #[test]
    fn test_extract_single_entry_returns_the_file() {
        let zip = create_zip([("page.html", &b"<p>x</p>"[..])]).unwrap();
        let blob = extract_zip(&zip.data).unwrap();
        assert_eq!(blob, Blob::new(b"<p>x</p>".to_vec(), "text/html"));
    }

    #[test]
    fn test_extract_many_entries_rebundles() {
        let blob = extract_zip(&sample()).unwrap();
        assert_eq!(blob.mime, "application/zip");
        let names: Vec<String> = read_entries(&blob.data)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["docs/readme.txt", "data.json"]);
    }

    #[test]
    fn test_garbage_is_a_read_error() {
        assert!(matches!(list_contents(b"not a zip"), Err(ArchiveError::Read(_))));
        let empty = create_zip(std::iter::empty()).unwrap();
        assert_eq!(extract_zip(&empty.data), Err(ArchiveError::Empty));
    }
}
