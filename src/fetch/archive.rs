//! Archive format detection and extraction.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// How a downloaded file is unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveKind {
    /// `.zip`
    Zip,
    /// `.tgz`
    TarGz,
    /// Anything else; left on disk as downloaded.
    Opaque,
}

impl ArchiveKind {
    /// Pick the kind from a file name suffix. Matching is case-sensitive.
    pub fn from_file_name(name: &str) -> Self {
        if name.ends_with(".zip") {
            ArchiveKind::Zip
        } else if name.ends_with(".tgz") {
            ArchiveKind::TarGz
        } else {
            ArchiveKind::Opaque
        }
    }

    /// Whether the file is unpacked (and then deleted).
    pub fn is_archive(&self) -> bool {
        !matches!(self, ArchiveKind::Opaque)
    }
}

/// Extract `archive` into `dest_dir` according to `kind`.
///
/// Returns the number of entries written. Opaque files are not touched.
pub fn extract(kind: ArchiveKind, archive: &Path, dest_dir: &Path) -> Result<usize> {
    match kind {
        ArchiveKind::Zip => extract_zip(archive, dest_dir),
        ArchiveKind::TarGz => extract_tarball(archive, dest_dir),
        ArchiveKind::Opaque => Ok(0),
    }
}

fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<usize> {
    tracing::debug!(
        "Extracting zip {} into {}",
        archive_path.display(),
        dest_dir.display()
    );

    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open zip archive {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("Invalid zip archive {}", archive_path.display()))?;

    let mut written = 0;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read zip entry {}", i))?;

        // Entries with absolute paths or `..` would land outside dest_dir.
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!("Skipping unsafe zip entry '{}'", entry.name());
            continue;
        };
        let outpath = dest_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)
                .with_context(|| format!("Failed to create {}", outpath.display()))?;
        } else {
            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }

            let mut outfile = File::create(&outpath)
                .with_context(|| format!("Failed to create {}", outpath.display()))?;
            std::io::copy(&mut entry, &mut outfile)
                .with_context(|| format!("Failed to extract {}", outpath.display()))?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))
                    .with_context(|| format!("Failed to set mode of {}", outpath.display()))?;
            }
        }

        written += 1;
    }

    Ok(written)
}

fn extract_tarball(archive_path: &Path, dest_dir: &Path) -> Result<usize> {
    tracing::debug!(
        "Extracting tarball {} into {}",
        archive_path.display(),
        dest_dir.display()
    );

    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open tarball {}", archive_path.display()))?;
    let decoder = flate2::read::GzDecoder::new(BufReader::new(file));
    let mut archive = tar::Archive::new(decoder);

    let mut written = 0;
    let entries = archive
        .entries()
        .with_context(|| format!("Failed to read tarball {}", archive_path.display()))?;

    for entry in entries {
        let mut entry = entry
            .with_context(|| format!("Corrupt entry in {}", archive_path.display()))?;
        // unpack_in refuses paths that escape dest_dir and returns false.
        if entry
            .unpack_in(dest_dir)
            .with_context(|| format!("Failed to extract {}", archive_path.display()))?
        {
            written += 1;
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_zip(path: &Path, files: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn write_tgz(path: &Path, files: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn kind_from_file_name() {
        assert_eq!(ArchiveKind::from_file_name("glew.zip"), ArchiveKind::Zip);
        assert_eq!(ArchiveKind::from_file_name("boost.tgz"), ArchiveKind::TarGz);
        assert_eq!(
            ArchiveKind::from_file_name("installer.exe"),
            ArchiveKind::Opaque
        );
        assert_eq!(ArchiveKind::from_file_name("data.tar"), ArchiveKind::Opaque);
    }

    #[test]
    fn other_spellings_stay_opaque() {
        assert_eq!(
            ArchiveKind::from_file_name("boost-1.59.tar.gz"),
            ArchiveKind::Opaque
        );
        assert_eq!(ArchiveKind::from_file_name("GLEW.ZIP"), ArchiveKind::Opaque);
        assert_eq!(ArchiveKind::from_file_name("boost.TGZ"), ArchiveKind::Opaque);
    }

    #[test]
    fn only_zip_and_tgz_are_archives() {
        assert!(ArchiveKind::Zip.is_archive());
        assert!(ArchiveKind::TarGz.is_archive());
        assert!(!ArchiveKind::Opaque.is_archive());
    }

    #[test]
    fn extracts_zip_with_nested_paths() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("lib.zip");
        write_zip(
            &archive,
            &[("include/lib.h", "#pragma once\n"), ("README", "hi")],
        );
        let dest = temp.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();

        let count = extract(ArchiveKind::Zip, &archive, &dest).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            std::fs::read_to_string(dest.join("include/lib.h")).unwrap(),
            "#pragma once\n"
        );
        assert!(dest.join("README").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn zip_restores_executable_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("scripts.zip");
        {
            let mut zip = zip::ZipWriter::new(File::create(&archive).unwrap());
            let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
            zip.start_file("Scripts/update.sh", options).unwrap();
            zip.write_all(b"#!/bin/sh\n").unwrap();
            zip.finish().unwrap();
        }
        let dest = temp.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();

        extract(ArchiveKind::Zip, &archive, &dest).unwrap();

        let mode = std::fs::metadata(dest.join("Scripts/update.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn zip_skips_entries_escaping_destination() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.zip");
        write_zip(&archive, &[("../escaped.txt", "x"), ("ok.txt", "y")]);
        let dest = temp.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();

        let count = extract(ArchiveKind::Zip, &archive, &dest).unwrap();

        assert_eq!(count, 1);
        assert!(dest.join("ok.txt").exists());
        assert!(!temp.path().join("escaped.txt").exists());
    }

    #[test]
    fn extracts_tarball() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("lib.tgz");
        write_tgz(&archive, &[("lib/libfoo.a", "!<arch>\n"), ("VERSION", "1.0")]);
        let dest = temp.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();

        let count = extract(ArchiveKind::TarGz, &archive, &dest).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            std::fs::read_to_string(dest.join("VERSION")).unwrap(),
            "1.0"
        );
        assert!(dest.join("lib/libfoo.a").is_file());
    }

    #[test]
    fn corrupt_zip_is_an_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.zip");
        std::fs::write(&archive, "not a zip").unwrap();

        assert!(extract(ArchiveKind::Zip, &archive, temp.path()).is_err());
    }

    #[test]
    fn corrupt_tarball_is_an_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.tgz");
        std::fs::write(&archive, "not gzip data at all").unwrap();

        assert!(extract(ArchiveKind::TarGz, &archive, temp.path()).is_err());
    }

    #[test]
    fn missing_archive_is_an_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("absent.zip");

        assert!(extract(ArchiveKind::Zip, &archive, temp.path()).is_err());
    }

    #[test]
    fn opaque_is_left_alone() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("tool.exe");
        std::fs::write(&file, "MZ").unwrap();

        assert_eq!(extract(ArchiveKind::Opaque, &file, temp.path()).unwrap(), 0);
        assert!(file.exists());
    }
}
