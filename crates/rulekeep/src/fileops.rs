use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::process::Command;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info};

use crate::error::FileOpsError;
use crate::rule::ArchiveFormat;

/// I/O capability consumed by the action pipeline. Every method either
/// fully succeeds or reports a typed failure; nothing is left ambiguous.
pub trait FileOps: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn file_size(&self, path: &Path) -> Option<u64>;
    fn ensure_dir(&self, path: &Path) -> Result<(), FileOpsError>;
    fn move_file(&self, from: &Path, to: &Path) -> Result<(), FileOpsError>;
    fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FileOpsError>;
    fn trash(&self, path: &Path) -> Result<(), FileOpsError>;
    fn delete_permanently(&self, path: &Path) -> Result<(), FileOpsError>;
    fn archive(&self, src: &Path, dest: &Path, format: ArchiveFormat)
        -> Result<(), FileOpsError>;
    fn unarchive(&self, src: &Path, dest_dir: &Path) -> Result<(), FileOpsError>;
    fn notify(&self, message: &str) -> Result<(), FileOpsError>;
    fn open(&self, path: &Path, app: Option<&str>) -> Result<(), FileOpsError>;
    fn reveal(&self, path: &Path) -> Result<(), FileOpsError>;
    /// OCR capability. The filesystem backend has none; hosts that do wrap
    /// this trait and override.
    fn make_searchable(&self, path: &Path) -> Result<(), FileOpsError>;
}

/// Local-filesystem implementation.
pub struct FsFileOps;

impl FileOps for FsFileOps {
    fn exists(&self, path: &Path) -> bool {
        // symlink_metadata so broken symlinks still count as occupied.
        std::fs::symlink_metadata(path).is_ok()
    }

    fn file_size(&self, path: &Path) -> Option<u64> {
        std::fs::metadata(path).ok().map(|m| m.len())
    }

    fn ensure_dir(&self, path: &Path) -> Result<(), FileOpsError> {
        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|e| FileOpsError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Uses `rename` first (fast, atomic on the same filesystem), falling
    /// back to copy + delete for cross-device moves.
    fn move_file(&self, from: &Path, to: &Path) -> Result<(), FileOpsError> {
        if std::fs::rename(from, to).is_ok() {
            return Ok(());
        }

        std::fs::copy(from, to).map_err(|e| FileOpsError::MoveFile {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: e,
        })?;
        std::fs::remove_file(from).map_err(|e| FileOpsError::MoveFile {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FileOpsError> {
        std::fs::copy(from, to)
            .map(|_| ())
            .map_err(|e| FileOpsError::CopyFile {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                source: e,
            })
    }

    fn trash(&self, path: &Path) -> Result<(), FileOpsError> {
        trash::delete(path).map_err(|e| FileOpsError::Trash {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn delete_permanently(&self, path: &Path) -> Result<(), FileOpsError> {
        let result = if path.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        };
        result.map_err(|e| FileOpsError::Delete {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn archive(
        &self,
        src: &Path,
        dest: &Path,
        format: ArchiveFormat,
    ) -> Result<(), FileOpsError> {
        let err = |e: String| FileOpsError::Archive {
            path: src.to_path_buf(),
            message: e,
        };

        let entry_name = src
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| err("source has no file name".to_string()))?;

        debug!("Archiving {} to {} ({:?})", src.display(), dest.display(), format);

        match format {
            ArchiveFormat::Zip => {
                let out = File::create(dest).map_err(|e| err(e.to_string()))?;
                let mut writer = zip::ZipWriter::new(BufWriter::new(out));
                let options = zip::write::SimpleFileOptions::default();
                writer
                    .start_file(entry_name, options)
                    .map_err(|e| err(e.to_string()))?;
                let mut input = File::open(src).map_err(|e| err(e.to_string()))?;
                std::io::copy(&mut input, &mut writer).map_err(|e| err(e.to_string()))?;
                writer.finish().map_err(|e| err(e.to_string()))?;
            }
            ArchiveFormat::Tar => {
                let out = File::create(dest).map_err(|e| err(e.to_string()))?;
                let mut builder = tar::Builder::new(BufWriter::new(out));
                builder
                    .append_path_with_name(src, entry_name)
                    .map_err(|e| err(e.to_string()))?;
                builder.finish().map_err(|e| err(e.to_string()))?;
            }
            ArchiveFormat::TarGz => {
                let out = File::create(dest).map_err(|e| err(e.to_string()))?;
                let encoder = GzEncoder::new(BufWriter::new(out), Compression::default());
                let mut builder = tar::Builder::new(encoder);
                builder
                    .append_path_with_name(src, entry_name)
                    .map_err(|e| err(e.to_string()))?;
                builder
                    .into_inner()
                    .and_then(|enc| enc.finish())
                    .map_err(|e| err(e.to_string()))?;
            }
        }

        Ok(())
    }

    fn unarchive(&self, src: &Path, dest_dir: &Path) -> Result<(), FileOpsError> {
        let err = |e: String| FileOpsError::Unarchive {
            path: src.to_path_buf(),
            message: e,
        };

        self.ensure_dir(dest_dir)?;

        let name = src.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let lowered = name.to_lowercase();

        if lowered.ends_with(".zip") {
            let file = File::open(src).map_err(|e| err(e.to_string()))?;
            let mut archive =
                zip::ZipArchive::new(BufReader::new(file)).map_err(|e| err(e.to_string()))?;
            archive.extract(dest_dir).map_err(|e| err(e.to_string()))?;
        } else if lowered.ends_with(".tar.gz") || lowered.ends_with(".tgz") {
            let file = File::open(src).map_err(|e| err(e.to_string()))?;
            let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
            archive.unpack(dest_dir).map_err(|e| err(e.to_string()))?;
        } else if lowered.ends_with(".tar") {
            let file = File::open(src).map_err(|e| err(e.to_string()))?;
            let mut archive = tar::Archive::new(BufReader::new(file));
            archive.unpack(dest_dir).map_err(|e| err(e.to_string()))?;
        } else {
            return Err(err(format!("unrecognized archive format: '{}'", name)));
        }

        Ok(())
    }

    fn notify(&self, message: &str) -> Result<(), FileOpsError> {
        // The host application routes notifications to its own UI; the
        // filesystem backend just logs.
        info!("Notification: {}", message);
        Ok(())
    }

    fn open(&self, path: &Path, app: Option<&str>) -> Result<(), FileOpsError> {
        let mut command = opener_command(path, app);
        command
            .spawn()
            .map(|_| ())
            .map_err(|e| FileOpsError::Launch {
                target: path.display().to_string(),
                source: e,
            })
    }

    fn reveal(&self, path: &Path) -> Result<(), FileOpsError> {
        let parent = path.parent().unwrap_or(path);
        self.open(parent, None)
    }

    fn make_searchable(&self, _path: &Path) -> Result<(), FileOpsError> {
        Err(FileOpsError::Unsupported {
            operation: "makePdfSearchable".to_string(),
        })
    }
}

#[cfg(target_os = "macos")]
fn opener_command(path: &Path, app: Option<&str>) -> Command {
    let mut command = Command::new("open");
    if let Some(app) = app {
        command.arg("-a").arg(app);
    }
    command.arg(path);
    command
}

#[cfg(not(target_os = "macos"))]
fn opener_command(path: &Path, app: Option<&str>) -> Command {
    match app {
        Some(app) => {
            let mut command = Command::new(app);
            command.arg(path);
            command
        }
        None => {
            let mut command = Command::new("xdg-open");
            command.arg(path);
            command
        }
    }
}
