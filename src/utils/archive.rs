//! Tar archive creation and extraction, optionally gzip compressed

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, Builder};
use tracing::{debug, info};
use walkdir::WalkDir;

/// A tree (or single file) to store in an archive under `name`
#[derive(Debug, Clone)]
pub struct Member {
    pub source: PathBuf,
    /// Path inside the archive; empty puts directory contents at the root
    pub name: PathBuf,
}

impl Member {
    pub fn new(source: impl Into<PathBuf>, name: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
        }
    }
}

/// Create an archive at `dest` holding every member
pub fn create(dest: &Path, members: &[Member], compress: bool) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::archive(parent, e))?;
    }

    info!("Creating archive {:?}", dest);

    let file = File::create(dest).map_err(|e| Error::archive(dest, e))?;
    let writer = BufWriter::new(file);

    let result = if compress {
        let encoder = GzEncoder::new(writer, Compression::default());
        write_members(encoder, members).and_then(|encoder| encoder.finish()).and_then(finish_file)
    } else {
        write_members(writer, members).and_then(finish_file)
    };

    result.map_err(|e| Error::archive(dest, e))
}

fn finish_file(mut writer: BufWriter<File>) -> io::Result<()> {
    writer.flush()?;
    writer.get_ref().sync_all()
}

fn write_members<W: Write>(writer: W, members: &[Member]) -> io::Result<W> {
    let mut builder = Builder::new(writer);
    builder.follow_symlinks(false);

    for member in members {
        append_member(&mut builder, member)?;
    }

    builder.into_inner()
}

fn append_member<W: Write>(builder: &mut Builder<W>, member: &Member) -> io::Result<()> {
    let metadata = fs::symlink_metadata(&member.source)?;

    if !metadata.is_dir() {
        debug!("Adding {:?} as {:?}", member.source, member.name);
        return builder.append_path_with_name(&member.source, &member.name);
    }

    for entry in WalkDir::new(&member.source).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(&member.source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let name = member.name.join(relative);

        // The root of a member without a name has no entry of its own
        if name.as_os_str().is_empty() {
            continue;
        }

        if entry.file_type().is_dir() {
            builder.append_dir(&name, entry.path())?;
        } else {
            builder.append_path_with_name(entry.path(), &name)?;
        }
    }

    Ok(())
}

/// Open an archive for reading, gunzipping when `compressed`
pub fn open(path: &Path, compressed: bool) -> Result<Archive<Box<dyn Read>>> {
    let file = File::open(path).map_err(|e| Error::archive(path, e))?;
    let reader: Box<dyn Read> = if compressed {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(Archive::new(reader))
}

/// Extract the whole archive into `target`, creating it if needed
pub fn extract(path: &Path, target: &Path, compressed: bool) -> Result<()> {
    fs::create_dir_all(target).map_err(|e| Error::archive(target, e))?;

    info!("Extracting {:?} into {:?}", path, target);

    let mut archive = open(path, compressed)?;
    archive.set_preserve_permissions(true);
    archive.unpack(target).map_err(|e| Error::archive(path, e))
}

/// Reject entry paths that could escape the extraction root
pub fn ensure_relative(archive: &Path, entry: &Path) -> Result<()> {
    let safe = entry
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

    if safe {
        Ok(())
    } else {
        Err(Error::archive(
            archive,
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsafe entry path {:?}", entry),
            ),
        ))
    }
}
