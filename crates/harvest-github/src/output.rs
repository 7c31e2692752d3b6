//! Persisted record files with atomic tmp→rename

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::fetcher::Fetched;

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write `data` to `path`: JSON Lines for collections, one bare object otherwise.
///
/// Content goes to `{path}.tmp` first and is renamed into place, so `path`
/// is either absent or complete.
pub fn write_records(path: &Path, data: &Fetched) -> io::Result<()> {
    let tmp = tmp_path(path);
    let result = write_to(&tmp, data).and_then(|()| fs::rename(&tmp, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_to(path: &Path, data: &Fetched) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    match data {
        Fetched::Single(record) => serde_json::to_writer(&mut out, record)?,
        Fetched::Many(records) => {
            for record in records {
                serde_json::to_writer(&mut out, record)?;
                out.write_all(b"\n")?;
            }
        }
    }
    out.into_inner().map_err(io::IntoInnerError::into_error)?.sync_all()
}

/// Remove leftover `.tmp` files from an interrupted write.
///
/// Missing directory is not an error.
pub fn cleanup_tmp_files(dir: &Path) -> io::Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    let mut removed = 0;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "tmp") {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}
