//! Gzip compression of extract files
//!
//! Produces `<file>.gz` next to the source, which the loader reads back
//! transparently.

use crate::Result;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Highest gzip level; used by default
pub const DEFAULT_LEVEL: u32 = 9;

/// Compress `dir/name` to `dir/name.gz`
///
/// Returns the path of the compressed file.
pub fn compress_to_gz<P: AsRef<Path>>(
    dir: P,
    name: &str,
    remove_original: bool,
    level: u32,
) -> Result<PathBuf> {
    let source = dir.as_ref().join(name);
    let target = dir.as_ref().join(format!("{}.gz", name));

    let mut input = BufReader::new(File::open(&source)?);
    let mut encoder = GzEncoder::new(
        BufWriter::new(File::create(&target)?),
        Compression::new(level.min(9)),
    );
    io::copy(&mut input, &mut encoder)?;

    // The source may only go once the compressed bytes are on disk
    let file = encoder
        .finish()?
        .into_inner()
        .map_err(|e| e.into_error())?;
    file.sync_all()?;

    if remove_original {
        std::fs::remove_file(&source)?;
    }

    log::debug!("Compressed {} -> {}", source.display(), target.display());
    Ok(target)
}

/// Compress every regular file in `dir` that is not already gzipped
pub fn compress_all<P: AsRef<Path>>(dir: P, remove_original: bool) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !name.ends_with(".gz") {
            names.push(name);
        }
    }
    names.sort();

    names
        .iter()
        .map(|name| compress_to_gz(dir, name, remove_original, DEFAULT_LEVEL))
        .collect()
}
