use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use crate::error::LandcoverError;

/// Unpack a downloaded land cover package. Entries escaping `target_dir`
/// are rejected by the archive reader.
pub fn unpack_package(zip_path: &Path, target_dir: &Path) -> Result<(), LandcoverError> {
    let file = fs::File::open(zip_path).map_err(|err| {
        LandcoverError::Filesystem(format!("open zip {}: {err}", zip_path.display()))
    })?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| LandcoverError::Filesystem(err.to_string()))?;
    debug!(entries = archive.len(), target = %target_dir.display(), "unpacking package");
    archive.extract(target_dir).map_err(|err| {
        LandcoverError::Filesystem(format!("unpack {}: {err}", zip_path.display()))
    })
}

/// First GeoTIFF below `root`, visiting entries in name order with files
/// ahead of subdirectories.
pub fn find_raster(root: &Path) -> Option<PathBuf> {
    let mut entries = fs::read_dir(root)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .collect::<Vec<_>>();
    entries.sort();
    let (dirs, files): (Vec<_>, Vec<_>) = entries.into_iter().partition(|path| path.is_dir());
    files
        .into_iter()
        .find(|path| is_geotiff(path))
        .or_else(|| dirs.iter().find_map(|dir| find_raster(dir)))
}

/// GeoTIFFs directly inside `dir`, sorted by name.
pub fn list_rasters(dir: &Path) -> Result<Vec<PathBuf>, LandcoverError> {
    let entries = fs::read_dir(dir)
        .map_err(|err| LandcoverError::Filesystem(format!("read {}: {err}", dir.display())))?;
    let mut rasters = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_geotiff(path))
        .collect::<Vec<_>>();
    rasters.sort();
    Ok(rasters)
}

pub fn file_size(path: &Path) -> Result<u64, LandcoverError> {
    fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|err| LandcoverError::Filesystem(format!("stat {}: {err}", path.display())))
}

pub fn ensure_dir_exists(dir: &Path) -> Result<(), LandcoverError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(LandcoverError::DestinationMissing(dir.to_path_buf()))
    }
}

fn is_geotiff(path: &Path) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"))
}
