use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::LandcoverError;
use crate::fs_util;
use crate::metadata::SourceMetadata;
use crate::opendata::{OpenDataClient, is_remote};

/// A downloaded and unpacked raster package. The working directory lives as
/// long as this value and is removed when it is dropped.
#[derive(Debug)]
pub struct AssetPackage {
    dir: TempDir,
    raster: PathBuf,
}

impl AssetPackage {
    pub fn raster_path(&self) -> &Path {
        &self.raster
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

pub fn acquire_asset(
    metadata: &SourceMetadata,
    client: &dyn OpenDataClient,
) -> Result<AssetPackage, LandcoverError> {
    let dir = tempfile::Builder::new()
        .prefix("nrcan-landcover")
        .tempdir()
        .map_err(|err| LandcoverError::Filesystem(err.to_string()))?;

    let access_url = metadata.access_url.as_str();
    let file_name = access_url
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("package");
    let package_path = dir.path().join(file_name);

    if is_remote(access_url) {
        info!("downloading raster package");
        debug!(access_url, path = %package_path.display(), "download target");
        client.download_url(access_url, &package_path)?;
    } else {
        debug!(access_url, "copying local raster package");
        fs::copy(access_url, &package_path)
            .map_err(|err| LandcoverError::Filesystem(format!("copy {access_url}: {err}")))?;
    }

    if access_url.ends_with(".zip") {
        info!("unzipping raster package");
        let extract_dir = dir.path().join("extract");
        fs_util::unpack_package(&package_path, &extract_dir)?;
    }

    let raster = fs_util::find_raster(dir.path())
        .ok_or_else(|| LandcoverError::AssetNotFound(PathBuf::from(access_url)))?;
    debug!(raster = %raster.display(), "found raster");

    Ok(AssetPackage { dir, raster })
}
