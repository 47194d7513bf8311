use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::LandcoverError;
use crate::fs_util;
use crate::process::ProcessRunner;
use crate::raster::{self, RasterInfo};

/// A retiled file that holds at least one data sample.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterTile {
    pub path: PathBuf,
    pub info: RasterInfo,
}

pub struct RasterTiler<'a, R: ProcessRunner> {
    runner: &'a R,
    program: &'a str,
}

impl<'a, R: ProcessRunner> RasterTiler<'a, R> {
    pub fn new(runner: &'a R, program: &'a str) -> Self {
        Self { runner, program }
    }

    pub fn retile_args(input: &Path, tile_size: (u32, u32), target_dir: &Path) -> Vec<String> {
        vec![
            "-ps".to_string(),
            tile_size.0.to_string(),
            tile_size.1.to_string(),
            "-targetDir".to_string(),
            target_dir.to_string_lossy().to_string(),
            input.to_string_lossy().to_string(),
        ]
    }

    /// Split `input` into `target_dir` and return the non-empty tiles in file name order.
    pub fn retile(
        &self,
        input: &Path,
        tile_size: (u32, u32),
        target_dir: &Path,
    ) -> Result<Vec<RasterTile>, LandcoverError> {
        info!(input = %input.display(), "retiling raster");
        let args = Self::retile_args(input, tile_size, target_dir);
        let output = self.runner.run(self.program, &args)?;
        info!(output = %output.output, "retiler finished");
        output.check(self.program)?;

        let mut tiles = Vec::new();
        for path in fs_util::list_rasters(target_dir)? {
            if !raster::contains_data(&path)? {
                debug!(tile = %path.display(), "ignoring empty tile");
                continue;
            }
            debug!(tile = %path.display(), "tile contains data");
            let info = RasterInfo::read(&path)?;
            tiles.push(RasterTile { path, info });
        }
        info!(count = tiles.len(), "non-empty tiles");
        Ok(tiles)
    }
}
