use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::acquire;
use crate::config::ResolvedConfig;
use crate::constants::NO_DATA_VALUE;
use crate::error::LandcoverError;
use crate::metadata::SourceMetadata;
use crate::opendata::OpenDataClient;
use crate::process::ProcessRunner;
use crate::raster;
use crate::tiler::RasterTiler;

#[derive(Debug, Clone, Copy)]
pub struct CogOptions {
    pub raise_on_fail: bool,
    pub dry_run: bool,
}

impl Default for CogOptions {
    fn default() -> Self {
        Self {
            raise_on_fail: true,
            dry_run: false,
        }
    }
}

pub struct CogConverter<R: ProcessRunner> {
    runner: R,
    translate_program: String,
    retile_program: String,
    tile_size: (u32, u32),
    options: CogOptions,
}

impl<R: ProcessRunner> CogConverter<R> {
    pub fn new(runner: R, config: &ResolvedConfig, options: CogOptions) -> Self {
        Self {
            runner,
            translate_program: config.translate_program.clone(),
            retile_program: config.retile_program.clone(),
            tile_size: config.tile_size,
            options,
        }
    }

    pub fn options(&self) -> CogOptions {
        self.options
    }

    pub fn translate_args(input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec!["-of".to_string(), "COG".to_string()];
        for option in [
            "NUM_THREADS=ALL_CPUS",
            "BLOCKSIZE=512",
            "COMPRESS=DEFLATE",
            "LEVEL=9",
            "PREDICTOR=YES",
            "OVERVIEWS=IGNORE_EXISTING",
        ] {
            args.push("-co".to_string());
            args.push(option.to_string());
        }
        args.push("-a_nodata".to_string());
        args.push(NO_DATA_VALUE.to_string());
        args.push(input.to_string_lossy().to_string());
        args.push(output.to_string_lossy().to_string());
        args
    }

    /// Convert one GeoTIFF into a COG at `output` and paint its palette.
    pub fn create_cog(&self, input: &Path, output: &Path) -> Result<PathBuf, LandcoverError> {
        if self.options.dry_run {
            info!(output = %output.display(), "dry run: would have created COG");
            return Ok(output.to_path_buf());
        }

        let result = self.translate(input, output);
        self.settle(result.map(|_| output.to_path_buf()), || {
            error!(output = %output.display(), "failed to create COG");
            output.to_path_buf()
        })
    }

    fn translate(&self, input: &Path, output: &Path) -> Result<(), LandcoverError> {
        info!("converting TIFF to COG");
        debug!(input = %input.display(), output = %output.display(), "translate");
        let args = Self::translate_args(input, output);
        let result = self.runner.run(&self.translate_program, &args)?;
        info!(output = %result.output, "translate finished");
        result.check(&self.translate_program)?;
        raster::write_colormap(output)
    }

    /// Retile `input` and convert every non-empty tile into `output_dir`.
    ///
    /// Tile names are unknown before retiling, so a dry run reports
    /// `output_dir` as the planned target.
    pub fn create_retiled_cogs(
        &self,
        input: &Path,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, LandcoverError> {
        if self.options.dry_run {
            info!(output_dir = %output_dir.display(), "dry run: would have retiled TIFF and created COGs");
            return Ok(vec![output_dir.to_path_buf()]);
        }

        let result = self.retile_and_convert(input, output_dir);
        self.settle(result, || {
            error!(input = %input.display(), "failed to retile");
            Vec::new()
        })
    }

    fn retile_and_convert(
        &self,
        input: &Path,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, LandcoverError> {
        let tile_dir = tempfile::Builder::new()
            .prefix("nrcan-landcover-tiles")
            .tempdir()
            .map_err(|err| LandcoverError::Filesystem(err.to_string()))?;
        let tiler = RasterTiler::new(&self.runner, &self.retile_program);
        let tiles = tiler.retile(input, self.tile_size, tile_dir.path())?;

        let mut cogs = Vec::with_capacity(tiles.len());
        for tile in tiles {
            let output = cog_output_path(&tile.path, output_dir);
            cogs.push(self.create_cog(&tile.path, &output)?);
        }
        Ok(cogs)
    }

    /// Fetch the published raster and convert it, whole or tiled. A dry run
    /// reports `output_dir` since the raster name is only known after unzipping.
    pub fn download_create_cog(
        &self,
        metadata: &SourceMetadata,
        client: &dyn OpenDataClient,
        output_dir: &Path,
        retile: bool,
    ) -> Result<Vec<PathBuf>, LandcoverError> {
        if self.options.dry_run {
            info!(output_dir = %output_dir.display(), "dry run: would have downloaded TIFF and created COGs");
            return Ok(vec![output_dir.to_path_buf()]);
        }

        let package = acquire::acquire_asset(metadata, client)?;
        if retile {
            self.create_retiled_cogs(package.raster_path(), output_dir)
        } else {
            let output = cog_output_path(package.raster_path(), output_dir);
            Ok(vec![self.create_cog(package.raster_path(), &output)?])
        }
    }

    fn settle<T>(
        &self,
        result: Result<T, LandcoverError>,
        fallback: impl FnOnce() -> T,
    ) -> Result<T, LandcoverError> {
        match result {
            Ok(value) => Ok(value),
            Err(err) if self.options.raise_on_fail => Err(err),
            Err(err) => {
                error!(error = %err, "ignoring failure");
                Ok(fallback())
            }
        }
    }
}

/// `<output_dir>/<input stem>_cog.tif`
pub fn cog_output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "landcover".to_string());
    output_dir.join(format!("{stem}_cog.tif"))
}
