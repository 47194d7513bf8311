//! Read-only raster queries and the colour table write, on top of the `gdal` crate.

use std::path::Path;

use gdal::raster::{ColorEntry, ColorTable, PaletteInterpretation};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DatasetOptions, GdalOpenFlags};
use serde::Serialize;

use crate::constants::COLOUR_MAP;
use crate::error::LandcoverError;

/// Rows read per request while scanning for data.
const SCAN_ROWS: usize = 256;

/// Native georeferencing of a raster file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterInfo {
    /// `[minx, miny, maxx, maxy]` in the raster's own CRS.
    pub bbox: [f64; 4],
    /// Affine coefficients in `proj:transform` order `[a, b, c, d, e, f]`.
    pub transform: [f64; 6],
    /// `[height, width]`
    pub shape: [usize; 2],
    pub band_count: usize,
}

impl RasterInfo {
    pub fn read(path: &Path) -> Result<Self, LandcoverError> {
        let dataset = Dataset::open(path)?;
        Self::from_dataset(&dataset)
    }

    pub fn from_dataset(dataset: &Dataset) -> Result<Self, LandcoverError> {
        let gt = dataset.geo_transform()?;
        let (width, height) = dataset.raster_size();
        Ok(Self {
            bbox: bbox_from_geo_transform(&gt, width, height),
            transform: [gt[1], gt[2], gt[0], gt[4], gt[5], gt[3]],
            shape: [height, width],
            band_count: dataset.raster_count(),
        })
    }
}

/// Bounds of all four pixel-grid corners, so rotated grids are covered too.
pub fn bbox_from_geo_transform(gt: &[f64; 6], width: usize, height: usize) -> [f64; 4] {
    let (w, h) = (width as f64, height as f64);
    let corners = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)].map(|(col, row)| {
        (
            gt[0] + col * gt[1] + row * gt[2],
            gt[3] + col * gt[4] + row * gt[5],
        )
    });
    corners.iter().fold(
        [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY],
        |[min_x, min_y, max_x, max_y], &(x, y)| {
            [min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y)]
        },
    )
}

/// True as soon as any band holds a sample that is neither zero nor the band's no-data value.
pub fn contains_data(path: &Path) -> Result<bool, LandcoverError> {
    let dataset = Dataset::open(path)?;
    for index in 1..=dataset.raster_count() {
        let band = dataset.rasterband(index)?;
        let (width, height) = band.size();
        let no_data = band.no_data_value();
        let mut row = 0;
        while row < height {
            let rows = SCAN_ROWS.min(height - row);
            let buffer =
                band.read_as::<f64>((0, row as isize), (width, rows), (width, rows), None)?;
            let has_data = buffer
                .data()
                .iter()
                .any(|&value| value != 0.0 && !value.is_nan() && Some(value) != no_data);
            if has_data {
                return Ok(true);
            }
            row += rows;
        }
    }
    Ok(false)
}

/// Attach the land cover palette to band 1.
pub fn write_colormap(path: &Path) -> Result<(), LandcoverError> {
    let options = DatasetOptions {
        open_flags: GdalOpenFlags::GDAL_OF_UPDATE | GdalOpenFlags::GDAL_OF_RASTER,
        ..DatasetOptions::default()
    };
    let dataset = Dataset::open_ex(path, options)?;
    let mut band = dataset.rasterband(1)?;

    let mut table = ColorTable::new(PaletteInterpretation::Rgba);
    for &(index, [r, g, b, a]) in COLOUR_MAP {
        table.set_color_entry(
            u16::from(index),
            &ColorEntry::rgba(i16::from(r), i16::from(g), i16::from(b), i16::from(a)),
        );
    }
    band.set_color_table(&table);
    Ok(())
}

pub fn epsg_wkt(epsg: u32) -> Result<String, LandcoverError> {
    Ok(SpatialRef::from_epsg(epsg)?.to_wkt()?)
}
