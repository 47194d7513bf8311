use std::fs;
use std::path::Path;

use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry};
use serde::Serialize;
use tracing::debug;

use crate::constants::{BBOX_EPSILON, GEOGRAPHIC_EPSG, LANDCOVER_EPSG};
use crate::error::LandcoverError;
use crate::metadata::SourceMetadata;
use crate::raster::RasterInfo;

/// Points added per bbox edge when reprojecting, so curved edges are enclosed.
const DENSIFY_PTS: i32 = 21;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extent {
    /// `[west, south, east, north]` in degrees.
    pub bbox: [f64; 4],
    pub geometry: Geometry,
    pub tiled: bool,
    /// Native georeferencing, when the extent was read from a raster.
    pub native: Option<RasterInfo>,
}

/// Extent of the whole dataset, or of a tile when `raster` is a tile.
pub fn resolve_extent(
    raster: Option<&Path>,
    metadata: &SourceMetadata,
    full_bbox: &[f64; 4],
) -> Result<Extent, LandcoverError> {
    let Some(path) = raster else {
        return metadata_extent(metadata, None);
    };

    let info = RasterInfo::read(path)?;
    if bbox_matches(&info.bbox, full_bbox, BBOX_EPSILON) {
        debug!(raster = %path.display(), "raster covers the full dataset");
        return metadata_extent(metadata, Some(info));
    }

    debug!(raster = %path.display(), bbox = ?info.bbox, "raster is a tile");
    let bbox = reproject_bbox(&info.bbox, LANDCOVER_EPSG, GEOGRAPHIC_EPSG)?;
    Ok(Extent {
        bbox,
        geometry: bbox_polygon(&bbox),
        tiled: true,
        native: Some(info),
    })
}

fn metadata_extent(
    metadata: &SourceMetadata,
    native: Option<RasterInfo>,
) -> Result<Extent, LandcoverError> {
    Ok(Extent {
        bbox: geometry_bbox(&metadata.geometry)?,
        geometry: metadata.geometry.clone(),
        tiled: false,
        native,
    })
}

pub fn bbox_matches(a: &[f64; 4], b: &[f64; 4], epsilon: f64) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() <= epsilon)
}

/// Bounding rectangle of a polygon's exterior ring.
pub fn geometry_bbox(geometry: &Geometry) -> Result<[f64; 4], LandcoverError> {
    let geojson::Value::Polygon(rings) = &geometry.value else {
        return Err(LandcoverError::InvalidGeometry(
            "expected a polygon".to_string(),
        ));
    };
    let exterior = rings
        .first()
        .filter(|ring| !ring.is_empty())
        .ok_or_else(|| LandcoverError::InvalidGeometry("polygon has no exterior ring".to_string()))?;

    let mut bbox = [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY];
    for position in exterior {
        match position.as_slice() {
            [x, y, ..] => bbox = extend(bbox, *x, *y),
            _ => {
                return Err(LandcoverError::InvalidGeometry(
                    "position with fewer than two coordinates".to_string(),
                ));
            }
        }
    }
    Ok(bbox)
}

fn extend([min_x, min_y, max_x, max_y]: [f64; 4], x: f64, y: f64) -> [f64; 4] {
    [min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y)]
}

/// Closed, counter-clockwise rectangle.
pub fn bbox_polygon(bbox: &[f64; 4]) -> Geometry {
    let [west, south, east, north] = *bbox;
    Geometry::new(geojson::Value::Polygon(vec![vec![
        vec![west, south],
        vec![east, south],
        vec![east, north],
        vec![west, north],
        vec![west, south],
    ]]))
}

pub fn reproject_bbox(
    bbox: &[f64; 4],
    source_epsg: u32,
    target_epsg: u32,
) -> Result<[f64; 4], LandcoverError> {
    let mut source = SpatialRef::from_epsg(source_epsg)?;
    source.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    let mut target = SpatialRef::from_epsg(target_epsg)?;
    target.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);

    let transform = CoordTransform::new(&source, &target)?;
    Ok(transform.transform_bounds(bbox, DENSIFY_PTS)?)
}

/// Write the metadata footprint as a one-feature GeoJSON FeatureCollection.
pub fn create_extent_asset(
    metadata: &SourceMetadata,
    output_path: &Path,
) -> Result<(), LandcoverError> {
    let collection = FeatureCollection {
        bbox: None,
        features: vec![Feature {
            bbox: None,
            geometry: Some(metadata.geometry.clone()),
            id: None,
            properties: Some(Default::default()),
            foreign_members: None,
        }],
        foreign_members: None,
    };
    let text = GeoJson::from(collection).to_string();
    fs::write(output_path, text).map_err(|err| {
        LandcoverError::Filesystem(format!("write {}: {err}", output_path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_bounds() {
        let geometry = bbox_polygon(&[-141.0, 41.0, -52.0, 84.0]);
        assert_eq!(geometry_bbox(&geometry).unwrap(), [-141.0, 41.0, -52.0, 84.0]);
    }

    #[test]
    fn bbox_comparison_tolerates_rounding() {
        let a = [-2_600_030.0, -885_090.0, 3_100_030.0, 3_914_940.0];
        let b = [-2_600_030.000001, -885_089.9999, 3_100_030.0, 3_914_940.0];
        assert!(bbox_matches(&a, &b, BBOX_EPSILON));
        assert!(!bbox_matches(&a, &[0.0, 0.0, 1.0, 1.0], BBOX_EPSILON));
    }

    #[test]
    fn non_polygon_is_rejected() {
        let point = Geometry::new(geojson::Value::Point(vec![1.0, 2.0]));
        assert!(geometry_bbox(&point).is_err());
    }
}
