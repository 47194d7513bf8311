//! Fixed facts about the Land Cover of Canada product.

pub const LANDCOVER_ID: &str = "nrcan-landcover";
pub const LANDCOVER_TITLE: &str = "Land Cover of Canada - Cartographic Product Collection";
pub const DESCRIPTION: &str = "Collection of Land Cover products for Canada as produced by \
Natural Resources Canada using Landsat satellite imagery. This collection of cartographic \
products offers classified Land Cover of Canada at a 30 metre scale, updated on a 5 year basis.";

/// Canada Atlas Lambert, the native projection of the product.
pub const LANDCOVER_EPSG: u32 = 3978;
pub const GEOGRAPHIC_EPSG: u32 = 4326;

pub const LICENSE: &str = "OGL-Canada-2.0";
pub const LICENSE_HREF: &str = "https://open.canada.ca/en/open-government-licence-canada";
pub const LICENSE_TITLE: &str = "Open Government Licence - Canada";

pub const JSONLD_HREF: &str =
    "https://open.canada.ca/data/en/dataset/4e615eae-b90c-420b-adee-2ca35896caf6.jsonld";
pub const NRCAN_FTP: &str = "http://ftp.maps.canada.ca/pub/nrcan_rncan/Land-cover_Couverture-du-sol/canada-landcover_canada-couverture-du-sol/CanadaLandcover2015.zip";
pub const THUMBNAIL_HREF: &str = "https://www.nrcan.gc.ca/sites/www.nrcan.gc.ca/files/earthsciences/images/satellite-imagery-air-photos/land_cover_2015.jpg";

pub const CITATION: &str = "Natural Resources Canada. Land Cover of Canada - Cartographic \
Product Collection. Canada Centre for Remote Sensing, Ottawa.";

pub const KEYWORDS: &[&str] = &["Land Cover", "Remote Sensing", "Landsat", "Canada", "NRCan"];

pub const NO_DATA_VALUE: u8 = 0;
pub const SPATIAL_RESOLUTION_M: f64 = 30.0;

/// Pixel width and height of the tiles produced by the retiler.
pub const TILING_PIXEL_SIZE: (u32, u32) = (10_000, 10_000);

/// Native bounds of the full 2015 mosaic in EPSG:3978, `[minx, miny, maxx, maxy]`.
pub const FULL_DATASET_BBOX: [f64; 4] = [-2_600_030.0, -885_090.0, 3_100_030.0, 3_914_940.0];

/// Two bounding boxes closer than this (metres, half a pixel) are considered the same.
pub const BBOX_EPSILON: f64 = SPATIAL_RESOLUTION_M / 2.0;

pub struct Provider {
    pub name: &'static str,
    pub roles: &'static [&'static str],
    pub url: &'static str,
}

pub const NRCAN_PROVIDER: Provider = Provider {
    name: "Natural Resources Canada | Ressources naturelles Canada",
    roles: &["producer", "processor", "host"],
    url: "https://www.nrcan.gc.ca/maps-tools-publications/satellite-imagery-air-photos/application-development/land-cover/21755",
};

/// RGBA colours written to band 1 of every COG. Index 0 is transparent.
pub const COLOUR_MAP: &[(u8, [u8; 4])] = &[
    (0, [0, 0, 0, 0]),
    (1, [0, 61, 0, 255]),
    (2, [147, 155, 112, 255]),
    (5, [20, 140, 61, 255]),
    (6, [91, 117, 43, 255]),
    (8, [178, 137, 51, 255]),
    (10, [224, 206, 137, 255]),
    (11, [155, 117, 137, 255]),
    (12, [186, 211, 84, 255]),
    (13, [63, 137, 114, 255]),
    (14, [107, 163, 137, 255]),
    (15, [229, 173, 102, 255]),
    (16, [168, 170, 173, 255]),
    (17, [219, 33, 38, 155]),
    (18, [76, 112, 163, 255]),
    (19, [255, 249, 255, 255]),
];

pub const CLASSIFICATION_VALUES: &[(u8, &str)] = &[
    (0, "No data"),
    (1, "Temperate or sub-polar needleleaf forest"),
    (2, "Sub-polar taiga needleleaf forest"),
    (5, "Temperate or sub-polar broadleaf deciduous forest"),
    (6, "Mixed forest"),
    (8, "Temperate or sub-polar shrubland"),
    (10, "Temperate or sub-polar grassland"),
    (11, "Sub-polar or polar shrubland-lichen-moss"),
    (12, "Sub-polar or polar grassland-lichen-moss"),
    (13, "Sub-polar or polar barren-lichen-moss"),
    (14, "Wetland"),
    (15, "Cropland"),
    (16, "Barren lands"),
    (17, "Urban"),
    (18, "Water"),
    (19, "Snow and Ice"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_class_has_a_colour() {
        assert_eq!(CLASSIFICATION_VALUES.len(), 16);
        for (value, _) in CLASSIFICATION_VALUES {
            assert!(COLOUR_MAP.iter().any(|(index, _)| index == value));
        }
    }
}
