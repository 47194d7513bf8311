#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use gdal::DriverManager;
use gdal::raster::Buffer;
use serde_json::Value;

use nrcan_landcover::constants::LANDCOVER_EPSG;
use nrcan_landcover::error::LandcoverError;
use nrcan_landcover::opendata::OpenDataClient;
use nrcan_landcover::process::{ProcessOutput, ProcessRunner};
use nrcan_landcover::raster;

pub const PIXEL_SIZE: f64 = 30.0;

/// A small EPSG:3978 grid near Winnipeg, 30 m pixels.
pub const TILE_ORIGIN: (f64, f64) = (-300_000.0, 300_000.0);

/// Write a `u8` GTiff with one band per entry of `bands`, each filled with
/// that value.
pub fn write_tiff(path: &Path, origin: (f64, f64), size: (usize, usize), bands: &[u8]) {
    let (width, height) = size;
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type::<u8, _>(path, width, height, bands.len())
        .unwrap();
    dataset
        .set_geo_transform(&[origin.0, PIXEL_SIZE, 0.0, origin.1, 0.0, -PIXEL_SIZE])
        .unwrap();
    dataset
        .set_projection(&raster::epsg_wkt(LANDCOVER_EPSG).unwrap())
        .unwrap();
    for (index, value) in bands.iter().enumerate() {
        let mut band = dataset.rasterband(index + 1).unwrap();
        let mut buffer = Buffer::new((width, height), vec![*value; width * height]);
        band.write((0, 0), (width, height), &mut buffer).unwrap();
    }
}

/// Native bounds of a raster written by `write_tiff`.
pub fn tiff_bbox(origin: (f64, f64), size: (usize, usize)) -> [f64; 4] {
    [
        origin.0,
        origin.1 - size.1 as f64 * PIXEL_SIZE,
        origin.0 + size.0 as f64 * PIXEL_SIZE,
        origin.1,
    ]
}

pub fn metadata_document(access_url: &str) -> String {
    let geometry = r#"{\"type\": \"Polygon\", \"coordinates\": [[[-141.0, 41.0], [-52.0, 41.0], [-52.0, 84.0], [-141.0, 84.0], [-141.0, 41.0]]]}"#;
    format!(
        r#"{{
  "@context": {{"dct": "http://purl.org/dc/terms/", "dcat": "http://www.w3.org/ns/dcat#"}},
  "@graph": [
    {{
      "@id": "https://open.canada.ca/data/en/dataset/4e615eae-b90c-420b-adee-2ca35896caf6",
      "@type": "dcat:Dataset",
      "dct:description": [
        {{"@language": "fr", "@value": "Couverture du sol du Canada"}},
        {{"@language": "en", "@value": "Land cover of Canada at 30 metre resolution"}}
      ]
    }},
    {{
      "@id": "_:geometry",
      "locn:geometry": [
        {{"@type": "gsp:wktLiteral", "@value": "POLYGON ((-141 41, -52 41, -52 84, -141 84, -141 41))"}},
        {{"@type": "https://www.iana.org/assignments/media-types/application/vnd.geo+json", "@value": "{geometry}"}}
      ]
    }},
    {{
      "@id": "_:pdf",
      "dct:format": "PDF",
      "dct:title": "Land Cover product guide",
      "dcat:accessURL": {{"@id": "https://example.com/product-guide.pdf"}}
    }},
    {{
      "@id": "_:tiff",
      "dct:format": "TIFF",
      "dct:title": "2015 Land Cover of Canada",
      "dcat:accessURL": {{"@id": "{access_url}"}}
    }}
  ]
}}"#
    )
}

/// Write a metadata document pointing at `access_url` and return its path.
pub fn write_metadata(dir: &Path, access_url: &str) -> PathBuf {
    let path = dir.join("landcover.jsonld");
    fs::write(&path, metadata_document(access_url)).unwrap();
    path
}

/// Serves documents from memory and downloads by copying local files.
#[derive(Default)]
pub struct MockClient {
    pub documents: Vec<(String, Value)>,
    pub files: Vec<(String, PathBuf)>,
    pub calls: Mutex<Vec<String>>,
}

impl OpenDataClient for MockClient {
    fn fetch_json(&self, url: &str) -> Result<Value, LandcoverError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.documents
            .iter()
            .find(|(known, _)| known == url)
            .map(|(_, document)| document.clone())
            .ok_or(LandcoverError::HttpStatus {
                status: 404,
                message: url.to_string(),
            })
    }

    fn download_url(&self, url: &str, destination: &Path) -> Result<(), LandcoverError> {
        self.calls.lock().unwrap().push(url.to_string());
        let (_, source) = self
            .files
            .iter()
            .find(|(known, _)| known == url)
            .ok_or(LandcoverError::HttpStatus {
                status: 404,
                message: url.to_string(),
            })?;
        fs::copy(source, destination).unwrap();
        Ok(())
    }
}

/// Stands in for the GDAL command line tools.
///
/// `gdal_translate` copies its input to its output. The retiler writes one
/// tile with data and one empty tile into the target directory.
#[derive(Default)]
pub struct FakeGdal {
    pub calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeGdal {
    pub fn programs(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(program, _)| program.clone())
            .collect()
    }
}

impl ProcessRunner for FakeGdal {
    fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput, LandcoverError> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));

        if program.contains("retile") {
            let target = args
                .iter()
                .position(|arg| arg == "-targetDir")
                .map(|index| PathBuf::from(&args[index + 1]))
                .unwrap();
            write_tiff(&target.join("landcover_1_1.tif"), TILE_ORIGIN, (20, 20), &[5]);
            write_tiff(
                &target.join("landcover_1_2.tif"),
                (TILE_ORIGIN.0 + 600.0, TILE_ORIGIN.1),
                (20, 20),
                &[0],
            );
        } else {
            let output = &args[args.len() - 1];
            let input = &args[args.len() - 2];
            fs::copy(input, output).unwrap();
        }

        Ok(ProcessOutput {
            success: true,
            status: "exit status: 0".to_string(),
            output: format!("{program} done"),
        })
    }
}
