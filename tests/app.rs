mod common;

use std::fs;
use std::path::Path;

use assert_matches::assert_matches;
use serde_json::Value;

use nrcan_landcover::app::{App, CogRequest, EXTENT_ASSET_FILE};
use nrcan_landcover::config::{Config, ConfigLoader, ResolvedConfig};
use nrcan_landcover::error::LandcoverError;
use nrcan_landcover::output::JsonOutput;
use nrcan_landcover::stac::read_collection;

use common::{FakeGdal, MockClient, TILE_ORIGIN, tiff_bbox, write_metadata, write_tiff};

fn config_for(full_bbox: [f64; 4]) -> ResolvedConfig {
    ConfigLoader::resolve_config(Config {
        full_bbox: Some(full_bbox),
        validate_stac: Some(false),
        ..Config::default()
    })
}

fn offline() -> ResolvedConfig {
    ConfigLoader::resolve_config(Config {
        validate_stac: Some(false),
        ..Config::default()
    })
}

fn stored_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn build_full_collection_from_local_package() {
    let temp = tempfile::tempdir().unwrap();
    let raster = temp.path().join("CanadaLandcover2015.tif");
    write_tiff(&raster, TILE_ORIGIN, (30, 20), &[9]);
    let metadata_path = write_metadata(temp.path(), raster.to_str().unwrap());
    let destination = temp.path().join("stac");
    fs::create_dir(&destination).unwrap();

    let app = App::new(
        config_for(tiff_bbox(TILE_ORIGIN, (30, 20))),
        MockClient::default(),
        FakeGdal::default(),
    );
    let result = app
        .build_full_collection(metadata_path.to_str(), &destination, false)
        .unwrap();

    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].id, "2015-Land-Cover-of-Canada");
    assert!(!result.items[0].tiled);
    assert!(destination.join(EXTENT_ASSET_FILE).exists());
    assert!(destination.join("CanadaLandcover2015_cog.tif").exists());

    let collection = read_collection(&destination.join("collection.json")).unwrap();
    assert_eq!(collection.id, result.id);
    let item = stored_json(
        &destination
            .join("2015-Land-Cover-of-Canada")
            .join("2015-Land-Cover-of-Canada.json"),
    );
    assert_eq!(
        item["assets"]["landcover"]["href"],
        "../CanadaLandcover2015_cog.tif"
    );
    assert_eq!(
        item["assets"]["extent"]["href"],
        format!("../{EXTENT_ASSET_FILE}")
    );

    JsonOutput::print_collection(&result).unwrap();
}

#[test]
fn build_full_collection_with_tiles() {
    let temp = tempfile::tempdir().unwrap();
    let raster = temp.path().join("CanadaLandcover2015.tif");
    write_tiff(&raster, TILE_ORIGIN, (40, 20), &[9]);
    let metadata_path = write_metadata(temp.path(), raster.to_str().unwrap());
    let destination = temp.path().join("stac");
    fs::create_dir(&destination).unwrap();

    let runner = FakeGdal::default();
    let app = App::new(
        config_for(tiff_bbox(TILE_ORIGIN, (40, 20))),
        MockClient::default(),
        &runner,
    );
    let result = app
        .build_full_collection(metadata_path.to_str(), &destination, true)
        .unwrap();

    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].id, "landcover_1_1");
    assert!(result.items[0].tiled);
    assert_eq!(runner.programs(), ["gdal_retile.py", "gdal_translate"]);
}

#[test]
fn create_cog_from_local_source() {
    let temp = tempfile::tempdir().unwrap();
    let raster = temp.path().join("input.tif");
    write_tiff(&raster, TILE_ORIGIN, (10, 10), &[2]);

    let app = App::new(offline(), MockClient::default(), FakeGdal::default());
    let result = app
        .create_cog(None, temp.path(), Some(&raster), CogRequest::default())
        .unwrap();

    assert_eq!(result.cogs.len(), 1);
    assert!(result.cogs[0].ends_with("input_cog.tif"));
    assert!(temp.path().join("input_cog.tif").exists());
}

#[test]
fn create_item_and_extent_asset() {
    let temp = tempfile::tempdir().unwrap();
    let metadata_path = write_metadata(temp.path(), "http://example.com/CanadaLandcover2015.zip");
    let app = App::new(offline(), MockClient::default(), FakeGdal::default());

    let extent = app
        .create_extent_asset(metadata_path.to_str(), temp.path())
        .unwrap();
    let item = app
        .create_item(
            metadata_path.to_str(),
            temp.path(),
            None,
            Some(Path::new(&extent.path)),
        )
        .unwrap();

    assert_eq!(item.id, "2015-Land-Cover-of-Canada");
    assert!(!item.tiled);
    let stored = stored_json(Path::new(&item.path));
    assert_eq!(
        stored["assets"]["extent"]["href"],
        format!("./{EXTENT_ASSET_FILE}")
    );
}

#[test]
fn default_metadata_url_goes_through_the_client() {
    let temp = tempfile::tempdir().unwrap();
    let client = MockClient::default();
    let app = App::new(offline(), client, FakeGdal::default());

    let err = app.create_collection(None, temp.path()).unwrap_err();
    assert_matches!(err, LandcoverError::HttpStatus { status: 404, .. });
}
