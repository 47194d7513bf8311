//! Schema validation fetches the core and extension JSON schemas.

mod common;

use assert_matches::assert_matches;

use nrcan_landcover::error::LandcoverError;
use nrcan_landcover::metadata::get_metadata;
use nrcan_landcover::stac::{
    ItemSource, create_collection, create_item, validate_collection, validate_item,
};

use common::{MockClient, TILE_ORIGIN, tiff_bbox, write_metadata, write_tiff};

#[test]
#[ignore]
fn created_records_pass_the_stac_schemas() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_metadata(temp.path(), "http://example.com/CanadaLandcover2015.zip");
    let metadata = get_metadata(path.to_str().unwrap(), &MockClient::default()).unwrap();
    let cog = temp.path().join("landcover_1_1_cog.tif");
    write_tiff(&cog, TILE_ORIGIN, (20, 20), &[4]);

    let item = create_item(ItemSource {
        metadata: &metadata,
        cog: Some(&cog),
        extent_asset: None,
        full_bbox: &tiff_bbox(TILE_ORIGIN, (40, 20)),
    })
    .unwrap()
    .item;
    validate_item(&item).unwrap();
    validate_collection(&create_collection(&metadata).unwrap()).unwrap();
}

#[test]
#[ignore]
fn missing_label_fields_fail_the_label_schema() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_metadata(temp.path(), "http://example.com/CanadaLandcover2015.zip");
    let metadata = get_metadata(path.to_str().unwrap(), &MockClient::default()).unwrap();

    let mut item = create_item(ItemSource {
        metadata: &metadata,
        cog: None,
        extent_asset: None,
        full_bbox: &[0.0; 4],
    })
    .unwrap()
    .item;
    item.properties.additional_fields.remove("label:classes");
    assert_matches!(
        validate_item(&item),
        Err(LandcoverError::InvalidStac { kind: "item", .. })
    );
}
