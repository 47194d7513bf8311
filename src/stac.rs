//! STAC Item and Collection records for the land cover product.
//!
//! Records are `stac` crate types with the Projection, Label, Raster, File,
//! Scientific and Item-Assets extension fields stored in `additional_fields`.
//! Validation runs the STAC JSON schemas through `stac::Validate`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use stac::{Asset, Bbox, Collection, Item, Link, Validate};
use tracing::{debug, info};

use crate::constants::{
    CITATION, CLASSIFICATION_VALUES, DESCRIPTION, KEYWORDS, LANDCOVER_EPSG, LANDCOVER_ID,
    LANDCOVER_TITLE, LICENSE, LICENSE_HREF, LICENSE_TITLE, NO_DATA_VALUE, NRCAN_PROVIDER,
    SPATIAL_RESOLUTION_M, THUMBNAIL_HREF,
};
use crate::error::LandcoverError;
use crate::extent::{self, Extent};
use crate::fs_util;
use crate::metadata::SourceMetadata;
use crate::opendata::is_remote;
use crate::raster::{self, RasterInfo};

pub const COLLECTION_FILE: &str = "collection.json";

pub mod schema {
    pub const PROJECTION: &str = "https://stac-extensions.github.io/projection/v1.0.0/schema.json";
    pub const LABEL: &str = "https://stac-extensions.github.io/label/v1.0.1/schema.json";
    pub const RASTER: &str = "https://stac-extensions.github.io/raster/v1.1.0/schema.json";
    pub const FILE: &str = "https://stac-extensions.github.io/file/v2.1.0/schema.json";
    pub const SCIENTIFIC: &str = "https://stac-extensions.github.io/scientific/v1.0.0/schema.json";
    pub const ITEM_ASSETS: &str =
        "https://stac-extensions.github.io/item-assets/v1.0.0/schema.json";
}

pub mod media_type {
    pub const COG: &str = "image/tiff; application=geotiff; profile=cloud-optimized";
    pub const JSON: &str = "application/json";
    pub const JSONLD: &str = "application/ld+json";
    pub const GEOJSON: &str = "application/geo+json";
    pub const JPEG: &str = "image/jpeg";
}

pub const LANDCOVER_ROLES: &[&str] = &["data", "labels", "labels-raster"];

/// Inputs for one Item. `cog` turns on the `landcover` data asset.
#[derive(Debug, Clone, Copy)]
pub struct ItemSource<'a> {
    pub metadata: &'a SourceMetadata,
    pub cog: Option<&'a Path>,
    pub extent_asset: Option<&'a Path>,
    pub full_bbox: &'a [f64; 4],
}

/// A created Item and whether it covers a single tile of the mosaic.
#[derive(Debug, Clone)]
pub struct LandcoverItem {
    pub item: Item,
    pub tiled: bool,
}

pub fn format_datetime(datetime: &DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Tiles are named after their COG file, the full mosaic after the title.
pub fn item_id(metadata: &SourceMetadata, cog: Option<&Path>, extent: &Extent) -> String {
    match cog.and_then(Path::file_stem) {
        Some(stem) if extent.tiled => {
            let stem = stem.to_string_lossy();
            stem.strip_suffix("_cog").unwrap_or(&stem).to_string()
        }
        _ => metadata.item_id(),
    }
}

fn asset(href: impl Into<String>, media_type: &str, title: &str, roles: &[&str]) -> Asset {
    let href: String = href.into();
    let mut asset = Asset::new(href);
    asset.r#type = Some(media_type.to_string());
    asset.title = Some(title.to_string());
    asset.roles = roles.iter().map(|role| role.to_string()).collect();
    asset
}

fn json_link(href: impl Into<String>, rel: &str) -> Link {
    let href: String = href.into();
    let mut link = Link::new(href, rel);
    link.r#type = Some(media_type::JSON.to_string());
    link
}

/// Local paths are made absolute so the href survives the later rewrite
/// relative to wherever the Item JSON is written.
fn local_href(path: &Path) -> String {
    std::path::absolute(path)
        .map(|absolute| clean(&absolute))
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

fn source_href(href: &str) -> String {
    if is_remote(href) {
        href.to_string()
    } else {
        local_href(Path::new(href))
    }
}

pub fn create_item(source: ItemSource<'_>) -> Result<LandcoverItem, LandcoverError> {
    let metadata = source.metadata;
    let extent = extent::resolve_extent(source.cog, metadata, source.full_bbox)?;
    let id = item_id(metadata, source.cog, &extent);
    let (start, end) = metadata.temporal_range()?;
    debug!(id = %id, tiled = extent.tiled, "creating item");

    let mut item = Item::new(id);
    item.geometry = Some(extent.geometry.clone());
    item.bbox = Some(Bbox::TwoDimensional(extent.bbox));
    item.properties.datetime = Some(start);
    item.properties.start_datetime = Some(start);
    item.properties.end_datetime = Some(end);
    item.properties.title = Some(metadata.title.clone());
    item.properties.description = Some(metadata.description.clone());
    let fields = &mut item.properties.additional_fields;
    fields.insert("proj:epsg".to_string(), json!(LANDCOVER_EPSG));
    fields.insert("label:type".to_string(), json!("raster"));
    fields.insert("label:tasks".to_string(), json!(["classification"]));
    fields.insert("label:properties".to_string(), Value::Null);
    fields.insert("label:description".to_string(), json!(LANDCOVER_TITLE));
    fields.insert("label:classes".to_string(), label_classes());

    item.extensions = vec![schema::PROJECTION.to_string(), schema::LABEL.to_string()];
    item.assets.insert(
        "metadata".to_string(),
        asset(
            source_href(&metadata.href),
            media_type::JSONLD,
            "Land cover of Canada metadata",
            &["metadata"],
        ),
    );

    if !extent.tiled {
        item.assets.insert(
            "thumbnail".to_string(),
            asset(
                THUMBNAIL_HREF,
                media_type::JPEG,
                "Land cover of Canada thumbnail",
                &["thumbnail"],
            ),
        );
    }

    if let Some(path) = source.extent_asset {
        item.assets.insert(
            "extent".to_string(),
            asset(
                local_href(path),
                media_type::GEOJSON,
                "Land cover of Canada extent",
                &["metadata"],
            ),
        );
    }

    if let Some(cog) = source.cog {
        let info = match &extent.native {
            Some(info) => info.clone(),
            None => RasterInfo::read(cog)?,
        };
        item.assets
            .insert("landcover".to_string(), landcover_asset(cog, &info)?);
        item.extensions.push(schema::RASTER.to_string());
        item.extensions.push(schema::FILE.to_string());
    }

    Ok(LandcoverItem {
        item,
        tiled: extent.tiled,
    })
}

fn landcover_asset(cog: &Path, info: &RasterInfo) -> Result<Asset, LandcoverError> {
    let mut asset = asset(
        local_href(cog),
        media_type::COG,
        "Land cover of Canada",
        LANDCOVER_ROLES,
    );
    let fields = &mut asset.additional_fields;
    fields.insert("file:size".to_string(), json!(fs_util::file_size(cog)?));
    fields.insert("file:values".to_string(), file_values());
    fields.insert("raster:bands".to_string(), raster_bands());
    fields.insert("proj:epsg".to_string(), json!(LANDCOVER_EPSG));
    fields.insert(
        "proj:wkt2".to_string(),
        json!(raster::epsg_wkt(LANDCOVER_EPSG)?),
    );
    fields.insert("proj:bbox".to_string(), json!(info.bbox));
    fields.insert("proj:transform".to_string(), json!(info.transform));
    fields.insert("proj:shape".to_string(), json!(info.shape));
    Ok(asset)
}

fn file_values() -> Value {
    Value::Array(
        CLASSIFICATION_VALUES
            .iter()
            .map(|(value, summary)| json!({"values": [value], "summary": summary}))
            .collect(),
    )
}

/// One entry: only band 1 carries the classification.
fn raster_bands() -> Value {
    json!([{
        "nodata": NO_DATA_VALUE,
        "sampling": "area",
        "data_type": "uint8",
        "spatial_resolution": SPATIAL_RESOLUTION_M,
    }])
}

fn label_classes() -> Value {
    let classes = CLASSIFICATION_VALUES
        .iter()
        .map(|(value, _)| *value)
        .collect::<Vec<_>>();
    json!([{"name": null, "classes": classes}])
}

pub fn create_collection(metadata: &SourceMetadata) -> Result<Collection, LandcoverError> {
    let bbox = extent::geometry_bbox(&metadata.geometry)?;
    let (start, end) = metadata.temporal_range()?;

    let document = json!({
        "type": "Collection",
        "stac_version": stac::STAC_VERSION,
        "stac_extensions": [
            schema::ITEM_ASSETS,
            schema::LABEL,
            schema::PROJECTION,
            schema::SCIENTIFIC,
            schema::FILE,
            schema::RASTER,
        ],
        "id": LANDCOVER_ID,
        "title": LANDCOVER_TITLE,
        "description": DESCRIPTION,
        "keywords": KEYWORDS,
        "license": LICENSE,
        "providers": [{
            "name": NRCAN_PROVIDER.name,
            "roles": NRCAN_PROVIDER.roles,
            "url": NRCAN_PROVIDER.url,
        }],
        "extent": {
            "spatial": {"bbox": [bbox]},
            "temporal": {"interval": [[format_datetime(&start), format_datetime(&end)]]},
        },
        "summaries": {
            "label:classes": label_classes(),
            "label:tasks": ["classification"],
            "label:type": ["raster"],
            "proj:epsg": [LANDCOVER_EPSG],
        },
        "item_assets": {
            "landcover": {
                "type": media_type::COG,
                "title": "Land cover of Canada",
                "roles": LANDCOVER_ROLES,
                "file:values": file_values(),
                "raster:bands": raster_bands(),
                "proj:epsg": LANDCOVER_EPSG,
            },
            "metadata": {
                "type": media_type::JSONLD,
                "title": "Land cover of Canada metadata",
                "roles": ["metadata"],
            },
            "extent": {
                "type": media_type::GEOJSON,
                "title": "Land cover of Canada extent",
                "roles": ["metadata"],
            },
        },
        "sci:citation": CITATION,
        "links": [{
            "rel": "license",
            "href": LICENSE_HREF,
            "type": "text/html",
            "title": LICENSE_TITLE,
        }],
    });
    serde_json::from_value(document).map_err(|err| LandcoverError::Json(err.to_string()))
}

/// Write a standalone item as `<dir>/<id>.json`.
pub fn write_item(item: &mut Item, dir: &Path) -> Result<PathBuf, LandcoverError> {
    let path = dir.join(format!("{}.json", item.id));
    relativize_assets(item, dir);
    item.links.retain(|link| link.rel != "self");
    item.links
        .push(json_link(format!("./{}.json", item.id), "self"));
    write_json(&path, item)?;
    absolutize_assets(item, dir);
    info!(path = %path.display(), "wrote item");
    Ok(path)
}

/// Write `<dir>/collection.json` and every item as `<dir>/<id>/<id>.json`,
/// linked to each other with relative hrefs.
pub fn write_collection(
    collection: &mut Collection,
    items: &mut [Item],
    dir: &Path,
) -> Result<PathBuf, LandcoverError> {
    let collection_href = format!("../{COLLECTION_FILE}");
    collection
        .links
        .retain(|link| !matches!(link.rel.as_str(), "root" | "self" | "item"));
    collection
        .links
        .push(json_link(format!("./{COLLECTION_FILE}"), "root"));

    for item in items.iter_mut() {
        let item_dir = dir.join(&item.id);
        fs::create_dir_all(&item_dir)
            .map_err(|err| LandcoverError::Filesystem(err.to_string()))?;
        item.collection = Some(collection.id.clone());
        item.links
            .retain(|link| !matches!(link.rel.as_str(), "root" | "parent" | "collection"));
        for rel in ["root", "parent", "collection"] {
            item.links.push(json_link(collection_href.clone(), rel));
        }
        write_item(item, &item_dir)?;
        collection
            .links
            .push(json_link(format!("./{id}/{id}.json", id = item.id), "item"));
    }

    collection
        .links
        .push(json_link(format!("./{COLLECTION_FILE}"), "self"));
    let path = dir.join(COLLECTION_FILE);
    write_json(&path, collection)?;
    info!(path = %path.display(), items = items.len(), "wrote collection");
    Ok(path)
}

pub fn read_collection(path: &Path) -> Result<Collection, LandcoverError> {
    read_json(path)
}

/// Relative asset hrefs come back resolved against the Item's directory.
pub fn read_item(path: &Path) -> Result<Item, LandcoverError> {
    let mut item: Item = read_json(path)?;
    if let Some(dir) = path.parent() {
        absolutize_assets(&mut item, dir);
    }
    Ok(item)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), LandcoverError> {
    let bytes =
        serde_json::to_vec_pretty(value).map_err(|err| LandcoverError::Json(err.to_string()))?;
    fs::write(path, bytes)
        .map_err(|err| LandcoverError::Filesystem(format!("write {}: {err}", path.display())))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LandcoverError> {
    let content = fs::read_to_string(path)
        .map_err(|err| LandcoverError::Filesystem(format!("read {}: {err}", path.display())))?;
    serde_json::from_str(&content).map_err(|err| LandcoverError::Json(err.to_string()))
}

/// Rewrite every local asset href relative to `dir`. Relative inputs are
/// taken as relative to the working directory.
pub fn relativize_assets(item: &mut Item, dir: &Path) {
    for asset in item.assets.values_mut() {
        let href = asset.href.to_string();
        if !is_remote(&href) {
            asset.href = relative_href(Path::new(&href), dir).into();
        }
    }
}

fn absolutize_assets(item: &mut Item, dir: &Path) {
    for asset in item.assets.values_mut() {
        let href = asset.href.to_string();
        if !is_remote(&href) && Path::new(&href).is_relative() {
            asset.href = local_href(&dir.join(&href)).into();
        }
    }
}

/// Href of `target` as seen from `base_dir`; absolute when they share no root.
pub fn relative_href(target: &Path, base_dir: &Path) -> String {
    let (Ok(target_abs), Ok(base_abs)) = (std::path::absolute(target), std::path::absolute(base_dir))
    else {
        return target.to_string_lossy().to_string();
    };
    let target_abs = clean(&target_abs);
    let base_abs = clean(&base_abs);
    let target_parts = target_abs.components().collect::<Vec<_>>();
    let base_parts = base_abs.components().collect::<Vec<_>>();
    let common = target_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 {
        return target_abs.to_string_lossy().to_string();
    }

    let mut parts = Vec::new();
    if common == base_parts.len() {
        parts.push(".".to_string());
    }
    parts.extend(std::iter::repeat_n("..".to_string(), base_parts.len() - common));
    parts.extend(
        target_parts[common..]
            .iter()
            .map(|part| part.as_os_str().to_string_lossy().to_string()),
    );
    parts.join("/")
}

fn clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other),
        }
    }
    cleaned
}

/// Check an Item against the core and extension JSON schemas.
pub fn validate_item(item: &Item) -> Result<(), LandcoverError> {
    validate_schema(item, "item", &item.id)
}

pub fn validate_collection(collection: &Collection) -> Result<(), LandcoverError> {
    validate_schema(collection, "collection", &collection.id)
}

fn validate_schema<T: Validate>(
    value: &T,
    kind: &'static str,
    id: &str,
) -> Result<(), LandcoverError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| LandcoverError::Validator(err.to_string()))?;
    runtime
        .block_on(value.validate())
        .map_err(|err| LandcoverError::InvalidStac {
            kind,
            id: id.to_string(),
            reason: err.to_string(),
        })?;
    debug!(kind, id, "schema validation passed");
    Ok(())
}
