use std::fs;

use chrono::{DateTime, Months, NaiveDate, Utc};
use geojson::Geometry;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::LandcoverError;
use crate::opendata::{OpenDataClient, is_remote};

/// What the tool needs to know about one published edition of the product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceMetadata {
    pub title: String,
    pub description: String,
    pub geometry: Geometry,
    pub access_url: String,
    /// Where the JSON-LD document was read from.
    pub href: String,
}

impl SourceMetadata {
    /// Extract the record from a JSON-LD document. First matching node wins.
    pub fn from_jsonld(document: &Value, href: &str) -> Result<Self, LandcoverError> {
        let graph = document
            .get("@graph")
            .and_then(Value::as_array)
            .ok_or(LandcoverError::MissingMetadataNode("@graph"))?;

        let tiff = graph
            .iter()
            .find(|node| node.get("dct:format").and_then(Value::as_str) == Some("TIFF"))
            .ok_or(LandcoverError::MissingMetadataNode("TIFF distribution"))?;
        let geometry_node = graph
            .iter()
            .find_map(|node| node.get("locn:geometry"))
            .ok_or(LandcoverError::MissingMetadataNode("locn:geometry"))?;
        let geojson = as_list(geometry_node)
            .into_iter()
            .find(|entry| {
                entry
                    .get("@type")
                    .and_then(Value::as_str)
                    .map(|kind| kind.contains("geo+json"))
                    .unwrap_or(false)
            })
            .ok_or(LandcoverError::MissingMetadataNode("GeoJSON geometry"))?;
        let description = graph
            .iter()
            .find_map(|node| node.get("dct:description"))
            .and_then(literal)
            .ok_or(LandcoverError::MissingMetadataNode("dct:description"))?;

        let title = tiff
            .get("dct:title")
            .and_then(literal)
            .ok_or(LandcoverError::MissingMetadataNode("dct:title"))?;
        let access_url = tiff
            .get("dcat:accessURL")
            .and_then(|value| match value {
                Value::String(url) => Some(url.clone()),
                other => other.get("@id").and_then(Value::as_str).map(str::to_string),
            })
            .ok_or(LandcoverError::MissingMetadataNode("dcat:accessURL"))?;

        let geometry_text = geojson
            .get("@value")
            .and_then(Value::as_str)
            .ok_or(LandcoverError::MissingMetadataNode("GeoJSON @value"))?;
        let geometry: Geometry = serde_json::from_str(geometry_text)
            .map_err(|err| LandcoverError::InvalidGeometry(err.to_string()))?;
        if !matches!(geometry.value, geojson::Value::Polygon(_)) {
            return Err(LandcoverError::InvalidGeometry(
                "metadata geometry is not a polygon".to_string(),
            ));
        }

        let metadata = Self {
            title,
            description,
            geometry,
            access_url,
            href: href.to_string(),
        };
        metadata.year()?;
        Ok(metadata)
    }

    pub fn year(&self) -> Result<i32, LandcoverError> {
        let token = self.title.split_whitespace().next().unwrap_or_default();
        if token.len() != 4 || !token.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(LandcoverError::InvalidTitle(self.title.clone()));
        }
        token
            .parse()
            .map_err(|_| LandcoverError::InvalidTitle(self.title.clone()))
    }

    /// January 1 of the title year and five years later.
    pub fn temporal_range(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), LandcoverError> {
        let invalid = || LandcoverError::InvalidTitle(self.title.clone());
        let start = NaiveDate::from_ymd_opt(self.year()?, 1, 1).ok_or_else(invalid)?;
        let end = start
            .checked_add_months(Months::new(5 * 12))
            .ok_or_else(invalid)?;
        let midnight = |date: NaiveDate| date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        Ok((
            midnight(start).ok_or_else(invalid)?,
            midnight(end).ok_or_else(invalid)?,
        ))
    }

    pub fn item_id(&self) -> String {
        self.title.replace(' ', "-")
    }
}

/// Read a JSON-LD metadata document from a URL or a local path.
pub fn get_metadata(
    source: &str,
    client: &dyn OpenDataClient,
) -> Result<SourceMetadata, LandcoverError> {
    if !source.ends_with(".jsonld") {
        return Err(LandcoverError::UnsupportedMetadataFormat(source.to_string()));
    }

    let document = if is_remote(source) {
        info!("fetching metadata");
        debug!(source, "metadata url");
        client.fetch_json(source)?
    } else {
        let content = fs::read_to_string(source)
            .map_err(|err| LandcoverError::Filesystem(format!("read {source}: {err}")))?;
        serde_json::from_str(&content).map_err(|err| LandcoverError::Json(err.to_string()))?
    };

    SourceMetadata::from_jsonld(&document, source)
}

fn as_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

/// Plain strings, `{"@value": ..}` objects, or language-tagged lists (English preferred).
fn literal(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Object(_) => value.get("@value").and_then(Value::as_str).map(str::to_string),
        Value::Array(items) => items
            .iter()
            .find(|item| item.get("@language").and_then(Value::as_str) == Some("en"))
            .or_else(|| items.first())
            .and_then(literal),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn document() -> Value {
        json!({
            "@graph": [
                {"@id": "dataset", "dct:description": [
                    {"@language": "fr", "@value": "Couverture du sol"},
                    {"@language": "en", "@value": "Land cover"}
                ]},
                {"@id": "geom", "locn:geometry": [
                    {"@type": "gsp:wktLiteral", "@value": "POLYGON ((0 0, 1 0, 1 1, 0 0))"},
                    {"@type": "https://www.iana.org/assignments/media-types/application/vnd.geo+json",
                     "@value": "{\"type\": \"Polygon\", \"coordinates\": [[[-141.0, 41.0], [-52.0, 41.0], [-52.0, 84.0], [-141.0, 84.0], [-141.0, 41.0]]]}"}
                ]},
                {"@id": "zip", "dct:format": "TIFF", "dct:title": "2015 Land Cover of Canada",
                 "dcat:accessURL": {"@id": "http://example.com/CanadaLandcover2015.zip"}},
                {"@id": "other", "dct:format": "TIFF", "dct:title": "1999 Ignored"}
            ]
        })
    }

    #[test]
    fn extracts_first_matching_nodes() {
        let metadata = SourceMetadata::from_jsonld(&document(), "local.jsonld").unwrap();
        assert_eq!(metadata.title, "2015 Land Cover of Canada");
        assert_eq!(metadata.description, "Land cover");
        assert_eq!(metadata.access_url, "http://example.com/CanadaLandcover2015.zip");
        assert_eq!(metadata.year().unwrap(), 2015);
        assert_eq!(metadata.item_id(), "2015-Land-Cover-of-Canada");
    }

    #[test]
    fn temporal_range_spans_five_years() {
        let metadata = SourceMetadata::from_jsonld(&document(), "local.jsonld").unwrap();
        let (start, end) = metadata.temporal_range().unwrap();
        assert_eq!(start.to_rfc3339(), "2015-01-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2020-01-01T00:00:00+00:00");
    }

    #[test]
    fn missing_tiff_node_is_named() {
        let mut doc = document();
        doc["@graph"].as_array_mut().unwrap().retain(|node| node.get("dct:format").is_none());
        let err = SourceMetadata::from_jsonld(&doc, "local.jsonld").unwrap_err();
        assert_matches!(err, LandcoverError::MissingMetadataNode("TIFF distribution"));
    }

    #[test]
    fn title_without_year_is_rejected() {
        let mut doc = document();
        doc["@graph"][2]["dct:title"] = json!("Land Cover of Canada");
        let err = SourceMetadata::from_jsonld(&doc, "local.jsonld").unwrap_err();
        assert_matches!(err, LandcoverError::InvalidTitle(_));
    }
}
