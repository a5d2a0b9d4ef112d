use std::path::Path;

use geojson::{feature::Id, Feature, FeatureCollection, Geometry, Value};
use serde_json::{json, Map};

use crate::{
    color::Hsv,
    error::{DetectError, Result},
    types::{FilterDetections, FrameReport, OrientedRect, TrackedObject},
};

const KIND_OBJECT: &str = "object";
const KIND_RECT: &str = "oriented_rect";

fn object_features(filter: &FilterDetections, next_id: &mut u64) -> Vec<Feature> {
    let mut features = Vec::new();

    for (object, tracked) in filter.objects.iter().zip(&filter.tracked) {
        let mut properties = Map::new();
        properties.insert("kind".to_string(), json!(KIND_OBJECT));
        properties.insert("filter_id".to_string(), json!(filter.filter_id));
        if let Some(name) = &filter.filter_name {
            properties.insert("filter_name".to_string(), json!(name));
        }
        properties.insert("area".to_string(), json!(object.area));
        properties.insert("pixel".to_string(), json!(tracked.center));
        let color = tracked.avg_color;
        properties.insert("avg_color".to_string(), json!([color.hue, color.sat, color.val]));

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(object.center.to_vec()))),
            id: Some(Id::Number((*next_id).into())),
            properties: Some(properties),
            foreign_members: None,
        });
        *next_id += 1;

        if let Some(rect) = &object.oriented_rect {
            features.push(rect_feature(filter.filter_id, rect, *next_id));
            *next_id += 1;
        }
    }

    features
}

fn rect_feature(filter_id: usize, rect: &OrientedRect, id: u64) -> Feature {
    let mut ring: Vec<Vec<f64>> = rect.corners.iter().map(|c| c.to_vec()).collect();
    ring.push(rect.corners[0].to_vec());

    let mut properties = Map::new();
    properties.insert("kind".to_string(), json!(KIND_RECT));
    properties.insert("filter_id".to_string(), json!(filter_id));
    properties.insert("angle".to_string(), json!(rect.angle));
    properties.insert("width".to_string(), json!(rect.size[0]));
    properties.insert("height".to_string(), json!(rect.size[1]));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
        id: Some(Id::Number(id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn tracked_from_feature(feature: &Feature) -> Result<Option<TrackedObject>> {
    let properties = match &feature.properties {
        Some(properties) => properties,
        None => return Ok(None),
    };
    if properties.get("kind").and_then(|v| v.as_str()) != Some(KIND_OBJECT) {
        return Ok(None);
    }

    let filter_id = properties
        .get("filter_id")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| DetectError::InvalidReport("object without filter_id".to_string()))?;

    let center = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(coords)) if coords.len() >= 2 => {
            [coords[0].round() as i32, coords[1].round() as i32]
        }
        _ => return Err(DetectError::InvalidReport("object without point geometry".to_string())),
    };

    let color: Vec<u8> = properties
        .get("avg_color")
        .and_then(|v| v.as_array())
        .map(|values| values.iter().filter_map(|v| v.as_u64()).map(|v| v.min(255) as u8).collect())
        .unwrap_or_default();
    let avg_color = match color.as_slice() {
        [hue, sat, val] => Hsv::new(*hue, *sat, *val),
        _ => return Err(DetectError::InvalidReport("object without avg_color".to_string())),
    };

    Ok(Some(TrackedObject {
        filter_id: filter_id as usize,
        center,
        avg_color,
    }))
}

impl FrameReport {
    /// Objects as Point features and fitted rectangles as Polygon features
    pub fn to_geojson(&self) -> Result<FeatureCollection> {
        let mut next_id = 0;
        let features = self
            .filters
            .iter()
            .flat_map(|filter| object_features(filter, &mut next_id))
            .collect();

        let mut foreign_members = Map::new();
        foreign_members.insert("frame_index".to_string(), json!(self.frame_index));
        foreign_members.insert("image_width".to_string(), json!(self.image_width));
        foreign_members.insert("image_height".to_string(), json!(self.image_height));
        foreign_members.insert("object_count".to_string(), json!(self.object_count()));

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        })
    }

    /// Export to GeoJSON and serialize to JSON string
    pub fn to_geojson_string(&self) -> Result<String> {
        let geojson = self.to_geojson()?;
        Ok(serde_json::to_string_pretty(&geojson)?)
    }

    /// Save GeoJSON to file
    pub fn save_geojson<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let geojson_string = self.to_geojson_string()?;
        std::fs::write(path, geojson_string)?;
        Ok(())
    }

    /// Read the tracked objects back from an exported report
    pub fn tracked_from_geojson_string(geojson_str: &str) -> Result<Vec<TrackedObject>> {
        let geojson: FeatureCollection = geojson_str.parse()?;

        let mut tracked = Vec::new();
        for feature in &geojson.features {
            if let Some(object) = tracked_from_feature(feature)? {
                tracked.push(object);
            }
        }
        Ok(tracked)
    }
}
