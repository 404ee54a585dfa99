//! Site ingestion: GeoJSON or CSV in, drawing-box coordinates out.
//!
//! Features are handled as plain JSON values; CSV rows are lifted into a
//! GeoJSON FeatureCollection first so the binder only ever sees one shape of
//! input. Coordinates are reprojected from EPSG:4326 to EPSG:3857 with the
//! spherical Mercator formula, stored with y negated so that y grows downward
//! like screen coordinates, then scaled into a 100x100 drawing box with a
//! caller-chosen padding fraction around the site bounding box.

use log::{debug, warn};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::input::newick::ParsedTree;
use crate::model::instance::{Instance, SitePos};

const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Side length of the drawing box the padded bbox is scaled into.
const DRAW_BOX: f64 = 100.0;

/// Project a WGS84 `(lon, lat)` pair to EPSG:3857 meters.
pub fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = EARTH_RADIUS_M * lon.to_radians();
    let y = EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Lift a CSV table with `lat` and `lon` columns into a GeoJSON
/// FeatureCollection value; every column of a row becomes a feature property.
pub fn csv_to_feature_collection(data: &str) -> Result<Value> {
    let mut reader = csv::Reader::from_reader(data.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| Error::input("csv", e.to_string()))?
        .clone();

    let lat_col = headers.iter().position(|h| h == "lat");
    let lon_col = headers.iter().position(|h| h == "lon");
    let (lat_col, lon_col) = match (lat_col, lon_col) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => return Err(Error::input("csv", "missing required 'lat' and 'lon' columns")),
    };

    let mut features = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::input("csv", e.to_string()))?;
        let lat: f64 = record[lat_col]
            .parse()
            .map_err(|_| Error::input("csv", format!("row {}: 'lat' is not a number", line + 1)))?;
        let lon: f64 = record[lon_col]
            .parse()
            .map_err(|_| Error::input("csv", format!("row {}: 'lon' is not a number", line + 1)))?;

        let properties: serde_json::Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), Value::String(v.to_string())))
            .collect();

        features.push(serde_json::json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [lon, lat] },
            "properties": properties,
        }));
    }

    Ok(serde_json::json!({ "type": "FeatureCollection", "features": features }))
}

/// Bind leaves to sites, reproject, and assemble the instance record.
///
/// With an empty `connect_by`, the i-th Newick leaf takes the i-th feature.
/// Otherwise each leaf label is matched against the named feature property,
/// and an unmatched label is a [`Error::BindingMismatch`] naming the leaf.
pub fn instance_from_features(
    parsed: &ParsedTree,
    geo: &Value,
    rel_padding: f64,
    connect_by: &str,
) -> Result<Instance> {
    if !(0.0..=1.0).contains(&rel_padding) {
        return Err(Error::config("padding", format!("must be in [0, 1], got {rel_padding}")));
    }
    let features = geo
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::input("geojson", "missing 'features' array"))?;

    let mut sites: Vec<SitePos> = Vec::with_capacity(parsed.num_leaves);
    if connect_by.is_empty() {
        if features.len() < parsed.num_leaves {
            return Err(Error::BindingMismatch(format!(
                "not enough sites: {} leaves but only {} features",
                parsed.num_leaves,
                features.len()
            )));
        }
        if features.len() > parsed.num_leaves {
            warn!(
                "{} features for {} leaves; ignoring the trailing {}",
                features.len(),
                parsed.num_leaves,
                features.len() - parsed.num_leaves
            );
        }
        for feature in &features[..parsed.num_leaves] {
            sites.push(site_of(feature)?);
        }
    } else {
        for name in &parsed.names_order {
            let found = features.iter().find(|f| {
                f.get("properties")
                    .and_then(|p| p.get(connect_by))
                    .and_then(Value::as_str)
                    == Some(name.as_str())
            });
            match found {
                Some(feature) => sites.push(site_of(feature)?),
                None => {
                    return Err(Error::BindingMismatch(format!(
                        "leaf '{name}' has no matching site with {connect_by}='{name}'"
                    )));
                }
            }
        }
    }

    // Autofit: padded Mercator bbox, then scale into the drawing box.
    let min_x = sites.iter().map(|s| s.x).fold(f64::INFINITY, f64::min);
    let max_x = sites.iter().map(|s| s.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = sites.iter().map(|s| s.y).fold(f64::INFINITY, f64::min);
    let max_y = sites.iter().map(|s| s.y).fold(f64::NEG_INFINITY, f64::max);

    let padding = ((max_x - min_x) * rel_padding).max((max_y - min_y) * rel_padding);
    let map_left = min_x - padding;
    let map_top = min_y - padding;
    let map_width = max_x - min_x + 2.0 * padding;
    let map_height = max_y - min_y + 2.0 * padding;

    let scale = if map_width > 0.0 && map_height > 0.0 {
        (DRAW_BOX / map_width).min(DRAW_BOX / map_height)
    } else {
        1.0
    };
    for site in &mut sites {
        site.x = (site.x - map_left) * scale;
        site.y = (site.y - map_top) * scale;
    }
    debug!(
        "bound {} sites; mercator bbox {:.1}..{:.1} x {:.1}..{:.1}",
        sites.len(),
        map_left,
        map_left + map_width,
        map_top,
        map_top + map_height
    );

    Ok(Instance {
        title: parsed.title.clone(),
        tree: parsed.tree.clone(),
        sites,
        num_leaves: parsed.num_leaves,
        max_cum_branch_length: parsed.max_cum_branch_length,
        mercator_min_x: map_left,
        mercator_min_y: map_top,
        mercator_max_x: map_left + map_width,
        mercator_max_y: map_top + map_height,
        left_coord: 0.0,
        top_coord: 0.0,
        map_width: map_width * scale,
        map_height: map_height * scale,
    })
}

/// Reproject one feature to a screen-convention Mercator site (y down).
fn site_of(feature: &Value) -> Result<SitePos> {
    let coords = feature
        .get("geometry")
        .and_then(|g| g.get("coordinates"))
        .and_then(Value::as_array)
        .ok_or_else(|| Error::input("geojson", "feature without point coordinates"))?;
    let (lon, lat) = match (coords.first().and_then(Value::as_f64), coords.get(1).and_then(Value::as_f64)) {
        (Some(lon), Some(lat)) => (lon, lat),
        _ => return Err(Error::input("geojson", "feature coordinates are not a [lon, lat] number pair")),
    };
    let (x, y) = mercator(lon, lat);
    Ok(SitePos { x, y: -y })
}
