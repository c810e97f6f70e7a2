//! Geographic boundary decoding.
//!
//! Accepts either a TopoJSON `Topology` (shared, optionally quantized arcs)
//! or a plain GeoJSON `FeatureCollection`, and yields one `GeoFeature` per
//! country with its shape in (lon, lat) degrees.

use geo::{LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{LoadError, LoadResult};

type Ring = Vec<(f64, f64)>;

#[derive(Clone, Debug, PartialEq)]
pub struct GeoFeature {
    pub id: String,
    pub name: String,
    pub shape: MultiPolygon<f64>,
}

impl GeoFeature {
    pub fn has_holes(&self) -> bool {
        self.shape.0.iter().any(|p| !p.interiors().is_empty())
    }
}

fn closed_ring(ring: Ring) -> Option<LineString<f64>> {
    let mut line = LineString::from(ring);
    line.close();
    (line.0.len() >= 4).then_some(line)
}

/// First ring is the exterior, any further rings are holes.
fn polygon_from_rings(rings: Vec<Ring>) -> Option<Polygon<f64>> {
    let mut rings = rings.into_iter();
    let exterior = closed_ring(rings.next()?)?;
    Some(Polygon::new(exterior, rings.filter_map(closed_ring).collect()))
}

#[derive(Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Deserialize)]
struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    objects: BTreeMap<String, TopoGeometry>,
    arcs: Vec<Vec<Vec<f64>>>,
}

#[derive(Deserialize)]
struct TopoGeometry {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    arcs: Value,
    #[serde(default)]
    geometries: Vec<TopoGeometry>,
    #[serde(default)]
    id: Value,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

pub fn parse_boundaries(json: &str) -> LoadResult<Vec<GeoFeature>> {
    let doc: Value = serde_json::from_str(json)
        .map_err(|source| LoadError::Json { what: "boundaries", source })?;
    match doc["type"].as_str() {
        Some("Topology") => {
            let topo: Topology = serde_json::from_value(doc)
                .map_err(|source| LoadError::Json { what: "topology", source })?;
            topology_features(&topo)
        }
        Some("FeatureCollection") => geojson_features(&doc),
        other => Err(LoadError::Topology(format!("unsupported document type {:?}", other))),
    }
}

fn feature_name(properties: Option<&Map<String, Value>>) -> String {
    let Some(props) = properties else { return String::new() };
    ["name", "NAME", "ADMIN"]
        .iter()
        .find_map(|key| props.get(*key).and_then(Value::as_str))
        .unwrap_or("")
        .to_string()
}

fn feature_id(id: &Value, ordinal: usize) -> String {
    match id {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => format!("feature-{}", ordinal),
    }
}

fn decode_arcs(arcs: &[Vec<Vec<f64>>], transform: Option<&Transform>) -> Vec<Ring> {
    arcs.iter()
        .map(|arc| {
            let points = arc.iter().filter(|p| p.len() >= 2);
            match transform {
                Some(t) => {
                    let (mut x, mut y) = (0.0, 0.0);
                    points
                        .map(|p| {
                            x += p[0];
                            y += p[1];
                            (x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1])
                        })
                        .collect()
                }
                None => points.map(|p| (p[0], p[1])).collect(),
            }
        })
        .collect()
}

fn stitch_ring(indices: &[i64], arcs: &[Ring]) -> LoadResult<Ring> {
    let mut ring: Ring = Vec::new();
    for &index in indices {
        let (slot, reversed) = if index >= 0 { (index as usize, false) } else { ((!index) as usize, true) };
        let arc = arcs
            .get(slot)
            .ok_or_else(|| LoadError::Topology(format!("arc index {} out of range", index)))?;
        let skip = usize::from(!ring.is_empty());
        if reversed {
            ring.extend(arc.iter().rev().skip(skip).copied());
        } else {
            ring.extend(arc.iter().skip(skip).copied());
        }
    }
    Ok(ring)
}

fn stitch_polygon(rings: &[Vec<i64>], arcs: &[Ring]) -> LoadResult<Option<Polygon<f64>>> {
    let rings = rings
        .iter()
        .map(|r| stitch_ring(r, arcs))
        .collect::<LoadResult<Vec<_>>>()?;
    Ok(polygon_from_rings(rings))
}

fn topo_shape(geom: &TopoGeometry, arcs: &[Ring]) -> LoadResult<MultiPolygon<f64>> {
    let parse_err = |e: serde_json::Error| LoadError::Topology(e.to_string());
    let polygons = match geom.kind.as_deref() {
        Some("Polygon") => {
            let rings: Vec<Vec<i64>> = serde_json::from_value(geom.arcs.clone()).map_err(parse_err)?;
            stitch_polygon(&rings, arcs)?.into_iter().collect()
        }
        Some("MultiPolygon") => {
            let polys: Vec<Vec<Vec<i64>>> = serde_json::from_value(geom.arcs.clone()).map_err(parse_err)?;
            polys
                .iter()
                .map(|rings| stitch_polygon(rings, arcs))
                .collect::<LoadResult<Vec<_>>>()?
                .into_iter()
                .flatten()
                .collect()
        }
        _ => Vec::new(),
    };
    Ok(MultiPolygon(polygons))
}

fn collect_topo_features(
    geom: &TopoGeometry,
    arcs: &[Ring],
    out: &mut Vec<GeoFeature>,
) -> LoadResult<()> {
    if geom.kind.as_deref() == Some("GeometryCollection") {
        for child in &geom.geometries {
            collect_topo_features(child, arcs, out)?;
        }
        return Ok(());
    }
    let ordinal = out.len();
    out.push(GeoFeature {
        id: feature_id(&geom.id, ordinal),
        name: feature_name(geom.properties.as_ref()),
        shape: topo_shape(geom, arcs)?,
    });
    Ok(())
}

fn topology_features(topo: &Topology) -> LoadResult<Vec<GeoFeature>> {
    let object = topo
        .objects
        .get("countries")
        .or_else(|| topo.objects.values().next())
        .ok_or_else(|| LoadError::Topology("topology has no objects".to_string()))?;
    let arcs = decode_arcs(&topo.arcs, topo.transform.as_ref());
    let mut features = Vec::new();
    collect_topo_features(object, &arcs, &mut features)?;
    Ok(features)
}

fn coord_ring(value: &Value) -> Option<Ring> {
    let ring: Ring = value
        .as_array()?
        .iter()
        .filter_map(|p| {
            let a = p.as_array()?;
            Some((a.first()?.as_f64()?, a.get(1)?.as_f64()?))
        })
        .collect();
    (ring.len() >= 3).then_some(ring)
}

fn coord_polygon(value: &Value) -> Option<Polygon<f64>> {
    polygon_from_rings(value.as_array()?.iter().filter_map(coord_ring).collect())
}

fn geojson_features(doc: &Value) -> LoadResult<Vec<GeoFeature>> {
    let features = doc["features"]
        .as_array()
        .ok_or_else(|| LoadError::Topology("no features".to_string()))?;
    Ok(features
        .iter()
        .enumerate()
        .map(|(ordinal, feat)| {
            let geom = &feat["geometry"];
            let polygons = match geom["type"].as_str() {
                Some("Polygon") => coord_polygon(&geom["coordinates"]).into_iter().collect(),
                Some("MultiPolygon") => geom["coordinates"]
                    .as_array()
                    .map(|polys| polys.iter().filter_map(coord_polygon).collect())
                    .unwrap_or_default(),
                _ => Vec::new(),
            };
            GeoFeature {
                id: feature_id(&feat["id"], ordinal),
                name: feature_name(feat["properties"].as_object()),
                shape: MultiPolygon(polygons),
            }
        })
        .collect())
}
