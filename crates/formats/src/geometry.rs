//! Conversions between GeoJSON geometries and `geo-types` polygons.

use geo_types::{Geometry as GeoGeometry, MultiPolygon, Polygon};
use geojson::Geometry;

/// Returns the polygonal part of a GeoJSON geometry.
///
/// `Polygon` and `MultiPolygon` convert directly; a `GeometryCollection` contributes every
/// polygonal member. Points and lines yield `None`.
pub fn to_multi_polygon(geometry: &Geometry) -> Option<MultiPolygon<f64>> {
    let geom = GeoGeometry::<f64>::try_from(geometry.value.clone()).ok()?;
    let mut polys = Vec::new();
    collect_polygons(geom, &mut polys);
    if polys.is_empty() {
        None
    } else {
        Some(MultiPolygon::new(polys))
    }
}

fn collect_polygons(geom: GeoGeometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geom {
        GeoGeometry::Polygon(p) => out.push(p),
        GeoGeometry::MultiPolygon(mp) => out.extend(mp.0),
        GeoGeometry::Rect(r) => out.push(r.to_polygon()),
        GeoGeometry::Triangle(t) => out.push(t.to_polygon()),
        GeoGeometry::GeometryCollection(gc) => {
            for g in gc.0 {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

/// The outer ring of a polygonal geometry as `[lon, lat]` positions.
///
/// For a `MultiPolygon` this is the outer ring of its first member.
pub fn first_outer_ring(geometry: &Geometry) -> Option<Vec<[f64; 2]>> {
    let ring = match &geometry.value {
        geojson::Value::Polygon(rings) => rings.first()?,
        geojson::Value::MultiPolygon(polys) => polys.first()?.first()?,
        _ => return None,
    };
    Some(
        ring.iter()
            .filter(|p| p.len() >= 2)
            .map(|p| [p[0], p[1]])
            .collect(),
    )
}

/// Every `[lon, lat]` position of a geometry, in document order.
pub fn positions(geometry: &Geometry) -> Vec<[f64; 2]> {
    let mut out = Vec::new();
    push_positions(&geometry.value, &mut out);
    out
}

fn push_positions(value: &geojson::Value, out: &mut Vec<[f64; 2]>) {
    let mut push = |p: &Vec<f64>| {
        if p.len() >= 2 {
            out.push([p[0], p[1]]);
        }
    };
    match value {
        geojson::Value::Point(p) => push(p),
        geojson::Value::MultiPoint(ps) | geojson::Value::LineString(ps) => ps.iter().for_each(push),
        geojson::Value::MultiLineString(ls) | geojson::Value::Polygon(ls) => {
            ls.iter().flatten().for_each(push)
        }
        geojson::Value::MultiPolygon(polys) => polys.iter().flatten().flatten().for_each(push),
        geojson::Value::GeometryCollection(geoms) => {
            for g in geoms {
                push_positions(&g.value, out);
            }
        }
    }
}
