use geo_traits::to_geo::ToGeoGeometry;
use geo_types::{Geometry, LineString, MultiLineString};
use wkb::reader::read_wkb;

use crate::GeometryError;

fn kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Decodes a line geometry from WKB, always as a multi-line so it can be
/// passed to [`crate::Network::insert_parts`].
pub fn geometry_from_wkb(bytes: &[u8]) -> Result<MultiLineString<f64>, GeometryError> {
    let geometry = read_wkb(bytes)
        .map_err(|e| GeometryError::Wkb(e.to_string()))?
        .try_to_geometry()
        .ok_or(GeometryError::Unsupported("empty geometry"))?;

    match geometry {
        Geometry::LineString(line) => Ok(MultiLineString::new(vec![line])),
        Geometry::MultiLineString(lines) => Ok(lines),
        Geometry::Line(line) => Ok(MultiLineString::new(vec![LineString::from(line)])),
        other => Err(GeometryError::Unsupported(kind(&other))),
    }
}

pub fn line_string_to_wkb(line: &LineString<f64>) -> Result<Vec<u8>, GeometryError> {
    let mut buf = vec![];
    wkb::writer::write_line_string(&mut buf, line, wkb::Endianness::LittleEndian)
        .map_err(|e| GeometryError::Wkb(e.to_string()))?;
    Ok(buf)
}
