//! Geometry encoding for GeoPackage blobs.
//!
//! A GeoPackage geometry is a small `GP` header, an optional envelope, and
//! the shape as little-endian well-known binary.

use byteorder::{LittleEndian, WriteBytesExt};
use geo::BoundingRect;
use geo_types::{Coord, Geometry, LineString, Point, Polygon};
use std::io::{self, Write};

const WKB_POINT: u32 = 1;
const WKB_LINESTRING: u32 = 2;
const WKB_POLYGON: u32 = 3;
const WKB_MULTIPOINT: u32 = 4;
const WKB_MULTILINESTRING: u32 = 5;
const WKB_MULTIPOLYGON: u32 = 6;
const WKB_GEOMETRYCOLLECTION: u32 = 7;

/// Byte order marker for little-endian
const WKB_LITTLE_ENDIAN: u8 = 1;

/// Header flags: little-endian, envelope `[minx, maxx, miny, maxy]`
const GP_FLAGS_ENVELOPE_XY: u8 = 0b0000_0011;
/// Header flags: little-endian, no envelope, empty geometry
const GP_FLAGS_EMPTY: u8 = 0b0001_0001;

fn write_header<W: Write>(out: &mut W, kind: u32) -> io::Result<()> {
    out.write_u8(WKB_LITTLE_ENDIAN)?;
    out.write_u32::<LittleEndian>(kind)
}

fn write_coord<W: Write>(out: &mut W, coord: Coord<f64>) -> io::Result<()> {
    out.write_f64::<LittleEndian>(coord.x)?;
    out.write_f64::<LittleEndian>(coord.y)
}

fn write_ring<W: Write>(out: &mut W, ring: &LineString<f64>) -> io::Result<()> {
    out.write_u32::<LittleEndian>(ring.0.len() as u32)?;
    for coord in &ring.0 {
        write_coord(out, *coord)?;
    }
    Ok(())
}

fn write_point<W: Write>(out: &mut W, point: &Point<f64>) -> io::Result<()> {
    write_header(out, WKB_POINT)?;
    write_coord(out, point.0)
}

fn write_linestring<W: Write>(out: &mut W, line: &LineString<f64>) -> io::Result<()> {
    write_header(out, WKB_LINESTRING)?;
    write_ring(out, line)
}

fn write_polygon<W: Write>(out: &mut W, polygon: &Polygon<f64>) -> io::Result<()> {
    write_header(out, WKB_POLYGON)?;
    let rings = 1 + polygon.interiors().len();
    out.write_u32::<LittleEndian>(rings as u32)?;
    write_ring(out, polygon.exterior())?;
    for interior in polygon.interiors() {
        write_ring(out, interior)?;
    }
    Ok(())
}

/// Encode a geometry as little-endian WKB
pub fn write_wkb<W: Write>(out: &mut W, geometry: &Geometry<f64>) -> io::Result<()> {
    match geometry {
        Geometry::Point(p) => write_point(out, p),
        Geometry::Line(l) => write_linestring(out, &LineString::new(vec![l.start, l.end])),
        Geometry::LineString(ls) => write_linestring(out, ls),
        Geometry::Polygon(p) => write_polygon(out, p),
        Geometry::MultiPoint(mp) => {
            write_header(out, WKB_MULTIPOINT)?;
            out.write_u32::<LittleEndian>(mp.0.len() as u32)?;
            for p in &mp.0 {
                write_point(out, p)?;
            }
            Ok(())
        }
        Geometry::MultiLineString(mls) => {
            write_header(out, WKB_MULTILINESTRING)?;
            out.write_u32::<LittleEndian>(mls.0.len() as u32)?;
            for ls in &mls.0 {
                write_linestring(out, ls)?;
            }
            Ok(())
        }
        Geometry::MultiPolygon(mp) => {
            write_header(out, WKB_MULTIPOLYGON)?;
            out.write_u32::<LittleEndian>(mp.0.len() as u32)?;
            for p in &mp.0 {
                write_polygon(out, p)?;
            }
            Ok(())
        }
        Geometry::GeometryCollection(gc) => {
            write_header(out, WKB_GEOMETRYCOLLECTION)?;
            out.write_u32::<LittleEndian>(gc.0.len() as u32)?;
            for g in &gc.0 {
                write_wkb(out, g)?;
            }
            Ok(())
        }
        Geometry::Rect(r) => write_polygon(out, &r.to_polygon()),
        Geometry::Triangle(t) => write_polygon(out, &t.to_polygon()),
    }
}

/// GeoPackage type name for the geometry column
pub fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "POINT",
        Geometry::Line(_) | Geometry::LineString(_) => "LINESTRING",
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => "POLYGON",
        Geometry::MultiPoint(_) => "MULTIPOINT",
        Geometry::MultiLineString(_) => "MULTILINESTRING",
        Geometry::MultiPolygon(_) => "MULTIPOLYGON",
        Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
    }
}

/// Encode a geometry as a GeoPackage binary blob with an XY envelope
pub fn encode_gpkg_geometry(geometry: &Geometry<f64>, srs_id: i32) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(64);
    out.write_all(b"GP")?;
    out.write_u8(0)?;

    match geometry.bounding_rect() {
        Some(rect) => {
            out.write_u8(GP_FLAGS_ENVELOPE_XY)?;
            out.write_i32::<LittleEndian>(srs_id)?;
            out.write_f64::<LittleEndian>(rect.min().x)?;
            out.write_f64::<LittleEndian>(rect.max().x)?;
            out.write_f64::<LittleEndian>(rect.min().y)?;
            out.write_f64::<LittleEndian>(rect.max().y)?;
        }
        None => {
            out.write_u8(GP_FLAGS_EMPTY)?;
            out.write_i32::<LittleEndian>(srs_id)?;
        }
    }

    write_wkb(&mut out, geometry)?;
    Ok(out)
}
