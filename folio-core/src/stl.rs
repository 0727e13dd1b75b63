/// STL parser for binary and ASCII formats
use nalgebra::Point3;
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::LoadError;
use crate::geometry::{Mesh, Triangle};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, LoadError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(LoadError::Parse("file too small to be a valid STL".to_string()));
    }

    let (body, triangle_count) = preceded(take(HEADER_LEN), le_u32)(data)
        .map_err(|e: nom::Err<nom::error::Error<&[u8]>>| LoadError::Parse(e.to_string()))?;
    let triangle_count = triangle_count as usize;

    if body.len() < triangle_count.saturating_mul(FACET_LEN) {
        return Err(LoadError::Parse(format!(
            "unexpected end of file: header declares {} triangles",
            triangle_count
        )));
    }

    let (_, triangles) = count(binary_facet, triangle_count)(body)
        .map_err(|e| LoadError::Parse(e.to_string()))?;

    let mut mesh = Mesh::with_capacity(triangle_count);
    for triangle in triangles {
        mesh.add_triangle(triangle);
    }
    Ok(mesh)
}

fn binary_point(input: &[u8]) -> IResult<&[u8], Point3<f32>> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, Point3::new(x, y, z)))
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    // Stored normals are frequently zero or stale; recompute from winding
    let (input, _normal) = binary_point(input)?;
    let (input, (a, b, c)) = tuple((binary_point, binary_point, binary_point))(input)?;
    let (input, _attributes) = le_u16(input)?;
    Ok((input, Triangle::from_positions(a, b, c)))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, LoadError> {
    match parse_ascii_stl_impl(input) {
        Ok((_, mesh)) => Ok(mesh),
        Err(e) => Err(LoadError::Parse(format!("failed to parse ASCII STL: {}", e))),
    }
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _name) = not_line_ending(input)?;
    let (input, triangles) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;

    let mut mesh = Mesh::with_capacity(triangles.len());
    for triangle in triangles {
        mesh.add_triangle(triangle);
    }

    Ok((input, mesh))
}

fn parse_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, _normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, a) = parse_vertex(input)?;
    let (input, b) = parse_vertex(input)?;
    let (input, c) = parse_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, Triangle::from_positions(a, b, c)))
}

fn parse_vertex(input: &str) -> IResult<&str, Point3<f32>> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    parse_vector3(input)
}

fn parse_vector3(input: &str) -> IResult<&str, Point3<f32>> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, Point3::new(x, y, z)))
}

/// Detect and parse STL file (binary or ASCII).
///
/// Some binary exporters also start their header with `solid`, so a failed
/// ASCII parse falls back to the binary reader.
pub fn parse_stl(data: &[u8]) -> Result<Mesh, LoadError> {
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data)
}
