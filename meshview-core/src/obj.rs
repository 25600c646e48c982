/// Loader for the vertex/normal/face subset of Wavefront OBJ
///
/// Only triangular faces are read. Texture coordinates are tolerated in
/// face corners but discarded, and every directive other than `v`, `vn`
/// and `f` is ignored.
use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::tag,
    character::complete::{digit0, digit1},
    combinator::{eof, map_res, opt},
    number::complete::float,
    sequence::preceded,
    IResult,
};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::geometry::{Mesh, DEFAULT_NORMAL};

/// One face corner: a 0-based vertex index and, if the corner had a third
/// slash field, the normal index it named (still 1-based, unchecked).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Corner {
    vertex: u32,
    normal: Option<u32>,
}

/// Pools collected during the scan, before de-indexing.
#[derive(Debug, Default)]
struct ObjPools {
    positions: Vec<Point3<f32>>,
    normals: Vec<Vector3<f32>>,
    /// Corners in file order, paired with the line they came from.
    corners: Vec<(usize, Corner)>,
}

/// Read and parse a geometry file.
///
/// A file that yields no faces is reported as [`LoadError::Empty`].
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mesh = parse_obj(&text)?;
    if mesh.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    info!("Loaded {} vertices from {}", mesh.vertex_count(), path.display());
    Ok(mesh)
}

/// Parse OBJ text into a de-indexed mesh.
///
/// Corners whose normal index is missing, zero or past the end of the
/// normal pool get [`DEFAULT_NORMAL`] instead of failing the parse.
pub fn parse_obj(input: &str) -> Result<Mesh, LoadError> {
    let mut pools = ObjPools::default();

    for (line_index, line) in input.lines().enumerate() {
        let line_number = line_index + 1;
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => pools.positions.push(Point3::from(parse_triple(tokens))),
            Some("vn") => pools.normals.push(parse_triple(tokens)),
            Some("f") => {
                let corners: Vec<&str> = tokens.take(3).collect();
                match parse_face(&corners) {
                    Some(face) => pools
                        .corners
                        .extend(face.into_iter().map(|corner| (line_number, corner))),
                    None => warn!("line {}: skipping malformed face '{}'", line_number, line.trim()),
                }
            }
            Some(other) => debug!("line {}: ignoring directive '{}'", line_number, other),
            None => {}
        }
    }

    pools.into_mesh()
}

impl ObjPools {
    fn into_mesh(self) -> Result<Mesh, LoadError> {
        let mut mesh = Mesh::with_capacity(self.corners.len());

        for (line, corner) in self.corners {
            let position = self
                .positions
                .get(corner.vertex as usize)
                .copied()
                .ok_or(LoadError::VertexIndexOutOfRange {
                    line,
                    index: corner.vertex.wrapping_add(1),
                })?;

            let normal = corner
                .normal
                .and_then(|index| index.checked_sub(1))
                .and_then(|index| self.normals.get(index as usize))
                .copied()
                .unwrap_or(DEFAULT_NORMAL);

            mesh.push_corner(position, normal);
        }

        Ok(mesh)
    }
}

/// Three float components; anything missing or unparsable reads as zero.
fn parse_triple<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Vector3<f32> {
    let mut component = || tokens.next().and_then(parse_float).unwrap_or(0.0);
    let x = component();
    let y = component();
    let z = component();
    Vector3::new(x, y, z)
}

fn parse_float(token: &str) -> Option<f32> {
    let result: IResult<&str, f32> = float(token);
    result.ok().map(|(_, value)| value)
}

/// A face needs exactly three well-formed corners; later tokens have
/// already been dropped by the caller.
fn parse_face(tokens: &[&str]) -> Option<[Corner; 3]> {
    if tokens.len() < 3 {
        return None;
    }

    let mut face = [Corner {
        vertex: 0,
        normal: None,
    }; 3];
    for (slot, token) in face.iter_mut().zip(tokens) {
        let (_, parsed) = corner(token).ok()?;
        *slot = parsed;
    }
    Some(face)
}

/// `v`, `v/t`, `v//n` or `v/t/n`, with 1-based indices.
fn corner(input: &str) -> IResult<&str, Corner> {
    let (input, vertex) = vertex_index(input)?;
    let (input, _texture) = opt(preceded(tag("/"), digit0))(input)?;
    let (input, normal) = opt(preceded(tag("/"), opt(index)))(input)?;
    let (input, _) = eof(input)?;

    Ok((
        input,
        Corner {
            vertex,
            normal: normal.flatten(),
        },
    ))
}

/// The vertex field, converted to 0-based. Index `0` wraps to `u32::MAX`
/// so the de-indexer rejects it as out of range.
fn vertex_index(input: &str) -> IResult<&str, u32> {
    let (input, value) = index(input)?;
    Ok((input, value.wrapping_sub(1)))
}

fn index(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |digits: &str| digits.parse::<u32>())(input)
}
