//! Wavefront OBJ loading.
//!
//! Parsing is delegated to `tobj` with triangulation and single-index
//! vertices; every model in the file is merged into one `Mesh`. Faces may
//! reference texture coordinates and normals. Missing normals are computed
//! as area-weighted face-normal averages.

use std::io::BufReader;
use std::path::Path;

use glam::{Vec2, Vec3};
use thiserror::Error;

use crate::mesh::Mesh;

/// Errors that can occur while loading mesh geometry.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OBJ parse error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("Invalid {kind} index {index} (only {len} available)")]
    InvalidIndex {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Malformed mesh: {0}")]
    Malformed(String),

    #[error("No geometry found in mesh file")]
    NoGeometry,
}

/// Result type for mesh loading.
pub type MeshResult<T> = Result<T, MeshError>;

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

/// Load an OBJ file from disk.
pub fn load_obj(path: impl AsRef<Path>) -> MeshResult<Mesh> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let mesh = parse_obj(&content)?;

    log::info!(
        "Loaded {}: {} vertices, {} triangles",
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    log::debug!("{} bounds: {:?}", path.display(), mesh.bounds);

    Ok(mesh)
}

/// Statements accepted in OBJ text. Anything else is a fatal error.
const KNOWN_STATEMENTS: &[&str] = &[
    "v", "vt", "vn", "f", "o", "g", "s", "usemtl", "mtllib", "l", "p",
];

/// Reject unknown statements and face indices outside the elements declared
/// so far. `tobj` silently skips the former.
fn check_statements(content: &str) -> MeshResult<()> {
    let (mut positions, mut texcoords, mut normals) = (0usize, 0usize, 0usize);

    for (number, line) in content.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        let keyword = match tokens.next() {
            Some(keyword) if !keyword.starts_with('#') => keyword,
            _ => continue,
        };

        match keyword {
            "v" => positions += 1,
            "vt" => texcoords += 1,
            "vn" => normals += 1,
            "f" => {
                for vertex in tokens {
                    let refs = vertex.split('/');
                    let limits = [
                        ("position", positions),
                        ("texture coordinate", texcoords),
                        ("normal", normals),
                    ];
                    for (component, (kind, len)) in refs.zip(limits) {
                        if component.is_empty() {
                            continue;
                        }
                        check_index(component, kind, len, number + 1)?;
                    }
                }
            }
            _ if KNOWN_STATEMENTS.contains(&keyword) => {}
            _ => {
                return Err(MeshError::Malformed(format!(
                    "line {}: unknown statement '{}'",
                    number + 1,
                    keyword
                )))
            }
        }
    }

    Ok(())
}

/// Check one 1-based (or negative, relative) face index against `len`.
fn check_index(component: &str, kind: &'static str, len: usize, line: usize) -> MeshResult<()> {
    let index: i64 = component.parse().map_err(|_| {
        MeshError::Malformed(format!("line {}: bad {} index '{}'", line, kind, component))
    })?;

    if index != 0 && index.unsigned_abs() as usize <= len {
        Ok(())
    } else {
        Err(MeshError::InvalidIndex {
            kind,
            index: index.unsigned_abs() as usize,
            len,
        })
    }
}

/// Parse OBJ text. Material libraries are not loaded.
pub fn parse_obj(content: &str) -> MeshResult<Mesh> {
    check_statements(content)?;

    let mut reader = BufReader::new(content.as_bytes());
    let (models, _materials) = tobj::load_obj_buf(&mut reader, &load_options(), |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })?;

    let mut merged: Option<Mesh> = None;
    for model in models {
        let mesh = convert_model(&model.mesh)?;
        log::debug!(
            "OBJ model '{}': {} triangles",
            model.name,
            mesh.triangle_count()
        );
        match merged.as_mut() {
            Some(merged) => merged.append(mesh),
            None => merged = Some(mesh),
        }
    }

    let mut mesh = match merged {
        Some(mesh) if mesh.triangle_count() > 0 => mesh,
        _ => return Err(MeshError::NoGeometry),
    };

    mesh.ensure_normals();
    mesh.validate()?;
    Ok(mesh)
}

/// Convert one `tobj` mesh (flat f32 arrays) to a `Mesh`.
fn convert_model(model: &tobj::Mesh) -> MeshResult<Mesh> {
    if model.positions.len() % 3 != 0 {
        return Err(MeshError::Malformed(format!(
            "{} position components",
            model.positions.len()
        )));
    }

    let positions: Vec<Vec3> = model
        .positions
        .chunks_exact(3)
        .map(Vec3::from_slice)
        .collect();

    let normals = (!model.normals.is_empty()).then(|| {
        model
            .normals
            .chunks_exact(3)
            .map(Vec3::from_slice)
            .collect::<Vec<_>>()
    });

    let uvs = (!model.texcoords.is_empty()).then(|| {
        model
            .texcoords
            .chunks_exact(2)
            .map(Vec2::from_slice)
            .collect::<Vec<_>>()
    });

    let mesh = Mesh::new_with_uvs(positions, model.indices.clone(), normals, uvs);
    mesh.validate()?;
    Ok(mesh)
}
