//! Writing finished surfaces to disk.
//!
//! Output files are written next to their final paths and renamed into place
//! once the mesh and its metadata are both complete, so a failed or
//! interrupted write never leaves a truncated or orphaned file.

use geoalt_terrain::{MeshSink, TerrainError, TerrainSurface};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Write `surface` as a Wavefront OBJ with quad faces.
///
/// Vertices are written in the local metric frame with Z up. Properties are
/// written as header comments.
pub fn write_obj<W: Write>(out: &mut W, surface: &TerrainSurface) -> std::io::Result<()> {
    writeln!(out, "# Terrain surface generated by geoalt")?;
    writeln!(out, "# Generated at: {}", chrono::Utc::now().to_rfc3339())?;
    writeln!(out, "# Local frame: metres, origin at (midlat, midlon), Z up")?;
    for (key, value) in surface.properties() {
        writeln!(out, "# {}: {}", key, value)?;
    }
    writeln!(out)?;

    writeln!(out, "o {}", surface.name)?;
    for [x, y, z] in &surface.mesh.vertices {
        writeln!(out, "v {:.4} {:.4} {:.4}", x, y, z)?;
    }

    writeln!(out, "s {}", if surface.smooth { "1" } else { "off" })?;
    for face in &surface.mesh.faces {
        // OBJ indices are 1-based
        writeln!(
            out,
            "f {} {} {} {}",
            face[0] + 1,
            face[1] + 1,
            face[2] + 1,
            face[3] + 1
        )?;
    }
    Ok(())
}

/// JSON sidecar describing a surface.
#[derive(Debug, Serialize)]
struct SurfaceMetadata {
    generated_at: String,
    vertices: usize,
    faces: usize,
    elevation_min: f64,
    elevation_max: f64,
    properties: serde_json::Map<String, serde_json::Value>,
}

/// Write the surface's properties as pretty JSON.
pub fn write_metadata<W: Write>(out: &mut W, surface: &TerrainSurface) -> serde_json::Result<()> {
    let mut properties = serde_json::Map::new();
    for (key, value) in surface.properties() {
        properties.insert(key.to_string(), serde_json::to_value(value)?);
    }
    let (elevation_min, elevation_max) = surface.mesh.elevation_range();

    let metadata = SurfaceMetadata {
        generated_at: chrono::Utc::now().to_rfc3339(),
        vertices: surface.mesh.vertices.len(),
        faces: surface.mesh.faces.len(),
        elevation_min,
        elevation_max,
        properties,
    };
    serde_json::to_writer_pretty(&mut *out, &metadata)?;
    writeln!(out).map_err(serde_json::Error::io)
}

/// Sink writing an OBJ file and, optionally, a JSON sidecar.
#[derive(Debug, Clone)]
pub struct FileSink {
    /// OBJ output path.
    obj_path: PathBuf,
    /// Optional metadata path.
    metadata_path: Option<PathBuf>,
}

impl FileSink {
    /// Create a sink for the given paths.
    pub fn new(obj_path: impl Into<PathBuf>, metadata_path: Option<PathBuf>) -> Self {
        Self {
            obj_path: obj_path.into(),
            metadata_path,
        }
    }

    /// OBJ output path.
    pub fn obj_path(&self) -> &Path {
        &self.obj_path
    }

    /// Remove any `.part` files and, if given, an already renamed mesh.
    fn discard(&self, placed_obj: bool) {
        let _ = std::fs::remove_file(partial_path(&self.obj_path));
        if let Some(path) = &self.metadata_path {
            let _ = std::fs::remove_file(partial_path(path));
        }
        if placed_obj {
            let _ = std::fs::remove_file(&self.obj_path);
        }
    }
}

/// `<path>.part`, where a file is written before being renamed into place.
fn partial_path(path: &Path) -> PathBuf {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    PathBuf::from(partial)
}

/// Write to `<path>.part` and return that path. Nothing is left behind on error.
fn write_partial<F>(path: &Path, write: F) -> std::io::Result<PathBuf>
where
    F: FnOnce(&mut BufWriter<std::fs::File>) -> std::io::Result<()>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let partial = partial_path(path);
    let result = (|| {
        let mut out = BufWriter::new(std::fs::File::create(&partial)?);
        write(&mut out)?;
        out.flush()
    })();

    match result {
        Ok(()) => Ok(partial),
        Err(e) => {
            let _ = std::fs::remove_file(&partial);
            Err(e)
        }
    }
}

impl MeshSink for FileSink {
    /// Both files are written in full before either is renamed into place.
    /// If anything fails, neither file is left at its final path.
    fn emit(&mut self, surface: &TerrainSurface) -> geoalt_terrain::Result<()> {
        let sink_error = |path: &Path, e: &dyn std::fmt::Display| {
            TerrainError::Sink(format!("{}: {}", path.display(), e))
        };

        let obj_part = write_partial(&self.obj_path, |out| write_obj(out, surface))
            .map_err(|e| sink_error(&self.obj_path, &e))?;

        let metadata_part = match &self.metadata_path {
            Some(path) => {
                let written = write_partial(path, |out| {
                    write_metadata(out, surface).map_err(std::io::Error::from)
                });
                match written {
                    Ok(part) => Some((part, path.clone())),
                    Err(e) => {
                        self.discard(false);
                        return Err(sink_error(path, &e));
                    }
                }
            }
            None => None,
        };

        if let Err(e) = std::fs::rename(&obj_part, &self.obj_path) {
            self.discard(false);
            return Err(sink_error(&self.obj_path, &e));
        }

        if let Some((part, path)) = metadata_part {
            if let Err(e) = std::fs::rename(&part, &path) {
                self.discard(true);
                return Err(sink_error(&path, &e));
            }
            info!("Wrote metadata to {}", path.display());
        }

        info!("Wrote surface '{}' to {}", surface.name, self.obj_path.display());
        Ok(())
    }
}
