//! The finished surface and the seam to whatever consumes it.

use crate::geo::{BoundingBox, ProjectionFrame};
use crate::mesh::TerrainMesh;
use crate::planner::GridPlan;
use crate::Result;
use serde::Serialize;

/// Value of a named surface property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Floating point value.
    Float(f64),
    /// Integer value.
    Int(i64),
    /// Text value.
    Text(String),
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Float(v) => write!(f, "{}", v),
            PropertyValue::Int(v) => write!(f, "{}", v),
            PropertyValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// A complete terrain surface, ready to hand to a [`MeshSink`].
#[derive(Debug, Clone)]
pub struct TerrainSurface {
    /// Object name.
    pub name: String,
    /// Whether faces should be shaded smooth.
    pub smooth: bool,
    /// Sampled area.
    pub bbox: BoundingBox,
    /// Projection used for the vertices.
    pub frame: ProjectionFrame,
    /// Grid dimensions and realized spacing.
    pub plan: GridPlan,
    /// Geometry and accuracy.
    pub mesh: TerrainMesh,
}

impl TerrainSurface {
    /// Descriptive properties for the created object, in a stable order.
    pub fn properties(&self) -> Vec<(&'static str, PropertyValue)> {
        use PropertyValue::{Float, Int, Text};

        vec![
            ("name", Text(self.name.clone())),
            ("west", Float(self.bbox.west)),
            ("east", Float(self.bbox.east)),
            ("north", Float(self.bbox.north)),
            ("south", Float(self.bbox.south)),
            ("midlat", Float(self.frame.mid_lat)),
            ("midlon", Float(self.frame.mid_lon)),
            ("nw_elevation", Float(self.mesh.nw_elevation())),
            ("rows", Int(self.plan.rows as i64)),
            ("cols", Int(self.plan.cols as i64)),
            ("requests", Int(self.plan.rows as i64)),
            ("spacing_x_m", Float(self.plan.spacing_x)),
            ("spacing_y_m", Float(self.plan.spacing_y)),
            ("accuracy_min", Float(self.mesh.accuracy.min)),
            ("accuracy_max", Float(self.mesh.accuracy.max)),
            ("accuracy_mean", Float(self.mesh.accuracy.mean)),
        ]
    }
}

/// Consumer of finished surfaces (a file writer, a scene, ...).
///
/// A sink is only ever handed a complete surface.
pub trait MeshSink {
    /// Create an object from `surface`.
    fn emit(&mut self, surface: &TerrainSurface) -> Result<()>;
}

/// Sink that keeps surfaces in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    /// Surfaces received so far.
    pub surfaces: Vec<TerrainSurface>,
}

impl MeshSink for CollectingSink {
    fn emit(&mut self, surface: &TerrainSurface) -> Result<()> {
        self.surfaces.push(surface.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::AccuracySummary;
    use crate::planner::{plan_grid, Resolution};

    fn surface() -> TerrainSurface {
        let bbox = BoundingBox::preset("la-revellata").unwrap();
        let plan = plan_grid(&bbox, Resolution::Steps(2)).unwrap();
        TerrainSurface {
            name: "land".to_string(),
            smooth: true,
            bbox,
            frame: ProjectionFrame::from_bbox(&bbox),
            plan,
            mesh: TerrainMesh {
                vertices: vec![[0.0, 0.0, 87.5], [1.0, 0.0, 1.0], [0.0, 1.0, 2.0], [1.0, 1.0, 3.0]],
                faces: vec![[0, 2, 3, 1]],
                accuracy: AccuracySummary {
                    min: 1.0,
                    max: 4.0,
                    mean: 2.5,
                },
                rows: 2,
                cols: 2,
            },
        }
    }

    #[test]
    fn test_properties() {
        let props = surface().properties();
        let get = |key: &str| props.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone());

        assert_eq!(props[0].0, "name");
        assert_eq!(get("west"), Some(PropertyValue::Float(8.720999)));
        assert_eq!(get("nw_elevation"), Some(PropertyValue::Float(87.5)));
        assert_eq!(get("rows"), Some(PropertyValue::Int(2)));
        assert_eq!(get("accuracy_mean"), Some(PropertyValue::Float(2.5)));
        assert_eq!(get("name").unwrap().to_string(), "land");
    }

    #[test]
    fn test_collecting_sink() {
        let mut sink = CollectingSink::default();
        sink.emit(&surface()).unwrap();
        assert_eq!(sink.surfaces.len(), 1);
        assert_eq!(sink.surfaces[0].mesh.faces.len(), 1);
    }
}
