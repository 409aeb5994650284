//! Static vertex data for the segmented spectrum ring.
//!
//! Every quad of every segment is emitted as two triangles. Vertices carry
//! indices and angles only; the vertex shader resolves radii and amplitude
//! from uniforms, so the mesh is built once per bin count.

use bytemuck::{Pod, Zeroable};

/// Vertices per segment quad (two triangles)
pub const CORNERS_PER_SEGMENT: usize = 6;

/// Vertex of the radial bar mesh
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct BarVertex {
    /// [wedge index, segment index, corner index]
    pub indices: [f32; 3],
    /// [start angle, end angle] of the wedge after the gap is removed
    pub angles: [f32; 2],
}

/// Flattened mesh ready for upload
#[derive(Debug, Clone, Default)]
pub struct SegmentedBarMesh {
    pub vertices: Vec<BarVertex>,
}

impl SegmentedBarMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Index triples flattened for a 3-component attribute
    pub fn index_attribute(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|v| v.indices).collect()
    }

    /// Angle pairs flattened for a 2-component attribute
    pub fn angle_attribute(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|v| v.angles).collect()
    }
}

/// Build `divisions` wedges of `segments` quads each.
///
/// Wedges advance clockwise (negative angles) starting at 0. `gap_percent`
/// trims that fraction of the wedge angle off both edges.
pub fn generate_segmented_bar_mesh(
    divisions: usize,
    gap_percent: f32,
    segments: usize,
) -> SegmentedBarMesh {
    if divisions == 0 || segments == 0 {
        return SegmentedBarMesh::default();
    }

    let increment = -std::f32::consts::TAU / divisions as f32;
    let offset = increment * gap_percent;

    let mut vertices = Vec::with_capacity(divisions * segments * CORNERS_PER_SEGMENT);
    for wedge in 0..divisions {
        let angles = [
            increment * wedge as f32 + offset,
            increment * (wedge + 1) as f32 - offset,
        ];
        for segment in 0..segments {
            for corner in 0..CORNERS_PER_SEGMENT {
                vertices.push(BarVertex {
                    indices: [wedge as f32, segment as f32, corner as f32],
                    angles,
                });
            }
        }
    }

    SegmentedBarMesh { vertices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_count() {
        let mesh = generate_segmented_bar_mesh(95, 0.1, 28);
        assert_eq!(mesh.vertex_count(), 95 * 28 * CORNERS_PER_SEGMENT);
        assert_eq!(mesh.index_attribute().len(), mesh.vertex_count() * 3);
        assert_eq!(mesh.angle_attribute().len(), mesh.vertex_count() * 2);
    }

    #[test]
    fn test_indices_in_range() {
        let mesh = generate_segmented_bar_mesh(12, 0.1, 5);
        for v in &mesh.vertices {
            assert!(v.indices[0] < 12.0);
            assert!(v.indices[1] < 5.0);
            assert!(v.indices[2] < CORNERS_PER_SEGMENT as f32);
        }
    }

    #[test]
    fn test_wedge_angles_leave_gaps() {
        let mesh = generate_segmented_bar_mesh(4, 0.1, 1);
        let first = mesh.vertices[0].angles;
        let quarter = -std::f32::consts::FRAC_PI_2;
        assert!((first[0] - quarter * 0.1).abs() < 1e-6);
        assert!((first[1] - quarter * 0.9).abs() < 1e-6);
        // Clockwise
        assert!(first[1] < first[0]);
    }

    #[test]
    fn test_deterministic() {
        let a = generate_segmented_bar_mesh(30, 0.25, 7);
        let b = generate_segmented_bar_mesh(30, 0.25, 7);
        assert_eq!(a.vertices, b.vertices);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(generate_segmented_bar_mesh(0, 0.1, 28).vertex_count(), 0);
        assert_eq!(generate_segmented_bar_mesh(10, 0.1, 0).vertex_count(), 0);
    }
}
