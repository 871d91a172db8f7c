//! Geometrically graded cell edges.

use serde::{Deserialize, Serialize};
use thaw_core::errors::{ErrorInfo, ThawError};
use thaw_core::settings::GridSettings;

/// Upper bound on the number of edges a single mesh may contain.
pub const MAX_EDGES: usize = 10_000_000;

/// Parameters controlling edge generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshParams {
    /// Total domain depth.
    pub depth: f64,
    /// Width of the first (surface) cell before rescaling.
    pub initial_spacing: f64,
    /// Multiplicative growth between successive cells.
    pub growth_factor: f64,
    /// Cap on any raw cell width.
    pub max_spacing: f64,
}

impl MeshParams {
    /// Bundles the four generation parameters.
    pub fn new(depth: f64, initial_spacing: f64, growth_factor: f64, max_spacing: f64) -> Self {
        Self {
            depth,
            initial_spacing,
            growth_factor,
            max_spacing,
        }
    }

    /// Rejects parameters that cannot produce a finite, monotonic mesh.
    pub fn validate(&self) -> Result<(), ThawError> {
        check_positive("mesh_depth", "depth", self.depth)?;
        check_positive("mesh_initial_spacing", "initial_spacing", self.initial_spacing)?;
        check_positive("mesh_max_spacing", "max_spacing", self.max_spacing)?;
        if !self.growth_factor.is_finite() || self.growth_factor < 1.0 {
            return Err(ThawError::Config(
                ErrorInfo::new("mesh_growth_factor", "growth factor must be at least 1")
                    .with_context("growth_factor", self.growth_factor.to_string()),
            ));
        }
        if self.max_spacing < self.initial_spacing {
            return Err(ThawError::Config(
                ErrorInfo::new("mesh_spacing_cap", "max spacing is below the initial spacing")
                    .with_context("initial_spacing", self.initial_spacing.to_string())
                    .with_context("max_spacing", self.max_spacing.to_string()),
            ));
        }
        // Growth stops at the cap, so the cap bounds the edge count from below.
        let lower_bound = (self.depth / self.max_spacing).ceil();
        if lower_bound >= MAX_EDGES as f64 {
            return Err(ThawError::Config(
                ErrorInfo::new("mesh_too_fine", "mesh would exceed the edge limit")
                    .with_context("depth", self.depth.to_string())
                    .with_context("max_spacing", self.max_spacing.to_string())
                    .with_hint("raise max_spacing or reduce depth"),
            ));
        }
        Ok(())
    }
}

impl From<&GridSettings> for MeshParams {
    fn from(grid: &GridSettings) -> Self {
        MeshParams::new(grid.depth, grid.delz0, grid.delzfrac, grid.delzmax)
    }
}

fn check_positive(code: &str, name: &str, value: f64) -> Result<(), ThawError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ThawError::Config(
            ErrorInfo::new(code, format!("{name} must be positive and finite"))
                .with_context(name, value.to_string()),
        ))
    }
}

/// Grows edges from the surface until they reach `depth`, before rescaling.
///
/// The returned coordinates are positive-down and start `[0, initial_spacing]`.
/// The last edge is the first one at or beyond `depth`.
pub fn raw_edges(params: &MeshParams) -> Result<Vec<f64>, ThawError> {
    params.validate()?;
    let mut edges = vec![0.0, params.initial_spacing];
    let mut spacing = params.initial_spacing;
    let mut frontier = params.initial_spacing;
    while frontier < params.depth {
        spacing = (spacing * params.growth_factor).min(params.max_spacing);
        let next = frontier + spacing;
        if next <= frontier {
            // spacing vanished against the frontier's magnitude
            return Err(ThawError::Config(
                ErrorInfo::new("mesh_stalled", "edge frontier stopped advancing")
                    .with_context("frontier", frontier.to_string())
                    .with_context("spacing", spacing.to_string()),
            ));
        }
        if edges.len() >= MAX_EDGES {
            return Err(ThawError::Config(
                ErrorInfo::new("mesh_too_fine", "mesh would exceed the edge limit")
                    .with_context("edges", edges.len().to_string()),
            ));
        }
        edges.push(next);
        frontier = next;
    }
    Ok(edges)
}

/// Generates cell edges from the surface (`0`) down to `-depth`.
///
/// Edges grow geometrically by `growth_factor` from `initial_spacing` until
/// capped at `max_spacing`, then the whole sequence is rescaled so the bottom
/// edge lands exactly on `depth`. The output is strictly decreasing.
pub fn generate_mesh(
    depth: f64,
    initial_spacing: f64,
    growth_factor: f64,
    max_spacing: f64,
) -> Result<Vec<f64>, ThawError> {
    let params = MeshParams::new(depth, initial_spacing, growth_factor, max_spacing);
    let mut edges = raw_edges(&params)?;
    let last = edges.len() - 1;
    let scale = params.depth / edges[last];
    for edge in edges.iter_mut() {
        *edge = -(*edge * scale);
    }
    edges[0] = 0.0;
    edges[last] = -params.depth;
    tracing::debug!(
        edges = edges.len(),
        scale,
        depth = params.depth,
        "generated mesh"
    );
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_mesh_when_growth_is_one() {
        let edges = generate_mesh(1.0, 0.25, 1.0, 0.25).unwrap();
        assert_eq!(edges, vec![0.0, -0.25, -0.5, -0.75, -1.0]);
    }

    #[test]
    fn spacing_wider_than_depth_keeps_endpoints() {
        let edges = generate_mesh(1.0, 3.0, 1.5, 4.0).unwrap();
        assert_eq!(edges, vec![0.0, -1.0]);
    }

    #[test]
    fn shrinking_growth_is_rejected() {
        let err = generate_mesh(1.0, 0.1, 0.9, 0.2).unwrap_err();
        assert_eq!(err.info().code, "mesh_growth_factor");
    }

    #[test]
    fn nan_depth_is_rejected() {
        let err = generate_mesh(f64::NAN, 0.1, 1.1, 0.2).unwrap_err();
        assert_eq!(err.info().code, "mesh_depth");
    }
}
