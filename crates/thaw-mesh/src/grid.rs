//! Finite-volume grid derived from the graded edges.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thaw_core::errors::{ErrorInfo, ThawError};
use thaw_core::io::write_f64_file;

use crate::edges::{generate_mesh, MeshParams};

/// Cell geometry consumed by the solver.
///
/// Edges run bottom-first, from `-depth` up to the surface at `0`, so index
/// zero is the deepest cell. Edge-indexed arrays (`delze`, `vefac`, `gefac`)
/// have one more entry than there are cells; the boundary entries of the two
/// factor arrays are NaN because no neighbouring cell exists there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    ze: Vec<f64>,
    zc: Vec<f64>,
    delz: Vec<f64>,
    delze: Vec<f64>,
    vefac: Vec<f64>,
    gefac: Vec<f64>,
}

impl Grid {
    /// Generates edges for `params` and derives the cell arrays.
    pub fn new(params: &MeshParams) -> Result<Self, ThawError> {
        let mut edges = generate_mesh(
            params.depth,
            params.initial_spacing,
            params.growth_factor,
            params.max_spacing,
        )?;
        edges.reverse();
        Self::from_edges(edges)
    }

    /// Derives the cell arrays from strictly ascending edges.
    pub fn from_edges(ze: Vec<f64>) -> Result<Self, ThawError> {
        if ze.len() < 2 {
            return Err(ThawError::Config(
                ErrorInfo::new("grid_edges", "a grid needs at least two edges")
                    .with_context("edges", ze.len().to_string()),
            ));
        }
        if let Some(pos) = ze.iter().position(|z| !z.is_finite()) {
            return Err(ThawError::Config(
                ErrorInfo::new("grid_edges", "edges must be finite")
                    .with_context("index", pos.to_string()),
            ));
        }
        if let Some(pos) = ze.windows(2).position(|pair| pair[1] <= pair[0]) {
            return Err(ThawError::Config(
                ErrorInfo::new("grid_order", "edges must be strictly ascending")
                    .with_context("index", (pos + 1).to_string()),
            ));
        }
        let n = ze.len() - 1;

        let zc: Vec<f64> = ze.windows(2).map(|w| w[1] / 2.0 + w[0] / 2.0).collect();
        let delz: Vec<f64> = ze.windows(2).map(|w| w[1] - w[0]).collect();

        let mut delze = Vec::with_capacity(n + 1);
        delze.push(delz[0]);
        delze.extend_from_slice(&delz[1..]);
        delze.push(delz[n - 1]);

        let mut vefac = Vec::with_capacity(n + 1);
        let mut gefac = Vec::with_capacity(n + 1);
        vefac.push(f64::NAN);
        gefac.push(f64::NAN);
        for i in 1..n {
            let span = zc[i] - zc[i - 1];
            vefac.push((ze[i] - zc[i - 1]) / span);
            gefac.push(1.0 / span);
        }
        vefac.push(f64::NAN);
        gefac.push(f64::NAN);

        Ok(Self {
            ze,
            zc,
            delz,
            delze,
            vefac,
            gefac,
        })
    }

    /// Number of cells.
    pub fn n(&self) -> usize {
        self.zc.len()
    }

    /// Bottom edge coordinate, i.e. `-depth`.
    pub fn depth(&self) -> f64 {
        self.ze[0]
    }

    /// Cell edge coordinates.
    pub fn ze(&self) -> &[f64] {
        &self.ze
    }

    /// Cell centre coordinates.
    pub fn zc(&self) -> &[f64] {
        &self.zc
    }

    /// Cell widths.
    pub fn delz(&self) -> &[f64] {
        &self.delz
    }

    /// Widths seen by each edge, used for stable step estimates.
    pub fn delze(&self) -> &[f64] {
        &self.delze
    }

    /// Interpolation weights for edge values between adjacent centres.
    pub fn vefac(&self) -> &[f64] {
        &self.vefac
    }

    /// Inverse centre spacing for edge gradients.
    pub fn gefac(&self) -> &[f64] {
        &self.gefac
    }

    /// Writes every grid array into `dir` as raw `f64` files.
    pub fn save(&self, dir: &Path) -> Result<(), ThawError> {
        fs::create_dir_all(dir).map_err(|err| ThawError::io("grid_out_dir", dir, err))?;
        for (name, values) in self.arrays() {
            write_f64_file(&dir.join(name), values)?;
        }
        tracing::info!(cells = self.n(), dir = %dir.display(), "grid saved");
        Ok(())
    }

    fn arrays(&self) -> [(&'static str, &[f64]); 6] {
        [
            ("zc", self.zc.as_slice()),
            ("ze", self.ze.as_slice()),
            ("delz", self.delz.as_slice()),
            ("delze", self.delze.as_slice()),
            ("vefac", self.vefac.as_slice()),
            ("gefac", self.gefac.as_slice()),
        ]
    }
}
