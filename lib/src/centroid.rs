use glam::DVec2;
use serde::Serialize;
use tracing::debug;

use crate::layer::Sample;

/// Extrusion-weighted center of mass of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
    pub total_weight: f64,
    pub weighted_samples: usize,
}

impl Centroid {
    pub fn position(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

/// Weighted average of sample positions, using each sample's extrusion delta
/// as its weight. Samples with a non-positive delta (travel, retract) carry no
/// material and are left out.
///
/// Returns `None` when no sample deposited anything.
pub fn centroid(samples: &[Sample]) -> Option<Centroid> {
    let mut total_weight = 0.0;
    let mut weighted = DVec2::ZERO;
    let mut weighted_samples = 0;

    for s in samples.iter().filter(|s| s.extrusion_delta > 0.0) {
        total_weight += s.extrusion_delta;
        weighted += s.position() * s.extrusion_delta;
        weighted_samples += 1;
    }

    if weighted_samples == 0 || total_weight == 0.0 {
        debug!(samples = samples.len(), "no extruding samples");
        return None;
    }

    let com = weighted / total_weight;
    debug!(x = com.x, y = com.y, total_weight, weighted_samples, "centroid");
    Some(Centroid {
        x: com.x,
        y: com.y,
        total_weight,
        weighted_samples,
    })
}
