use lib_layercom::glam::DVec2;
use lib_layercom::render::PathBounds;

/// Maps layer coordinates onto a drawing surface with the same scale on both
/// axes. Surface coordinates grow rightward and downward.
///
/// `cell_aspect` is the height of one surface unit relative to its width:
/// 1.0 for pixels, about 2.0 for terminal character cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    center: DVec2,
    scale: f64,
    physical: DVec2,
    cell_aspect: f64,
}

impl Viewport {
    pub fn fit(bounds: &PathBounds, surface: DVec2, margin: f64, cell_aspect: f64) -> Self {
        let physical = DVec2::new(surface.x, surface.y * cell_aspect);
        let usable = (physical - DVec2::splat(2.0 * margin)).max(DVec2::ONE);
        let span = bounds.size();

        let fit = |room: f64, span: f64| {
            if span > 0.0 {
                room / span
            } else {
                f64::INFINITY
            }
        };
        let scale = fit(usable.x, span.x).min(fit(usable.y, span.y));

        Viewport {
            center: bounds.center(),
            // A single point, or several at the same spot.
            scale: if scale.is_finite() { scale } else { 1.0 },
            physical,
            cell_aspect,
        }
    }

    pub fn project(&self, p: DVec2) -> DVec2 {
        let q = self.physical * 0.5 + (p - self.center) * self.scale;
        DVec2::new(q.x, (self.physical.y - q.y) / self.cell_aspect)
    }

    /// Layer-space extents of the whole surface, margins included.
    pub fn visible(&self) -> PathBounds {
        let half = self.physical * 0.5 / self.scale;
        PathBounds {
            min: self.center - half,
            max: self.center + half,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> PathBounds {
        PathBounds {
            min: DVec2::new(0.0, 0.0),
            max: DVec2::new(10.0, 10.0),
        }
    }

    #[test]
    fn fits_inside_margins_with_y_flipped() {
        let vp = Viewport::fit(&square(), DVec2::new(120.0, 120.0), 10.0, 1.0);
        assert_eq!(vp.scale, 10.0);
        assert_eq!(vp.project(DVec2::new(0.0, 0.0)), DVec2::new(10.0, 110.0));
        assert_eq!(vp.project(DVec2::new(10.0, 10.0)), DVec2::new(110.0, 10.0));
    }

    #[test]
    fn keeps_axes_equal_on_wide_surface() {
        let vp = Viewport::fit(&square(), DVec2::new(220.0, 120.0), 10.0, 1.0);
        assert_eq!(vp.scale, 10.0);
        // Centered horizontally.
        assert_eq!(vp.project(DVec2::new(0.0, 0.0)), DVec2::new(60.0, 110.0));
        assert_eq!(vp.project(DVec2::new(10.0, 10.0)), DVec2::new(160.0, 10.0));
    }

    #[test]
    fn accounts_for_tall_cells() {
        // 40 cells wide, 20 rows of height 2: physically 40x40.
        let vp = Viewport::fit(&square(), DVec2::new(40.0, 20.0), 0.0, 2.0);
        assert_eq!(vp.scale, 4.0);
        assert_eq!(vp.project(DVec2::new(0.0, 0.0)), DVec2::new(0.0, 20.0));
        assert_eq!(vp.project(DVec2::new(10.0, 10.0)), DVec2::new(40.0, 0.0));
    }

    #[test]
    fn single_point_lands_in_the_middle() {
        let p = DVec2::new(3.0, -4.0);
        let bounds = PathBounds { min: p, max: p };
        let vp = Viewport::fit(&bounds, DVec2::new(100.0, 50.0), 5.0, 1.0);
        assert_eq!(vp.project(p), DVec2::new(50.0, 25.0));
    }

    #[test]
    fn visible_area_includes_margins() {
        let vp = Viewport::fit(&square(), DVec2::new(120.0, 120.0), 10.0, 1.0);
        let visible = vp.visible();
        assert_eq!(visible.min, DVec2::new(-1.0, -1.0));
        assert_eq!(visible.max, DVec2::new(11.0, 11.0));
    }
}
