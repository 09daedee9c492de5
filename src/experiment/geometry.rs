use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Shape – sample or container volume, dimensions in cm
// ---------------------------------------------------------------------------

/// Cylindrical volumes understood by the correction backends.
///
/// The axis is vertical and `center` is the centre of the volume in the
/// sample frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum Shape {
    Cylinder {
        height: f64,
        radius: f64,
        #[serde(default)]
        center: [f64; 3],
    },
    HollowCylinder {
        height: f64,
        inner_radius: f64,
        outer_radius: f64,
        #[serde(default)]
        center: [f64; 3],
    },
}

impl Shape {
    /// Check the dimensions are physical. `part` names the volume in errors.
    pub fn validate(&self, part: &'static str) -> Result<()> {
        let invalid = |reason: String| Err(Error::InvalidGeometry { part, reason });

        if !self.center().iter().all(|c| c.is_finite()) {
            return invalid(format!("center {:?} is not finite", self.center()));
        }
        if !(self.height() > 0.0 && self.height().is_finite()) {
            return invalid(format!("height must be positive, got {}", self.height()));
        }

        match *self {
            Shape::Cylinder { radius, .. } => {
                if !(radius > 0.0 && radius.is_finite()) {
                    return invalid(format!("radius must be positive, got {radius}"));
                }
            }
            Shape::HollowCylinder {
                inner_radius,
                outer_radius,
                ..
            } => {
                if !(inner_radius >= 0.0 && inner_radius.is_finite()) {
                    return invalid(format!("inner radius must be non-negative, got {inner_radius}"));
                }
                if !(outer_radius > inner_radius && outer_radius.is_finite()) {
                    return invalid(format!(
                        "outer radius {outer_radius} must exceed inner radius {inner_radius}"
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn height(&self) -> f64 {
        match *self {
            Shape::Cylinder { height, .. } | Shape::HollowCylinder { height, .. } => height,
        }
    }

    pub fn center(&self) -> [f64; 3] {
        match *self {
            Shape::Cylinder { center, .. } | Shape::HollowCylinder { center, .. } => center,
        }
    }

    /// Innermost radius occupied by the volume (0 for a solid cylinder).
    pub fn inner_radius(&self) -> f64 {
        match *self {
            Shape::Cylinder { .. } => 0.0,
            Shape::HollowCylinder { inner_radius, .. } => inner_radius,
        }
    }

    pub fn outer_radius(&self) -> f64 {
        match *self {
            Shape::Cylinder { radius, .. } => radius,
            Shape::HollowCylinder { outer_radius, .. } => outer_radius,
        }
    }

    /// Radial wall thickness in mm, the coarsest useful element size.
    pub fn wall_thickness_mm(&self) -> f64 {
        (self.outer_radius() - self.inner_radius()) * 10.0
    }

    pub fn name(&self) -> &'static str {
        match self {
            Shape::Cylinder { .. } => "Cylinder",
            Shape::HollowCylinder { .. } => "HollowCylinder",
        }
    }
}

/// A container must surround the sample without cutting into it.
pub fn check_containment(sample: &Shape, container: &Shape) -> Result<()> {
    if sample.center() != container.center() {
        return Err(Error::InvalidGeometry {
            part: "container",
            reason: format!(
                "center {:?} differs from sample center {:?}",
                container.center(),
                sample.center()
            ),
        });
    }
    if container.inner_radius() < sample.outer_radius() {
        return Err(Error::InvalidGeometry {
            part: "container",
            reason: format!(
                "inner radius {} cuts into the sample of radius {}",
                container.inner_radius(),
                sample.outer_radius()
            ),
        });
    }
    Ok(())
}
