//! Local coordinate frames introduced by `*SYSTEM`.

use nalgebra::{Matrix3, Vector3};

use crate::error::{ConvertError, Result};
use crate::numfmt::format_g;

/// Orthonormal right-handed frame anchored at `origin`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateFrame {
    pub origin: Vector3<f64>,
    /// Local x, y and z axes as columns, in global coordinates.
    pub axes: Matrix3<f64>,
    points: u8,
}

impl Default for CoordinateFrame {
    fn default() -> Self {
        Self {
            origin: Vector3::zeros(),
            axes: Matrix3::identity(),
            points: 0,
        }
    }
}

impl CoordinateFrame {
    /// True once an origin has been supplied.
    pub fn is_active(&self) -> bool {
        self.points > 0
    }

    /// Feeds one `*SYSTEM` data line.
    ///
    /// The first line carries the origin and optionally a point on the local
    /// x axis; the second line a point in the local x-y plane. Further lines
    /// are ignored.
    pub fn accept(&mut self, values: &[f64]) -> Result<()> {
        match self.points {
            0 => {
                if values.len() < 3 {
                    return Err(ConvertError::structural(
                        "*SYSTEM needs at least an origin (3 values)",
                    ));
                }
                self.origin = Vector3::new(values[0], values[1], values[2]);
                if values.len() >= 6 {
                    let x = (Vector3::new(values[3], values[4], values[5]) - self.origin)
                        .try_normalize(f64::EPSILON)
                        .ok_or_else(|| degenerate("x axis point coincides with origin"))?;
                    let y = Vector3::new(-x.y, x.x, 0.0)
                        .try_normalize(f64::EPSILON)
                        .unwrap_or(Vector3::y());
                    let y = (y - x * y.dot(&x))
                        .try_normalize(f64::EPSILON)
                        .unwrap_or(Vector3::y());
                    self.axes = Matrix3::from_columns(&[x, y, x.cross(&y)]);
                }
                self.points = 1;
            }
            1 => {
                if values.len() < 3 {
                    return Err(ConvertError::structural(
                        "*SYSTEM second line needs 3 values",
                    ));
                }
                let x: Vector3<f64> = self.axes.column(0).into_owned();
                let raw = Vector3::new(values[0], values[1], values[2]) - self.origin;
                let y = (raw - x * raw.dot(&x))
                    .try_normalize(f64::EPSILON)
                    .ok_or_else(|| degenerate("x-y plane point lies on the x axis"))?;
                let z = x
                    .cross(&y)
                    .try_normalize(f64::EPSILON)
                    .ok_or_else(|| degenerate("local axes are parallel"))?;
                self.axes = Matrix3::from_columns(&[x, y, z]);
                self.points = 2;
            }
            _ => {}
        }
        Ok(())
    }

    pub fn to_global(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.origin + self.axes * local
    }
}

fn degenerate(reason: &str) -> ConvertError {
    ConvertError::structural(format!("degenerate *SYSTEM: {reason}"))
}

/// Field widths used when a node line is rewritten in global coordinates.
///
/// Taken from the raw widths of the first data line of a `*NODE` block so
/// that rewritten lines keep the layout of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLineFormat {
    pub id_width: usize,
    pub coord_width: usize,
}

impl NodeLineFormat {
    pub fn from_raw(line: &str) -> Self {
        let mut fields = line.split(',');
        let id_width = fields.next().map_or(0, str::len);
        let coord_width = fields.next().map_or(0, str::len);
        Self {
            id_width,
            coord_width,
        }
    }

    pub fn render(&self, id: u64, coords: &Vector3<f64>) -> String {
        let mut out = format!("{id:>width$}", width = self.id_width);
        for &c in coords.iter() {
            out.push(',');
            out.push_str(&format_g(c, self.coord_width, 8, false));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_orthonormal(frame: &CoordinateFrame) {
        let a = frame.axes;
        assert_relative_eq!(a.transpose() * a, Matrix3::identity(), epsilon = 1e-12);
        let x: Vector3<f64> = a.column(0).into_owned();
        let y: Vector3<f64> = a.column(1).into_owned();
        assert_relative_eq!(x.cross(&y), a.column(2).into_owned(), epsilon = 1e-12);
    }

    #[test]
    fn inactive_until_origin_given() {
        let mut frame = CoordinateFrame::default();
        assert!(!frame.is_active());
        frame.accept(&[1.0, 2.0, 3.0]).expect("origin");
        assert!(frame.is_active());
        assert_eq!(frame.to_global(&Vector3::x()), Vector3::new(2.0, 2.0, 3.0));
    }

    #[test]
    fn two_point_frame_rotates_about_z() {
        let mut frame = CoordinateFrame::default();
        frame.accept(&[0.0, 0.0, 0.0, 0.0, 1.0, 0.0]).expect("line 1");
        assert_orthonormal(&frame);
        assert_relative_eq!(frame.to_global(&Vector3::x()), Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(frame.to_global(&Vector3::y()), -Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn x_axis_along_z_falls_back_to_global_y() {
        let mut frame = CoordinateFrame::default();
        frame.accept(&[0.0, 0.0, 0.0, 0.0, 0.0, 2.0]).expect("line 1");
        assert_orthonormal(&frame);
        assert_eq!(frame.axes.column(1).into_owned(), Vector3::y());
    }

    #[test]
    fn three_point_frame_is_orthonormal() {
        let mut frame = CoordinateFrame::default();
        frame.accept(&[1.0, -2.0, 0.5, 3.0, 1.0, 2.0]).expect("line 1");
        frame.accept(&[-1.0, 4.0, 0.0]).expect("line 2");
        assert_orthonormal(&frame);
        assert_relative_eq!(frame.to_global(&Vector3::zeros()), frame.origin);
    }

    #[test]
    fn three_point_frame_maps_local_points() {
        // local x along global +Y, local y along global -X
        let mut frame = CoordinateFrame::default();
        frame.accept(&[1.0, 2.0, 3.0, 1.0, 5.0, 3.0]).expect("line 1");
        frame.accept(&[0.0, 2.0, 3.0]).expect("line 2");
        assert_relative_eq!(
            frame.to_global(&Vector3::new(1.0, 2.0, 3.0)),
            Vector3::new(-1.0, 3.0, 6.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            frame.to_global(&Vector3::new(0.0, 0.0, -1.0)),
            Vector3::new(1.0, 2.0, 2.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn rejects_collinear_plane_point() {
        let mut frame = CoordinateFrame::default();
        frame.accept(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]).expect("line 1");
        assert!(frame.accept(&[5.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn node_format_follows_raw_widths() {
        let fmt = NodeLineFormat::from_raw("     12,  1.0000,  2.0, 3.0");
        assert_eq!(fmt.id_width, 7);
        assert_eq!(fmt.coord_width, 8);
        assert_eq!(
            fmt.render(12, &Vector3::new(1.5, 0.0, -2.0)),
            "     12,     1.5,       0,      -2"
        );
    }
}
