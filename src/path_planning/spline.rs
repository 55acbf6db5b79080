// Natural cubic spline interpolation
//
// Coefficients are solved the PythonRobotics way: build the tridiagonal
// system for the second-derivative terms `c` and invert it with nalgebra.
// Boundary conditions are natural (zero curvature at both ends).

extern crate nalgebra as na;

use crate::common::{RoboticsError, RoboticsResult};

#[derive(Debug, Clone)]
pub struct Spline {
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
    x: Vec<f64>,
}

impl Spline {
    /// Fit a spline through `(x[i], y[i])`. `x` must be strictly increasing.
    pub fn new(x: &[f64], y: &[f64]) -> RoboticsResult<Spline> {
        let nx = x.len();
        if nx != y.len() {
            return Err(RoboticsError::InvalidParameter(format!(
                "spline knots: {} x values but {} y values",
                nx,
                y.len()
            )));
        }
        if nx < 2 {
            return Err(RoboticsError::NumericalError(
                "spline needs at least 2 knots".to_string(),
            ));
        }
        if x.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(RoboticsError::NumericalError(
                "spline knots must be strictly increasing in x".to_string(),
            ));
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let a = y.to_vec();
        let a_mat = Spline::calc_a(&h);
        let b_mat = Spline::calc_b(&h, &a);

        let c_na = a_mat
            .try_inverse()
            .map(|inv| inv * b_mat)
            .ok_or_else(|| RoboticsError::NumericalError("singular spline system".to_string()))?;
        let c: Vec<f64> = c_na.iter().copied().collect();

        let mut b: Vec<f64> = Vec::with_capacity(nx - 1);
        let mut d: Vec<f64> = Vec::with_capacity(nx - 1);
        for i in 0..nx - 1 {
            d.push((c[i + 1] - c[i]) / (3. * h[i]));
            b.push((a[i + 1] - a[i]) / h[i] - h[i] * (c[i + 1] + 2.0 * c[i]) / 3.0);
        }

        Ok(Spline { a, b, c, d, x: x.to_vec() })
    }

    /// Value at `t`. Outside the knot range the end polynomials are extended.
    pub fn calc(&self, t: f64) -> f64 {
        let i = self.search_index(t);
        let dx = t - self.x[i];
        self.a[i] + self.b[i] * dx + self.c[i] * dx.powi(2) + self.d[i] * dx.powi(3)
    }

    /// First derivative at `t`
    #[cfg(test)]
    fn calcd(&self, t: f64) -> f64 {
        let i = self.search_index(t);
        let dx = t - self.x[i];
        self.b[i] + 2. * self.c[i] * dx + 3. * self.d[i] * dx.powi(2)
    }

    /// Second derivative at `t`
    #[cfg(test)]
    fn calcdd(&self, t: f64) -> f64 {
        let i = self.search_index(t);
        let dx = t - self.x[i];
        2. * self.c[i] + 6. * self.d[i] * dx
    }

    fn search_index(&self, t: f64) -> usize {
        // index of the segment [x[i], x[i+1]) containing t, clamped to valid segments
        let i = self.x.partition_point(|&xi| xi <= t);
        i.saturating_sub(1).min(self.x.len() - 2)
    }

    fn calc_a(h: &[f64]) -> na::DMatrix<f64> {
        let nx = h.len() + 1;
        let mut a = na::DMatrix::zeros(nx, nx);
        a[(0, 0)] = 1.;
        for i in 0..nx - 1 {
            if i != nx - 2 {
                a[(i + 1, i + 1)] = 2.0 * (h[i] + h[i + 1]);
            }
            a[(i + 1, i)] = h[i];
            a[(i, i + 1)] = h[i];
        }
        a[(0, 1)] = 0.;
        a[(nx - 1, nx - 2)] = 0.;
        a[(nx - 1, nx - 1)] = 1.;
        a
    }

    fn calc_b(h: &[f64], a: &[f64]) -> na::DVector<f64> {
        let nx = h.len() + 1;
        let mut b = na::DVector::zeros(nx);
        for i in 0..nx.saturating_sub(2) {
            b[i + 1] = 3.0 * (a[i + 2] - a[i + 1]) / h[i + 1] - 3.0 * (a[i + 1] - a[i]) / h[i];
        }
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_through_knots() {
        let x = [-1.0, 0.0, 30.0, 60.0, 90.0];
        let y = [0.0, 0.0, 4.0, 4.0, 4.0];
        let sp = Spline::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert!((sp.calc(*xi) - yi).abs() < 1e-9);
        }
    }

    #[test]
    fn test_two_knots_is_linear() {
        let sp = Spline::new(&[0.0, 10.0], &[0.0, 5.0]).unwrap();
        assert!((sp.calc(4.0) - 2.0).abs() < 1e-9);
        assert!((sp.calcd(7.0) - 0.5).abs() < 1e-9);
        assert!(sp.calcdd(3.0).abs() < 1e-9);
    }

    #[test]
    fn test_natural_boundary() {
        let sp = Spline::new(&[0.0, 1.0, 2.0, 3.0], &[0.0, 1.0, 0.0, 1.0]).unwrap();
        assert!(sp.calcdd(0.0).abs() < 1e-9);
        assert!(sp.calcdd(3.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_derivative_continuous() {
        let sp = Spline::new(&[0.0, 1.0, 2.5, 4.0], &[0.0, 2.0, 1.0, 3.0]).unwrap();
        let eps = 1e-7;
        for knot in [1.0, 2.5] {
            let left = sp.calcd(knot - eps);
            let right = sp.calcd(knot + eps);
            assert!((left - right).abs() < 1e-5);
        }
    }

    #[test]
    fn test_rejects_bad_knots() {
        assert!(Spline::new(&[0.0], &[1.0]).is_err());
        assert!(Spline::new(&[0.0, 0.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
        assert!(Spline::new(&[0.0, 2.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
        assert!(Spline::new(&[0.0, 1.0], &[1.0]).is_err());
    }
}
