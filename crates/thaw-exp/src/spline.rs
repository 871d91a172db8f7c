use serde::{Deserialize, Serialize};
use thaw_core::errors::{ErrorInfo, ThawError};

const MAX_BISECTIONS: usize = 200;

/// Sign change of the interpolant at a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossing {
    /// Negative before the root, positive after.
    Rising,
    /// Positive before the root, negative after.
    Falling,
    /// The interpolant touches zero without a detectable slope.
    Touch,
}

/// Zero of a [`CubicSpline`] inside its knot range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Root {
    /// Abscissa of the zero.
    pub x: f64,
    /// Direction of the sign change.
    pub direction: Crossing,
}

/// Piecewise cubic interpolant with not-a-knot end conditions.
///
/// Two knots give a straight line and three knots a single parabola; from
/// four knots on the third derivative is continuous across the second and
/// the penultimate knot. Each piece is stored as `[c0, c1, c2, c3]` in powers
/// of the offset from its left knot.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    coeffs: Vec<[f64; 4]>,
}

impl CubicSpline {
    /// Fits the spline through `(x[i], y[i])`.
    ///
    /// `x` must be strictly increasing and both slices finite, of equal length
    /// and at least two samples long.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, ThawError> {
        validate(x, y)?;
        let n = x.len();
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let d: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

        let coeffs = match n {
            2 => vec![[y[0], d[0], 0.0, 0.0]],
            3 => {
                let curvature = (d[1] - d[0]) / (x[2] - x[0]);
                (0..2)
                    .map(|i| {
                        let slope = d[0] + curvature * (2.0 * x[i] - x[0] - x[1]);
                        [y[i], slope, curvature, 0.0]
                    })
                    .collect()
            }
            _ => {
                let m = second_derivatives(&h, &d)?;
                (0..n - 1)
                    .map(|i| {
                        [
                            y[i],
                            d[i] - h[i] * (2.0 * m[i] + m[i + 1]) / 6.0,
                            m[i] / 2.0,
                            (m[i + 1] - m[i]) / (6.0 * h[i]),
                        ]
                    })
                    .collect()
            }
        };

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            coeffs,
        })
    }

    /// Knot abscissae.
    pub fn knots(&self) -> &[f64] {
        &self.x
    }

    /// First and last knot.
    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    /// Evaluates the spline, extending the end pieces outside the knots.
    pub fn eval(&self, at: f64) -> f64 {
        let piece = self.piece_index(at);
        horner(&self.coeffs[piece], at - self.x[piece])
    }

    /// Evaluates the first derivative.
    pub fn derivative(&self, at: f64) -> f64 {
        let piece = self.piece_index(at);
        derivative(&self.coeffs[piece], at - self.x[piece])
    }

    /// All zeros within the knot range, ascending.
    pub fn roots(&self) -> Vec<Root> {
        let last = self.coeffs.len() - 1;
        let mut roots: Vec<Root> = Vec::new();
        for (piece, c) in self.coeffs.iter().enumerate() {
            let width = self.x[piece + 1] - self.x[piece];
            let origin = self.x[piece];
            let emit = |roots: &mut Vec<Root>, t: f64, direction: Crossing| {
                let x = origin + t;
                if roots.last().map_or(true, |prev| prev.x < x) {
                    roots.push(Root { x, direction });
                }
            };

            if c.iter().all(|v| *v == 0.0) {
                emit(&mut roots, 0.0, Crossing::Touch);
                continue;
            }

            // Breakpoints split the piece into monotone runs; the ends use the
            // sampled values so a zero on a shared knot is only seen once.
            let mut points = vec![(0.0, self.y[piece])];
            for t in critical_points(c, width) {
                points.push((t, horner(c, t)));
            }
            points.push((width, self.y[piece + 1]));

            for (k, &(t, value)) in points.iter().enumerate() {
                let is_right_end = k == points.len() - 1;
                if value == 0.0 && (!is_right_end || piece == last) {
                    let before = match k {
                        0 if piece == 0 => None,
                        0 => Some(self.value_before_knot(piece)),
                        _ => Some(points[k - 1].1),
                    };
                    let after = points.get(k + 1).map(|&(_, v)| v);
                    emit(
                        &mut roots,
                        t,
                        crossing_at_zero(before, after, derivative(c, t)),
                    );
                }
                if let Some(&(t_next, v_next)) = points.get(k + 1) {
                    if changes_sign(value, v_next) {
                        let root = bisect(c, t, t_next, value);
                        let direction = if value < 0.0 {
                            Crossing::Rising
                        } else {
                            Crossing::Falling
                        };
                        emit(&mut roots, root, direction);
                    }
                }
            }
        }
        roots
    }

    /// Value at the start of the monotone run that ends on knot `piece`.
    fn value_before_knot(&self, piece: usize) -> f64 {
        let prev = piece - 1;
        let c = &self.coeffs[prev];
        let width = self.x[piece] - self.x[prev];
        match critical_points(c, width).last() {
            Some(t) => horner(c, *t),
            None => self.y[prev],
        }
    }

    fn piece_index(&self, at: f64) -> usize {
        let after = self.x.partition_point(|knot| *knot <= at);
        after.saturating_sub(1).min(self.coeffs.len() - 1)
    }
}

fn validate(x: &[f64], y: &[f64]) -> Result<(), ThawError> {
    if x.len() != y.len() {
        return Err(ThawError::Series(
            ErrorInfo::new("series_length_mismatch", "time and value lengths differ")
                .with_context("time_len", x.len().to_string())
                .with_context("value_len", y.len().to_string()),
        ));
    }
    if x.len() < 2 {
        return Err(ThawError::Series(
            ErrorInfo::new("series_too_short", "interpolation needs at least two samples")
                .with_context("len", x.len().to_string()),
        ));
    }
    if let Some(idx) = x.iter().chain(y).position(|v| !v.is_finite()) {
        return Err(ThawError::Series(
            ErrorInfo::new("series_non_finite", "series contains NaN or infinite samples")
                .with_context("index", (idx % x.len()).to_string()),
        ));
    }
    if let Some(idx) = x.windows(2).position(|w| w[1] <= w[0]) {
        return Err(ThawError::Series(
            ErrorInfo::new("series_not_increasing", "time must be strictly increasing")
                .with_context("index", (idx + 1).to_string()),
        ));
    }
    Ok(())
}

/// Solves for knot second derivatives under not-a-knot conditions.
///
/// The end unknowns are eliminated through the not-a-knot relations, which
/// leaves a diagonally dominant tridiagonal system in the interior ones.
fn second_derivatives(h: &[f64], d: &[f64]) -> Result<Vec<f64>, ThawError> {
    let n = h.len() + 1;
    let size = n - 2;
    let mut sub = vec![0.0; size];
    let mut diag = vec![0.0; size];
    let mut sup = vec![0.0; size];
    let mut rhs = vec![0.0; size];
    for r in 0..size {
        let i = r + 1;
        sub[r] = h[i - 1];
        diag[r] = 2.0 * (h[i - 1] + h[i]);
        sup[r] = h[i];
        rhs[r] = 6.0 * (d[i] - d[i - 1]);
    }

    let (h0, h1) = (h[0], h[1]);
    diag[0] = (h0 + h1) * (h0 + 2.0 * h1) / h1;
    sup[0] = (h1 * h1 - h0 * h0) / h1;
    let (ha, hb) = (h[n - 3], h[n - 2]);
    diag[size - 1] = (hb + ha) * (hb + 2.0 * ha) / ha;
    sub[size - 1] = (ha * ha - hb * hb) / ha;

    let interior = solve_tridiagonal(&sub, &diag, &sup, &rhs)?;

    let mut m = Vec::with_capacity(n);
    m.push(interior[0] + h0 * (interior[0] - interior[1]) / h1);
    m.extend_from_slice(&interior);
    m.push(interior[size - 1] + hb * (interior[size - 1] - interior[size - 2]) / ha);
    Ok(m)
}

fn solve_tridiagonal(
    sub: &[f64],
    diag: &[f64],
    sup: &[f64],
    rhs: &[f64],
) -> Result<Vec<f64>, ThawError> {
    let size = diag.len();
    let mut c_prime = vec![0.0; size];
    let mut d_prime = vec![0.0; size];
    for r in 0..size {
        let (carry_c, carry_d) = if r == 0 {
            (0.0, 0.0)
        } else {
            (c_prime[r - 1], d_prime[r - 1])
        };
        let denom = diag[r] - sub[r] * carry_c;
        if denom == 0.0 || !denom.is_finite() {
            return Err(ThawError::Series(
                ErrorInfo::new("spline_singular", "spline system is singular")
                    .with_context("row", r.to_string()),
            ));
        }
        c_prime[r] = sup[r] / denom;
        d_prime[r] = (rhs[r] - sub[r] * carry_d) / denom;
    }
    let mut out = vec![0.0; size];
    out[size - 1] = d_prime[size - 1];
    for r in (0..size - 1).rev() {
        out[r] = d_prime[r] - c_prime[r] * out[r + 1];
    }
    Ok(out)
}

fn horner(c: &[f64; 4], t: f64) -> f64 {
    ((c[3] * t + c[2]) * t + c[1]) * t + c[0]
}

fn derivative(c: &[f64; 4], t: f64) -> f64 {
    (3.0 * c[3] * t + 2.0 * c[2]) * t + c[1]
}

fn changes_sign(a: f64, b: f64) -> bool {
    a != 0.0 && b != 0.0 && (a < 0.0) != (b < 0.0)
}

/// Direction of a zero sample from the runs on either side of it; the slope
/// decides only at the ends of the knot range.
fn crossing_at_zero(before: Option<f64>, after: Option<f64>, slope: f64) -> Crossing {
    match (before, after) {
        (Some(b), Some(a)) if changes_sign(b, a) => {
            if b < 0.0 {
                Crossing::Rising
            } else {
                Crossing::Falling
            }
        }
        (Some(b), Some(a)) if b != 0.0 && a != 0.0 => Crossing::Touch,
        _ => classify(slope),
    }
}

fn classify(slope: f64) -> Crossing {
    if slope > 0.0 {
        Crossing::Rising
    } else if slope < 0.0 {
        Crossing::Falling
    } else {
        Crossing::Touch
    }
}

/// Zeros of the piece's derivative strictly inside `(0, width)`, ascending.
fn critical_points(c: &[f64; 4], width: f64) -> Vec<f64> {
    let (a, b, k) = (3.0 * c[3], 2.0 * c[2], c[1]);
    let mut out = Vec::with_capacity(2);
    if a == 0.0 {
        if b != 0.0 {
            out.push(-k / b);
        }
    } else {
        let disc = b * b - 4.0 * a * k;
        if disc >= 0.0 {
            let q = -0.5 * (b + b.signum() * disc.sqrt());
            if q == 0.0 {
                out.push(0.0);
            } else {
                out.push(q / a);
                out.push(k / q);
            }
        }
    }
    out.retain(|t| t.is_finite() && *t > 0.0 && *t < width);
    out.sort_by(f64::total_cmp);
    out.dedup();
    out
}

fn bisect(c: &[f64; 4], mut lo: f64, mut hi: f64, mut value_lo: f64) -> f64 {
    for _ in 0..MAX_BISECTIONS {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        let value = horner(c, mid);
        if value == 0.0 {
            return mid;
        }
        if (value < 0.0) == (value_lo < 0.0) {
            lo = mid;
            value_lo = value;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reproduces_samples() {
        let x = [0.0, 1.0, 2.5, 4.0, 4.5, 7.0];
        let y = [1.0, -2.0, 0.5, 3.0, 2.0, -1.0];
        let spline = CubicSpline::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(y) {
            assert!((spline.eval(*xi) - yi).abs() < 1e-12);
        }
    }

    #[test]
    fn cubic_data_is_recovered_exactly() {
        let f = |t: f64| 0.5 * t * t * t - 2.0 * t * t + t - 3.0;
        let x = [0.0, 0.7, 1.1, 2.0, 3.6, 4.0];
        let y: Vec<f64> = x.iter().map(|t| f(*t)).collect();
        let spline = CubicSpline::new(&x, &y).unwrap();
        for t in [0.3, 1.5, 2.9, 3.95] {
            assert!((spline.eval(t) - f(t)).abs() < 1e-9, "t = {t}");
        }
    }

    #[test]
    fn three_knots_give_a_parabola() {
        let spline = CubicSpline::new(&[0.0, 1.0, 3.0], &[0.0, 1.0, 9.0]).unwrap();
        assert!((spline.eval(2.0) - 4.0).abs() < 1e-12);
        assert!((spline.derivative(0.5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_on_a_shared_knot_is_reported_once() {
        let spline = CubicSpline::new(&[0.0, 1.0, 2.0], &[-1.0, 0.0, 1.0]).unwrap();
        let roots = spline.roots();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].x, 1.0);
        assert_eq!(roots[0].direction, Crossing::Rising);
    }

    #[test]
    fn critical_points_stay_inside_the_piece() {
        // derivative 3t^2 - 3 vanishes at t = +/-1
        let points = critical_points(&[0.0, -3.0, 0.0, 1.0], 2.0);
        assert_eq!(points, vec![1.0]);
    }
}
