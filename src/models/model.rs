//! Model evaluation with analytic derivatives.
//!
//! The fitter relies on one primitive operation: evaluate `f(point; p)` and
//! fill `∂f/∂p_j` for every parameter `j`. Derivatives for held parameters are
//! computed too; the estimator simply skips those columns.

use crate::routine::ModelId;

/// Independent-variable coordinates of one data point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Evaluate `model` at `point`, writing parameter derivatives into `derivatives`.
///
/// # Panics
/// Panics if `params` or `derivatives` are shorter than `model.n_parameters()`.
/// The fitter validates both before evaluating.
pub fn evaluate(model: ModelId, params: &[f64], point: Point, derivatives: &mut [f64]) -> f64 {
    match model {
        ModelId::Gauss1d => gauss_1d(params, point.x, derivatives),
        ModelId::Gauss2d => gauss_2d(params, point, derivatives),
        ModelId::Gauss2dElliptic => gauss_2d_elliptic(params, point, derivatives),
        ModelId::Gauss2dRotated => gauss_2d_rotated(params, point, derivatives),
        ModelId::Cauchy2dElliptic => cauchy_2d_elliptic(params, point, derivatives),
        ModelId::Linear1d => linear_1d(params, point.x, derivatives),
    }
}

/// Evaluate `model` at `point` without derivatives.
pub fn predict(model: ModelId, params: &[f64], point: Point) -> f64 {
    let mut scratch = [0.0; 8];
    evaluate(model, params, point, &mut scratch)
}

// p = [amplitude, x0, width, offset]
fn gauss_1d(p: &[f64], x: f64, d: &mut [f64]) -> f64 {
    let (a, x0, s, b) = (p[0], p[1], p[2], p[3]);
    let dx = x - x0;
    let s2 = s * s;
    let e = (-0.5 * dx * dx / s2).exp();

    d[0] = e;
    d[1] = a * e * dx / s2;
    d[2] = a * e * dx * dx / (s2 * s);
    d[3] = 1.0;
    a * e + b
}

// p = [amplitude, x0, y0, width, offset]
fn gauss_2d(p: &[f64], pt: Point, d: &mut [f64]) -> f64 {
    let (a, x0, y0, s, b) = (p[0], p[1], p[2], p[3], p[4]);
    let dx = pt.x - x0;
    let dy = pt.y - y0;
    let s2 = s * s;
    let r2 = dx * dx + dy * dy;
    let e = (-0.5 * r2 / s2).exp();

    d[0] = e;
    d[1] = a * e * dx / s2;
    d[2] = a * e * dy / s2;
    d[3] = a * e * r2 / (s2 * s);
    d[4] = 1.0;
    a * e + b
}

// p = [amplitude, x0, y0, width_x, width_y, offset]
fn gauss_2d_elliptic(p: &[f64], pt: Point, d: &mut [f64]) -> f64 {
    let (a, x0, y0, sx, sy, b) = (p[0], p[1], p[2], p[3], p[4], p[5]);
    let dx = pt.x - x0;
    let dy = pt.y - y0;
    let sx2 = sx * sx;
    let sy2 = sy * sy;
    let e = (-0.5 * (dx * dx / sx2 + dy * dy / sy2)).exp();

    d[0] = e;
    d[1] = a * e * dx / sx2;
    d[2] = a * e * dy / sy2;
    d[3] = a * e * dx * dx / (sx2 * sx);
    d[4] = a * e * dy * dy / (sy2 * sy);
    d[5] = 1.0;
    a * e + b
}

// p = [amplitude, x0, y0, width_x, width_y, offset, rotation]
fn gauss_2d_rotated(p: &[f64], pt: Point, d: &mut [f64]) -> f64 {
    let (a, x0, y0, sx, sy, b, r) = (p[0], p[1], p[2], p[3], p[4], p[5], p[6]);
    let (sin_r, cos_r) = r.sin_cos();
    let dx = pt.x - x0;
    let dy = pt.y - y0;
    // Coordinates in the rotated frame of the ellipse.
    let xr = dx * cos_r - dy * sin_r;
    let yr = dx * sin_r + dy * cos_r;
    let sx2 = sx * sx;
    let sy2 = sy * sy;
    let e = (-0.5 * (xr * xr / sx2 + yr * yr / sy2)).exp();
    let ae = a * e;

    d[0] = e;
    d[1] = ae * (xr * cos_r / sx2 + yr * sin_r / sy2);
    d[2] = ae * (-xr * sin_r / sx2 + yr * cos_r / sy2);
    d[3] = ae * xr * xr / (sx2 * sx);
    d[4] = ae * yr * yr / (sy2 * sy);
    d[5] = 1.0;
    d[6] = ae * xr * yr * (1.0 / sx2 - 1.0 / sy2);
    ae + b
}

// p = [amplitude, x0, y0, width_x, width_y, offset]
fn cauchy_2d_elliptic(p: &[f64], pt: Point, d: &mut [f64]) -> f64 {
    let (a, x0, y0, sx, sy, b) = (p[0], p[1], p[2], p[3], p[4], p[5]);
    let u = (pt.x - x0) / sx;
    let v = (pt.y - y0) / sy;
    let cx = 1.0 / (u * u + 1.0);
    let cy = 1.0 / (v * v + 1.0);

    d[0] = cx * cy;
    d[1] = a * cy * 2.0 * u * cx * cx / sx;
    d[2] = a * cx * 2.0 * v * cy * cy / sy;
    d[3] = a * cy * 2.0 * u * u * cx * cx / sx;
    d[4] = a * cx * 2.0 * v * v * cy * cy / sy;
    d[5] = 1.0;
    a * cx * cy + b
}

// p = [offset, slope]
fn linear_1d(p: &[f64], x: f64, d: &mut [f64]) -> f64 {
    d[0] = 1.0;
    d[1] = x;
    p[0] + p[1] * x
}
