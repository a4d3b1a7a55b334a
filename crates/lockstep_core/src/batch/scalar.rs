//! Scalar reference kernels.
//!
//! These run the remainder that does not fill a full lane group, and serve
//! as the oracle the batched path is checked against. Every expression here
//! must stay in the exact operation order used by [`super::lanes`].

/// `pos[i] += vel[i] * dt`.
#[inline]
pub fn integrate(pos: &mut [f32], vel: &[f32], dt: f32) {
    for (p, v) in pos.iter_mut().zip(vel) {
        *p += *v * dt;
    }
}

/// `out[i] = a[i] + b[i]`.
#[inline]
pub fn add(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = *x + *y;
    }
}

/// `out[i] = a[i] * s`.
#[inline]
pub fn mul_scalar(a: &[f32], s: f32, out: &mut [f32]) {
    for (o, x) in out.iter_mut().zip(a) {
        *o = *x * s;
    }
}

/// Counts `(px-cx)^2 + (py-cy)^2 <= r_sq` without short-circuiting.
#[inline]
#[must_use]
pub fn count_within_radius(px: &[f32], py: &[f32], cx: &[f32], cy: &[f32], r_sq: &[f32]) -> usize {
    let mut count = 0;
    for i in 0..px.len() {
        let dx = px[i] - cx[i];
        let dy = py[i] - cy[i];
        count += usize::from(dx * dx + dy * dy <= r_sq[i]);
    }
    count
}

/// Single point-in-circle test shared by callers that need one answer.
#[inline]
#[must_use]
pub fn point_in_circle(px: f32, py: f32, cx: f32, cy: f32, r_sq: f32) -> bool {
    let dx = px - cx;
    let dy = py - cy;
    dx * dx + dy * dy <= r_sq
}
