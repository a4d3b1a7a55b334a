//! # Batch Math
//!
//! Branchless `f32` kernels over contiguous ranges.
//!
//! Each kernel splits its input at the last multiple of [`LANES`]: the body
//! runs 8 lanes at a time, the tail runs through [`scalar`]. Both paths use
//! the same operation order with separate multiply and add (no fused
//! multiply-add), so every element is bit-identical whichever path computed
//! it.
//!
//! All kernels take slices; lengths must match or the call panics, the same
//! contract as `copy_from_slice`.

mod lanes;
pub mod scalar;

/// Number of `f32` lanes processed per batched step.
pub const LANES: usize = 8;

#[inline]
fn body_len(n: usize) -> usize {
    n - n % LANES
}

/// Euler step: `pos[i] += vel[i] * dt` for every `i`.
///
/// # Panics
///
/// Panics if `pos` and `vel` differ in length.
pub fn integrate(pos: &mut [f32], vel: &[f32], dt: f32) {
    assert_eq!(pos.len(), vel.len(), "integrate: pos/vel length mismatch");
    let split = body_len(pos.len());
    let (pos_body, pos_tail) = pos.split_at_mut(split);
    let (vel_body, vel_tail) = vel.split_at(split);

    lanes::integrate(
        bytemuck::cast_slice_mut(pos_body),
        bytemuck::cast_slice(vel_body),
        dt,
    );
    scalar::integrate(pos_tail, vel_tail, dt);
}

/// Elementwise sum: `out[i] = a[i] + b[i]`.
///
/// # Panics
///
/// Panics if the three slices differ in length.
pub fn add(a: &[f32], b: &[f32], out: &mut [f32]) {
    assert_eq!(a.len(), b.len(), "add: input length mismatch");
    assert_eq!(a.len(), out.len(), "add: output length mismatch");
    let split = body_len(a.len());
    let (out_body, out_tail) = out.split_at_mut(split);

    lanes::add(
        bytemuck::cast_slice(&a[..split]),
        bytemuck::cast_slice(&b[..split]),
        bytemuck::cast_slice_mut(out_body),
    );
    scalar::add(&a[split..], &b[split..], out_tail);
}

/// Scales every element: `out[i] = a[i] * s`.
///
/// # Panics
///
/// Panics if `a` and `out` differ in length.
pub fn mul_scalar(a: &[f32], s: f32, out: &mut [f32]) {
    assert_eq!(a.len(), out.len(), "mul_scalar: output length mismatch");
    let split = body_len(a.len());
    let (out_body, out_tail) = out.split_at_mut(split);

    lanes::mul_scalar(
        bytemuck::cast_slice(&a[..split]),
        s,
        bytemuck::cast_slice_mut(out_body),
    );
    scalar::mul_scalar(&a[split..], s, out_tail);
}

/// Counts points inside their paired circle:
/// `(px[i]-cx[i])^2 + (py[i]-cy[i])^2 <= r_sq[i]`.
///
/// Comparisons involving NaN count as misses on both paths.
///
/// # Panics
///
/// Panics if the five slices differ in length.
#[must_use]
pub fn count_within_radius(px: &[f32], py: &[f32], cx: &[f32], cy: &[f32], r_sq: &[f32]) -> usize {
    let n = px.len();
    assert!(
        py.len() == n && cx.len() == n && cy.len() == n && r_sq.len() == n,
        "count_within_radius: length mismatch"
    );
    let split = body_len(n);

    lanes::count_within_radius(
        bytemuck::cast_slice(&px[..split]),
        bytemuck::cast_slice(&py[..split]),
        bytemuck::cast_slice(&cx[..split]),
        bytemuck::cast_slice(&cy[..split]),
        bytemuck::cast_slice(&r_sq[..split]),
    ) + scalar::count_within_radius(
        &px[split..],
        &py[split..],
        &cx[split..],
        &cy[split..],
        &r_sq[split..],
    )
}
