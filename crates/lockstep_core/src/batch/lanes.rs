//! 8-wide kernels over whole lane groups.
//!
//! Inputs are already split into `[f32; LANES]` groups; the caller handles
//! the remainder with the scalar kernels.

use wide::{f32x8, CmpLe};

use super::LANES;

type Group = [f32; LANES];

#[inline(always)]
fn load(group: &Group) -> f32x8 {
    bytemuck::cast(*group)
}

#[inline(always)]
fn store(value: f32x8) -> Group {
    bytemuck::cast(value)
}

pub(super) fn integrate(pos: &mut [Group], vel: &[Group], dt: f32) {
    let dt = f32x8::splat(dt);
    for (p, v) in pos.iter_mut().zip(vel) {
        *p = store(load(p) + load(v) * dt);
    }
}

pub(super) fn add(a: &[Group], b: &[Group], out: &mut [Group]) {
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = store(load(x) + load(y));
    }
}

pub(super) fn mul_scalar(a: &[Group], s: f32, out: &mut [Group]) {
    let s = f32x8::splat(s);
    for (o, x) in out.iter_mut().zip(a) {
        *o = store(load(x) * s);
    }
}

pub(super) fn count_within_radius(
    px: &[Group],
    py: &[Group],
    cx: &[Group],
    cy: &[Group],
    r_sq: &[Group],
) -> usize {
    let mut count = 0;
    for i in 0..px.len() {
        let dx = load(&px[i]) - load(&cx[i]);
        let dy = load(&py[i]) - load(&cy[i]);
        let inside = (dx * dx + dy * dy).cmp_le(load(&r_sq[i]));
        count += inside.move_mask().count_ones() as usize;
    }
    count
}
