//! WGSL shader sources for the wgpu backend.
//!
//! One module, two entry points (`drawbox`, `drawgrid`). Samples are bytes
//! packed into 32-bit words: the input is read with shifts, the output is
//! assembled with `atomicOr` into a buffer the host clears before dispatch.

#![allow(dead_code)] // Used by the wgpu backend and the layout test

/// Entry point names, in [`KernelKind`](crate::KernelKind) order.
pub const ENTRY_POINTS: [&str; 2] = ["drawbox", "drawgrid"];

/// Box and grid overlay kernels.
pub const DRAW_KERNELS: &str = r#"
struct DrawParams {
    have_alpha: i32,
    invert_color: i32,
    thickness: i32,
    width: i32,
    height: i32,
    cw: i32,
    ch: i32,
    hsub: i32,
    vsub: i32,
    rx: i32,
    ry: i32,
    rw: i32,
    rh: i32,
    _pad0: i32,
    _pad1: i32,
    _pad2: i32,
}

@group(0) @binding(0) var<storage, read> src: array<u32>;
@group(0) @binding(1) var<storage, read_write> dst: array<atomic<u32>>;
@group(0) @binding(2) var<storage, read> yuv: array<u32>;
@group(0) @binding(3) var<uniform> p: DrawParams;

fn load_sample(index: u32) -> i32 {
    return i32((src[index >> 2u] >> ((index & 3u) * 8u)) & 0xffu);
}

fn store_sample(index: u32, value: i32) {
    atomicOr(&dst[index >> 2u], (u32(value) & 0xffu) << ((index & 3u) * 8u));
}

fn color_channel(channel: u32) -> i32 {
    return i32((yuv[0] >> (channel * 8u)) & 0xffu);
}

fn blend(s: i32, c: i32, a: i32) -> i32 {
    return (s * (255 - a) + c * a + 127) / 255;
}

// Last pixel of the chroma block in raster order, clamped to the frame.
fn owns_chroma(x: i32, y: i32) -> bool {
    let hs = u32(p.hsub);
    let vs = u32(p.vsub);
    let last_x = min(((x >> hs) + 1) << hs, p.width) - 1;
    let last_y = min(((y >> vs) + 1) << vs, p.height) - 1;
    return x == last_x && y == last_y;
}

fn box_contains(x: i32, y: i32) -> bool {
    let t = p.thickness;
    return y > p.ry && y < p.ry + p.rh && x > p.rx && x < p.rx + p.rw &&
        (y - p.ry < t || p.ry + p.rh - 1 - y < t ||
         x - p.rx < t || p.rx + p.rw - 1 - x < t);
}

fn grid_contains(x: i32, y: i32) -> bool {
    var mx = (x - p.rx) % p.rw;
    var my = (y - p.ry) % p.rh;
    if mx < 0 { mx += p.rw; }
    if my < 0 { my += p.rh; }
    return mx < p.thickness || my < p.thickness;
}

fn shade(x: i32, y: i32, marked: bool) {
    let w = u32(p.width);
    let plane = w * u32(p.height);
    let chroma_plane = u32(p.cw) * u32(p.ch);
    let u_offset = plane;
    let v_offset = u_offset + chroma_plane;
    let a_offset = v_offset + chroma_plane;

    let luma_pos = u32(x) + u32(y) * w;
    let chroma_pos = u32(x >> u32(p.hsub)) + u32(y >> u32(p.vsub)) * u32(p.cw);
    let has_alpha = p.have_alpha != 0;

    var out_y = load_sample(luma_pos);
    var out_u = load_sample(u_offset + chroma_pos);
    var out_v = load_sample(v_offset + chroma_pos);
    var out_a = 0;
    if has_alpha {
        out_a = load_sample(a_offset + luma_pos);
    }

    if marked {
        if p.invert_color != 0 {
            out_y = 255 - out_y;
        } else if has_alpha {
            out_y = color_channel(0u);
            out_u = color_channel(1u);
            out_v = color_channel(2u);
            out_a = color_channel(3u);
        } else {
            let a = color_channel(3u);
            out_y = blend(out_y, color_channel(0u), a);
            out_u = blend(out_u, color_channel(1u), a);
            out_v = blend(out_v, color_channel(2u), a);
        }
    }

    store_sample(luma_pos, out_y);
    if owns_chroma(x, y) {
        store_sample(u_offset + chroma_pos, out_u);
        store_sample(v_offset + chroma_pos, out_v);
    }
    if has_alpha {
        store_sample(a_offset + luma_pos, out_a);
    }
}

@compute @workgroup_size(16, 16)
fn drawbox(@builtin(global_invocation_id) id: vec3<u32>) {
    if id.x >= u32(p.width) || id.y >= u32(p.height) { return; }
    let x = i32(id.x);
    let y = i32(id.y);
    shade(x, y, box_contains(x, y));
}

@compute @workgroup_size(16, 16)
fn drawgrid(@builtin(global_invocation_id) id: vec3<u32>) {
    if id.x >= u32(p.width) || id.y >= u32(p.height) { return; }
    let x = i32(id.x);
    let y = i32(id.y);
    shade(x, y, grid_contains(x, y));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_points_declared() {
        for name in ENTRY_POINTS {
            assert!(DRAW_KERNELS.contains(&format!("fn {name}(")), "missing {name}");
        }
    }

    #[test]
    fn test_workgroup_matches_tile() {
        let tile = crate::dispatch::TILE_SIZE;
        let attr = format!("@workgroup_size({tile}, {tile})");
        assert_eq!(DRAW_KERNELS.matches(&attr).count(), ENTRY_POINTS.len());
    }
}
