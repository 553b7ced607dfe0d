use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// CPU mirror of the `CubeParams` std140 block declared in `compile.rs`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct CubeUniforms {
    pub mvp: [[f32; 4]; 4],
    pub i_resolution: [f32; 3],
    pub i_time: f32,
    pub i_mouse: [f32; 4],
    pub i_time_delta: f32,
    pub i_frame: i32,
    pub padding0: [f32; 2],
}

impl CubeUniforms {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            mvp: Mat4::IDENTITY.to_cols_array_2d(),
            i_resolution: [width as f32, height as f32, 1.0],
            i_time: 0.0,
            i_mouse: [0.0; 4],
            i_time_delta: 0.0,
            i_frame: 0,
            padding0: [0.0; 2],
        }
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.i_resolution = [width.max(1) as f32, height.max(1) as f32, 1.0];
    }

    pub fn set_mvp(&mut self, mvp: Mat4) {
        self.mvp = mvp.to_cols_array_2d();
    }

    /// Records one rendered frame at `elapsed` seconds.
    pub fn advance(&mut self, elapsed: f32, delta: f32) {
        self.i_time = elapsed;
        self.i_time_delta = delta;
        self.i_frame = self.i_frame.wrapping_add(1);
    }

    /// Cursor in Shadertoy convention: bottom-left origin, `zw` holds the
    /// position of the last press while the button is down.
    pub fn set_mouse(&mut self, position: Option<(f32, f32)>, pressed: Option<(f32, f32)>) {
        let height = self.i_resolution[1];
        if let Some((x, y)) = position {
            self.i_mouse[0] = x;
            self.i_mouse[1] = height - y;
        }
        match pressed {
            Some((x, y)) => {
                self.i_mouse[2] = x;
                self.i_mouse[3] = height - y;
            }
            None => {
                self.i_mouse[2] = 0.0;
                self.i_mouse[3] = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(uniforms: &CubeUniforms) -> &[f32] {
        bytemuck::cast_slice(bytemuck::bytes_of(uniforms))
    }

    #[test]
    fn layout_matches_std140_block() {
        assert_eq!(std::mem::size_of::<CubeUniforms>(), 112);
        let mut uniforms = CubeUniforms::new(800, 600);
        uniforms.advance(2.5, 0.016);
        let data = floats(&uniforms);
        // mat4 occupies floats 0..16, vec3 + float share the next 16 bytes.
        assert_eq!(&data[16..19], &[800.0, 600.0, 1.0]);
        assert_eq!(data[19], 2.5);
        assert_eq!(data[24], 0.016);
    }

    #[test]
    fn advance_counts_frames() {
        let mut uniforms = CubeUniforms::new(1, 1);
        uniforms.advance(0.1, 0.1);
        uniforms.advance(0.2, 0.1);
        assert_eq!(uniforms.i_frame, 2);
        assert_eq!(uniforms.i_time, 0.2);
    }

    #[test]
    fn mouse_uses_bottom_left_origin() {
        let mut uniforms = CubeUniforms::new(100, 50);
        uniforms.set_mouse(Some((10.0, 5.0)), Some((20.0, 10.0)));
        assert_eq!(uniforms.i_mouse, [10.0, 45.0, 20.0, 40.0]);
        uniforms.set_mouse(None, None);
        assert_eq!(uniforms.i_mouse, [10.0, 45.0, 0.0, 0.0]);
    }

    #[test]
    fn resolution_never_zero() {
        let mut uniforms = CubeUniforms::new(10, 10);
        uniforms.set_resolution(0, 0);
        assert_eq!(uniforms.i_resolution, [1.0, 1.0, 1.0]);
    }
}
