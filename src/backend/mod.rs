use glam::{Mat4, UVec2, Vec4};

use crate::{buffer::VertexArray, errors::Result, handle::HandleId, shader::ShaderError};

pub mod headless;
#[cfg(feature = "sdl")]
pub mod sdl;

pub use headless::{HeadlessBackend, RecordedDraw, Recording};

/// One indexed draw of triangles
#[derive(Debug)]
pub struct DrawCall<'a> {
    pub program: HandleId,
    pub texture: HandleId,
    pub texture_unit: u32,
    pub vertex_array: &'a VertexArray,
    pub index_buffer: HandleId,
    pub index_count: u32,
}

/// Graphics capabilities the engine consumes.
///
/// Objects are created under ids handed out by the [`Renderer`](crate::renderer::Renderer)
/// and released through [`Backend::release`] once their last handle is gone.
pub trait Backend {
    /// Upload pixels, rows ordered bottom to top
    fn create_texture(&mut self, id: HandleId, pixels: &[u8], size: UVec2, channels: u8);
    fn create_program(
        &mut self,
        id: HandleId,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<(), ShaderError>;
    fn set_uniform_i32(&mut self, program: HandleId, name: &str, value: i32) -> Result<()>;
    fn set_uniform_mat4(&mut self, program: HandleId, name: &str, value: &Mat4) -> Result<()>;
    fn create_vertex_buffer(&mut self, id: HandleId, data: &[f32]);
    fn update_vertex_buffer(&mut self, id: HandleId, data: &[f32]);
    fn create_index_buffer(&mut self, id: HandleId, indices: &[u32]);
    fn draw_indexed(&mut self, call: &DrawCall);
    fn release(&mut self, id: HandleId);
    fn set_clear_color(&mut self, color: Vec4);
    fn clear(&mut self);
    fn set_viewport(&mut self, offset: UVec2, size: UVec2);
    fn present(&mut self);
    fn renderer_name(&self) -> String;
    fn version(&self) -> String;
}
