use glam::{UVec2, Vec4};

use crate::{
    backend::{Backend, DrawCall},
    buffer::{IndexBuffer, VertexArray},
    handle::{Handle, HandleAllocator},
    shader::ShaderProgram,
};

/// Render context, owns the backend and the ids of every GPU object.
///
/// Everything holding a [`Handle`] must be dropped (and [`Renderer::collect_garbage`]
/// called) before the renderer itself goes away.
pub struct Renderer {
    backend: Box<dyn Backend>,
    handles: HandleAllocator,
    draw_calls: u32,
    frames: u64,
}

impl Renderer {
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            handles: HandleAllocator::default(),
            draw_calls: 0,
            frames: 0,
        }
    }

    pub(crate) fn alloc_handle(&mut self) -> Handle {
        self.handles.alloc()
    }

    pub fn backend_mut(&mut self) -> &mut dyn Backend {
        self.backend.as_mut()
    }

    /// Upload a texture, rows ordered bottom to top
    pub fn create_texture(&mut self, pixels: &[u8], size: UVec2, channels: u8) -> Handle {
        let handle = self.alloc_handle();
        self.backend
            .create_texture(handle.id(), pixels, size, channels);
        handle
    }

    /// Draw indexed triangles with the given program and texture on unit 0
    pub fn draw(
        &mut self,
        vertex_array: &VertexArray,
        index_buffer: &IndexBuffer,
        program: &ShaderProgram,
        texture: &Handle,
    ) {
        self.draw_calls += 1;
        self.backend.draw_indexed(&DrawCall {
            program: program.id(),
            texture: texture.id(),
            texture_unit: 0,
            vertex_array,
            index_buffer: index_buffer.id(),
            index_count: index_buffer.count(),
        });
    }

    pub fn set_clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.backend.set_clear_color(Vec4::new(r, g, b, a));
    }

    /// Clear the frame and reset the per frame counters
    pub fn clear(&mut self) {
        self.draw_calls = 0;
        self.backend.clear();
    }

    pub fn set_viewport(&mut self, size: UVec2, offset: UVec2) {
        self.backend.set_viewport(offset, size);
    }

    /// Finish the frame and release objects dropped during it
    pub fn present(&mut self) {
        self.backend.present();
        self.frames += 1;
        self.collect_garbage();
    }

    /// Release backend objects whose handles were all dropped.
    /// Returns the number of released objects.
    pub fn collect_garbage(&mut self) -> usize {
        let dropped = self.handles.dropped();
        for id in &dropped {
            self.backend.release(*id);
        }
        if !dropped.is_empty() {
            log::debug!("Released {} backend objects", dropped.len());
        }
        dropped.len()
    }

    pub fn draw_calls(&self) -> u32 {
        self.draw_calls
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn renderer_name(&self) -> String {
        self.backend.renderer_name()
    }

    pub fn version(&self) -> String {
        self.backend.version()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.collect_garbage();
    }
}
