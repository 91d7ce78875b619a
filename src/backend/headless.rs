//! Backend without a window. It keeps every object on the CPU and records
//! the draw calls, which makes frames inspectable in tests and tools.

use std::{cell::RefCell, rc::Rc};

use glam::{Mat4, UVec2, Vec4};
use hashbrown::{HashMap, HashSet};

use super::{Backend, DrawCall};
use crate::{
    errors::{Error, Result},
    handle::HandleId,
    shader::{inspect_program, ShaderError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    pub size: UVec2,
    pub channels: u8,
}

#[derive(Debug, Default)]
pub struct ProgramInfo {
    pub uniforms: HashSet<String>,
    pub mat4: HashMap<String, Mat4>,
    pub ints: HashMap<String, i32>,
}

/// Snapshot of one draw call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub program: HandleId,
    pub texture: HandleId,
    /// Value of the `modelMat` uniform at draw time
    pub model: Option<Mat4>,
    /// Attribute 0
    pub positions: Vec<f32>,
    /// Attribute 1
    pub uvs: Vec<f32>,
    pub indices: Vec<u32>,
}

#[derive(Debug, Default)]
pub struct Recording {
    pub textures: HashMap<HandleId, TextureInfo>,
    pub programs: HashMap<HandleId, ProgramInfo>,
    pub vertex_buffers: HashMap<HandleId, Vec<f32>>,
    pub index_buffers: HashMap<HandleId, Vec<u32>>,
    /// Number of vertex buffer updates after creation
    pub buffer_updates: usize,
    pub draws: Vec<RecordedDraw>,
    pub released: Vec<HandleId>,
    pub clear_color: Vec4,
    pub clears: usize,
    pub presents: usize,
    pub viewport: (UVec2, UVec2),
}

impl Recording {
    /// Objects created and not released yet
    pub fn live_objects(&self) -> usize {
        self.textures.len()
            + self.programs.len()
            + self.vertex_buffers.len()
            + self.index_buffers.len()
    }

    pub fn last_draw(&self) -> Option<&RecordedDraw> {
        self.draws.last()
    }
}

/// Recording backend. Clones share the same [`Recording`].
#[derive(Debug, Default, Clone)]
pub struct HeadlessBackend {
    recording: Rc<RefCell<Recording>>,
}

impl HeadlessBackend {
    pub fn recording(&self) -> Rc<RefCell<Recording>> {
        self.recording.clone()
    }
}

impl Backend for HeadlessBackend {
    fn create_texture(&mut self, id: HandleId, pixels: &[u8], size: UVec2, channels: u8) {
        let expected = (size.x * size.y) as usize * channels as usize;
        if pixels.len() != expected {
            log::warn!(
                "Texture {id} has {} bytes, expected {expected}",
                pixels.len()
            );
        }
        self.recording
            .borrow_mut()
            .textures
            .insert(id, TextureInfo { size, channels });
    }

    fn create_program(
        &mut self,
        id: HandleId,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<(), ShaderError> {
        let uniforms = inspect_program(vertex_source, fragment_source)?;
        self.recording.borrow_mut().programs.insert(
            id,
            ProgramInfo {
                uniforms,
                ..Default::default()
            },
        );
        Ok(())
    }

    fn set_uniform_i32(&mut self, program: HandleId, name: &str, value: i32) -> Result<()> {
        let mut recording = self.recording.borrow_mut();
        match recording.programs.get_mut(&program) {
            Some(info) if info.uniforms.contains(name) => {
                info.ints.insert(name.to_string(), value);
                Ok(())
            }
            _ => Err(Error::UniformNotFound(name.to_string())),
        }
    }

    fn set_uniform_mat4(&mut self, program: HandleId, name: &str, value: &Mat4) -> Result<()> {
        let mut recording = self.recording.borrow_mut();
        match recording.programs.get_mut(&program) {
            Some(info) if info.uniforms.contains(name) => {
                info.mat4.insert(name.to_string(), *value);
                Ok(())
            }
            _ => Err(Error::UniformNotFound(name.to_string())),
        }
    }

    fn create_vertex_buffer(&mut self, id: HandleId, data: &[f32]) {
        self.recording
            .borrow_mut()
            .vertex_buffers
            .insert(id, data.to_vec());
    }

    fn update_vertex_buffer(&mut self, id: HandleId, data: &[f32]) {
        let mut recording = self.recording.borrow_mut();
        let Some(buffer) = recording.vertex_buffers.get_mut(&id) else {
            log::warn!("Update of unknown vertex buffer {id}");
            return;
        };
        buffer.clear();
        buffer.extend_from_slice(data);
        recording.buffer_updates += 1;
    }

    fn create_index_buffer(&mut self, id: HandleId, indices: &[u32]) {
        self.recording
            .borrow_mut()
            .index_buffers
            .insert(id, indices.to_vec());
    }

    fn draw_indexed(&mut self, call: &DrawCall) {
        let mut recording = self.recording.borrow_mut();
        if !recording.textures.contains_key(&call.texture) {
            log::warn!("Draw with unknown texture {}", call.texture);
        }
        let attribute = |index: u32| {
            call.vertex_array
                .attribute(index)
                .and_then(|a| recording.vertex_buffers.get(&a.buffer))
                .cloned()
                .unwrap_or_default()
        };
        let positions = attribute(0);
        let uvs = attribute(1);
        let indices = recording
            .index_buffers
            .get(&call.index_buffer)
            .map(|indices| {
                indices
                    .iter()
                    .take(call.index_count as usize)
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        let model = recording
            .programs
            .get(&call.program)
            .and_then(|p| p.mat4.get("modelMat"))
            .copied();
        recording.draws.push(RecordedDraw {
            program: call.program,
            texture: call.texture,
            model,
            positions,
            uvs,
            indices,
        });
    }

    fn release(&mut self, id: HandleId) {
        let mut recording = self.recording.borrow_mut();
        let removed = recording.textures.remove(&id).is_some()
            || recording.programs.remove(&id).is_some()
            || recording.vertex_buffers.remove(&id).is_some()
            || recording.index_buffers.remove(&id).is_some();
        if removed {
            recording.released.push(id);
        }
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.recording.borrow_mut().clear_color = color;
    }

    fn clear(&mut self) {
        self.recording.borrow_mut().clears += 1;
    }

    fn set_viewport(&mut self, offset: UVec2, size: UVec2) {
        self.recording.borrow_mut().viewport = (offset, size);
    }

    fn present(&mut self) {
        self.recording.borrow_mut().presents += 1;
    }

    fn renderer_name(&self) -> String {
        "headless".to_string()
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}
