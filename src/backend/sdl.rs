//! SDL2 canvas backend. Sprites are textured quads, so every draw call is
//! turned back into one rotated texture copy.

use std::time::Instant;

use anyhow::{anyhow, Result};
use glam::{Mat4, UVec2, Vec2, Vec4};
use hashbrown::{HashMap, HashSet};
use sdl2::{
    event::{Event, WindowEvent},
    keyboard::Scancode,
    pixels::{Color, PixelFormatEnum},
    rect::Rect,
    render::{BlendMode, Canvas, Texture, TextureCreator},
    video::{Window, WindowContext},
};

use super::{Backend, DrawCall};
use crate::{
    app::{frame, shutdown, App},
    errors::{Error, Result as EngineResult},
    game::Game,
    handle::HandleId,
    input::KeyCode,
    renderer::Renderer,
    shader::{inspect_program, ShaderError},
};

#[derive(Default)]
struct ProgramUniforms {
    declared: HashSet<String>,
    mat4: HashMap<String, Mat4>,
}

struct SdlTexture {
    texture: Texture,
    size: UVec2,
}

pub struct SdlBackend {
    canvas: Canvas<Window>,
    texture_creator: TextureCreator<WindowContext>,
    textures: HashMap<HandleId, SdlTexture>,
    programs: HashMap<HandleId, ProgramUniforms>,
    vertex_buffers: HashMap<HandleId, Vec<f32>>,
    viewport: UVec2,
}

impl SdlBackend {
    pub fn new(canvas: Canvas<Window>) -> Self {
        let texture_creator = canvas.texture_creator();
        let viewport = canvas
            .output_size()
            .map(UVec2::from)
            .unwrap_or(UVec2::ONE);
        Self {
            canvas,
            texture_creator,
            textures: Default::default(),
            programs: Default::default(),
            vertex_buffers: Default::default(),
            viewport,
        }
    }

    fn attribute(&self, call: &DrawCall, index: u32) -> Option<&[f32]> {
        let attribute = call.vertex_array.attribute(index)?;
        self.vertex_buffers
            .get(&attribute.buffer)
            .map(Vec::as_slice)
    }

    fn uniform(&self, program: HandleId, name: &str) -> Mat4 {
        self.programs
            .get(&program)
            .and_then(|p| p.mat4.get(name))
            .copied()
            .unwrap_or(Mat4::IDENTITY)
    }
}

/// Bounding box of interleaved 2D points
fn bounds(data: &[f32]) -> Option<(Vec2, Vec2)> {
    let mut points = data.chunks_exact(2).map(|p| Vec2::new(p[0], p[1]));
    let first = points.next()?;
    Some(points.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
}

/// Screen rectangle and clockwise angle in degrees of a transformed quad
fn screen_quad(
    local: (Vec2, Vec2),
    model: Mat4,
    projection: Mat4,
    viewport: UVec2,
) -> (Rect, f64) {
    let (min, max) = local;
    let viewport = viewport.as_vec2();
    let center = model.transform_point3(((min + max) * 0.5).extend(0.0));
    let extent = max - min;
    let world_size = Vec2::new(
        model.x_axis.truncate().length() * extent.x,
        model.y_axis.truncate().length() * extent.y,
    );
    let ndc = projection.project_point3(center);
    let screen_center = Vec2::new(
        (ndc.x + 1.0) * 0.5 * viewport.x,
        (1.0 - ndc.y) * 0.5 * viewport.y,
    );
    let scale = Vec2::new(projection.x_axis.x, projection.y_axis.y).abs() * viewport * 0.5;
    let size = world_size * scale;
    let origin = screen_center - size * 0.5;
    let rect = Rect::new(
        origin.x.round() as i32,
        origin.y.round() as i32,
        size.x.round().max(1.0) as u32,
        size.y.round().max(1.0) as u32,
    );
    let angle = model.x_axis.y.atan2(model.x_axis.x).to_degrees();
    (rect, -angle as f64)
}

/// Texture rectangle of UVs with a bottom-left origin
fn source_rect(uvs: (Vec2, Vec2), size: UVec2) -> Rect {
    let (min, max) = uvs;
    let size = size.as_vec2();
    Rect::new(
        (min.x * size.x).round() as i32,
        ((1.0 - max.y) * size.y).round() as i32,
        ((max.x - min.x) * size.x).round() as u32,
        ((max.y - min.y) * size.y).round() as u32,
    )
}

impl Backend for SdlBackend {
    fn create_texture(&mut self, id: HandleId, pixels: &[u8], size: UVec2, channels: u8) {
        if channels != 4 || size.x == 0 || size.y == 0 {
            log::warn!("Texture {id}: unsupported {size} x {channels} channels");
            return;
        }
        let pitch = size.x as usize * 4;
        // SDL wants the top row first
        let rows: Vec<u8> = pixels
            .chunks_exact(pitch)
            .rev()
            .flatten()
            .copied()
            .collect();
        let mut texture = match self.texture_creator.create_texture_static(
            PixelFormatEnum::RGBA32,
            size.x,
            size.y,
        ) {
            Ok(texture) => texture,
            Err(err) => {
                log::error!("Create texture {id}: {err}");
                return;
            }
        };
        if let Err(err) = texture.update(None, &rows, pitch) {
            log::error!("Upload texture {id}: {err}");
        }
        texture.set_blend_mode(BlendMode::Blend);
        self.textures.insert(id, SdlTexture { texture, size });
    }

    fn create_program(
        &mut self,
        id: HandleId,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<(), ShaderError> {
        let declared = inspect_program(vertex_source, fragment_source)?;
        self.programs.insert(
            id,
            ProgramUniforms {
                declared,
                ..Default::default()
            },
        );
        Ok(())
    }

    fn set_uniform_i32(&mut self, program: HandleId, name: &str, _value: i32) -> EngineResult<()> {
        // one texture unit
        match self.programs.get(&program) {
            Some(p) if p.declared.contains(name) => Ok(()),
            _ => Err(Error::UniformNotFound(name.to_string())),
        }
    }

    fn set_uniform_mat4(
        &mut self,
        program: HandleId,
        name: &str,
        value: &Mat4,
    ) -> EngineResult<()> {
        match self.programs.get_mut(&program) {
            Some(p) if p.declared.contains(name) => {
                p.mat4.insert(name.to_string(), *value);
                Ok(())
            }
            _ => Err(Error::UniformNotFound(name.to_string())),
        }
    }

    fn create_vertex_buffer(&mut self, id: HandleId, data: &[f32]) {
        self.vertex_buffers.insert(id, data.to_vec());
    }

    fn update_vertex_buffer(&mut self, id: HandleId, data: &[f32]) {
        if let Some(buffer) = self.vertex_buffers.get_mut(&id) {
            buffer.clear();
            buffer.extend_from_slice(data);
        }
    }

    // quads are rebuilt from the vertex data
    fn create_index_buffer(&mut self, _id: HandleId, _indices: &[u32]) {}

    fn draw_indexed(&mut self, call: &DrawCall) {
        if call.index_count == 0 {
            return;
        }
        let (Some(local), Some(uvs)) = (
            self.attribute(call, 0).and_then(bounds),
            self.attribute(call, 1).and_then(bounds),
        ) else {
            log::debug!("Draw without vertex data, program {}", call.program);
            return;
        };
        let model = self.uniform(call.program, "modelMat");
        let projection = self.uniform(call.program, "projectionMat");
        let (dst, angle) = screen_quad(local, model, projection, self.viewport);
        let Some(texture) = self.textures.get(&call.texture) else {
            log::debug!("Failed to get texture {}", call.texture);
            return;
        };
        let src = source_rect(uvs, texture.size);
        if let Err(err) = self
            .canvas
            .copy_ex(&texture.texture, src, dst, angle, None, false, false)
        {
            log::error!("SDL copy {err}");
        }
    }

    fn release(&mut self, id: HandleId) {
        if let Some(texture) = self.textures.remove(&id) {
            // SAFETY: the TextureCreator that created the texture outlives it
            unsafe { texture.texture.destroy() };
            return;
        }
        if self.programs.remove(&id).is_none() {
            self.vertex_buffers.remove(&id);
        }
    }

    fn set_clear_color(&mut self, color: Vec4) {
        let [r, g, b, a] = (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0)
            .round()
            .to_array()
            .map(|c| c as u8);
        self.canvas.set_draw_color(Color::RGBA(r, g, b, a));
    }

    fn clear(&mut self) {
        self.canvas.clear();
    }

    fn set_viewport(&mut self, offset: UVec2, size: UVec2) {
        self.viewport = size.max(UVec2::ONE);
        self.canvas.set_viewport(Rect::new(
            offset.x as i32,
            offset.y as i32,
            self.viewport.x,
            self.viewport.y,
        ));
    }

    fn present(&mut self) {
        self.canvas.present();
    }

    fn renderer_name(&self) -> String {
        self.canvas.info().name.to_string()
    }

    fn version(&self) -> String {
        sdl2::version::version().to_string()
    }
}

fn key_code(scancode: Scancode) -> KeyCode {
    u8::try_from(scancode as i32)
        .map(KeyCode::from)
        .unwrap_or(KeyCode::Invalid)
}

/// Open a window and drive the game until it is closed
pub(crate) fn run(app: App) -> Result<()> {
    let sdl_ctx = sdl2::init().map_err(|err| anyhow!(err))?;
    let video_subsystem = sdl_ctx.video().map_err(|err| anyhow!(err))?;
    let window = video_subsystem
        .window(&app.title, app.window.x, app.window.y)
        .position_centered()
        .resizable()
        .build()
        .map_err(|err| anyhow!(err))?;
    let canvas = {
        let mut builder = window.into_canvas().accelerated();
        if app.vsync {
            builder = builder.present_vsync();
        }
        builder.build().map_err(|err| anyhow!(err))?
    };

    let mut renderer = Renderer::new(SdlBackend::new(canvas));
    log::info!("Renderer: {}", renderer.renderer_name());
    log::info!("SDL version: {}", renderer.version());
    renderer.set_clear_color(0.0, 0.0, 0.0, 1.0);

    let mut resources = app.resource_manager();
    let mut game = Game::new(app.window);
    game.init(&mut resources, &mut renderer)?;
    game.resize(&mut renderer, app.window);

    let mut event_pump = sdl_ctx.event_pump().map_err(|err| anyhow!(err))?;
    let mut last_time = Instant::now();
    'running: loop {
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    scancode: Some(Scancode::Escape),
                    ..
                } => break 'running,
                Event::KeyDown {
                    scancode: Some(scancode),
                    repeat: false,
                    ..
                } => game.set_key(key_code(scancode), true),
                Event::KeyUp {
                    scancode: Some(scancode),
                    ..
                } => game.set_key(key_code(scancode), false),
                Event::Window {
                    win_event: WindowEvent::SizeChanged(width, height),
                    ..
                } => {
                    let size = UVec2::new(width.max(1) as u32, height.max(1) as u32);
                    game.resize(&mut renderer, size);
                }
                _ => {}
            }
        }
        let now = Instant::now();
        let delta = now.duration_since(last_time).as_nanos() as u64;
        last_time = now;
        frame(&mut game, &mut renderer, delta);
    }

    shutdown(game, resources, &mut renderer);
    Ok(())
}
