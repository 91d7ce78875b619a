use core::fmt;
use std::{fmt::Debug, rc::Rc};

use glam::{Mat4, Vec2};

use crate::{
    atlas::{SubTexture, TextureAtlas},
    buffer::{IndexBuffer, VertexArray, VertexBuffer, VertexBufferLayout},
    errors::{AssetKind, Error, Result},
    renderer::Renderer,
    shader::ShaderProgram,
};

/// Unit square
///
/// ```text
/// 1---2
/// | / |
/// 0---3
/// ```
pub const QUAD_VERTICES: [f32; 8] = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0];
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Uniform receiving the model matrix
pub const MODEL_UNIFORM: &str = "modelMat";

/// Something the game loop can draw and advance
pub trait Drawable {
    fn render(&mut self, renderer: &mut Renderer);

    fn update(&mut self, _delta: u64) {}

    fn is_animated(&self) -> bool {
        false
    }
}

/// Textured quad showing one sub texture of an atlas
pub struct Sprite {
    texture: Rc<TextureAtlas>,
    program: Rc<ShaderProgram>,
    /// Bottom left corner
    pub position: Vec2,
    pub size: Vec2,
    /// Degrees, counter clockwise
    pub rotation: f32,
    vertex_array: VertexArray,
    texture_coords: VertexBuffer,
    index_buffer: IndexBuffer,
}

impl Sprite {
    pub fn new(
        renderer: &mut Renderer,
        texture: Rc<TextureAtlas>,
        initial_sub_texture: &str,
        program: Rc<ShaderProgram>,
        position: Vec2,
        size: Vec2,
        rotation: f32,
    ) -> Result<Self> {
        let sub_texture = texture
            .sub_texture(initial_sub_texture)
            .ok_or_else(|| Error::not_found(AssetKind::SubTexture, initial_sub_texture))?;

        let vertex_coords = VertexBuffer::new(renderer, &QUAD_VERTICES);
        let texture_coords = VertexBuffer::new(renderer, &sub_texture.uv_coords());
        let index_buffer = IndexBuffer::new(renderer, &QUAD_INDICES);

        let mut layout = VertexBufferLayout::default();
        layout.add_element(2, false);
        let mut vertex_array = VertexArray::default();
        vertex_array.add_buffer(&vertex_coords, &layout);
        vertex_array.add_buffer(&texture_coords, &layout);

        Ok(Self {
            texture,
            program,
            position,
            size,
            rotation,
            vertex_array,
            texture_coords,
            index_buffer,
        })
    }

    /// Translate to position, rotate around the center, scale the unit quad to size
    pub fn model_matrix(&self) -> Mat4 {
        let half = (0.5 * self.size).extend(0.0);
        Mat4::from_translation(self.position.extend(0.0))
            * Mat4::from_translation(half)
            * Mat4::from_rotation_z(self.rotation.to_radians())
            * Mat4::from_translation(-half)
            * Mat4::from_scale(self.size.extend(1.0))
    }

    pub fn render(&self, renderer: &mut Renderer) {
        if let Err(err) = self
            .program
            .set_uniform_mat4(renderer, MODEL_UNIFORM, &self.model_matrix())
        {
            log::error!("Sprite render {err}");
        }
        renderer.draw(
            &self.vertex_array,
            &self.index_buffer,
            &self.program,
            self.texture.texture(),
        );
    }

    /// Show another sub texture of the atlas
    pub fn set_sub_texture(&mut self, renderer: &mut Renderer, name: &str) -> Result<()> {
        let sub_texture = self
            .texture
            .sub_texture(name)
            .ok_or_else(|| Error::not_found(AssetKind::SubTexture, name))?;
        self.upload_sub_texture(renderer, &sub_texture);
        Ok(())
    }

    pub(crate) fn upload_sub_texture(&self, renderer: &mut Renderer, sub_texture: &SubTexture) {
        self.texture_coords
            .update(renderer, &sub_texture.uv_coords());
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    pub fn texture(&self) -> &Rc<TextureAtlas> {
        &self.texture
    }

    pub fn program(&self) -> &Rc<ShaderProgram> {
        &self.program
    }
}

impl Drawable for Sprite {
    fn render(&mut self, renderer: &mut Renderer) {
        Sprite::render(self, renderer)
    }
}

impl Debug for Sprite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sprite")
            .field("position", &self.position)
            .field("size", &self.size)
            .field("rotation", &self.rotation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use glam::{UVec2, Vec3, Vec4};

    use super::*;
    use crate::{
        backend::HeadlessBackend,
        shader::{SPRITE_FRAGMENT_SOURCE, SPRITE_VERTEX_SOURCE},
    };

    fn setup() -> (Renderer, HeadlessBackend, Rc<TextureAtlas>, Rc<ShaderProgram>) {
        let backend = HeadlessBackend::default();
        let mut renderer = Renderer::new(backend.clone());
        let size = UVec2::new(32, 16);
        let texture = renderer.create_texture(&[0; 32 * 16 * 4], size, 4);
        let atlas =
            TextureAtlas::from_grid(texture, size, &["brick", "beton"], UVec2::splat(16)).unwrap();
        let program =
            ShaderProgram::new(&mut renderer, SPRITE_VERTEX_SOURCE, SPRITE_FRAGMENT_SOURCE)
                .unwrap();
        (renderer, backend, Rc::new(atlas), Rc::new(program))
    }

    #[test]
    fn test_sprite_render_draws_quad() {
        let (mut renderer, backend, atlas, program) = setup();
        let sprite = Sprite::new(
            &mut renderer,
            atlas,
            "beton",
            program,
            Vec2::new(300.0, 100.0),
            Vec2::splat(100.0),
            0.0,
        )
        .unwrap();
        sprite.render(&mut renderer);
        assert_eq!(renderer.draw_calls(), 1);

        let recording = backend.recording();
        let recording = recording.borrow();
        let draw = recording.last_draw().unwrap();
        assert_eq!(draw.positions, QUAD_VERTICES.to_vec());
        assert_eq!(draw.indices, QUAD_INDICES.to_vec());
        assert_eq!(draw.uvs, vec![0.5, 0.0, 0.5, 1.0, 1.0, 1.0, 1.0, 0.0]);
        assert_eq!(draw.model, Some(sprite.model_matrix()));
    }

    #[test]
    fn test_model_matrix_rotates_around_center() {
        let (mut renderer, _backend, atlas, program) = setup();
        let mut sprite = Sprite::new(
            &mut renderer,
            atlas,
            "brick",
            program,
            Vec2::new(10.0, 20.0),
            Vec2::new(4.0, 2.0),
            0.0,
        )
        .unwrap();

        let m = sprite.model_matrix();
        assert_eq!(m * Vec4::new(0.0, 0.0, 0.0, 1.0), Vec4::new(10.0, 20.0, 0.0, 1.0));
        assert_eq!(m * Vec4::new(1.0, 1.0, 0.0, 1.0), Vec4::new(14.0, 22.0, 0.0, 1.0));

        // rotation is not wrapped and keeps the center in place
        sprite.set_rotation(450.0);
        assert_eq!(sprite.rotation, 450.0);
        let center = sprite.model_matrix() * Vec4::new(0.5, 0.5, 0.0, 1.0);
        assert!((center.truncate() - Vec3::new(12.0, 21.0, 0.0)).length() < 1e-4);
        let corner = sprite.model_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((corner.truncate() - Vec3::new(13.0, 19.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_sprite_unknown_sub_texture() {
        let (mut renderer, _backend, atlas, program) = setup();
        let err = Sprite::new(
            &mut renderer,
            atlas,
            "water",
            program,
            Vec2::ZERO,
            Vec2::ONE,
            0.0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::AssetNotFound {
                kind: AssetKind::SubTexture,
                ..
            }
        ));
    }

    #[test]
    fn test_set_sub_texture_uploads_uvs() {
        let (mut renderer, backend, atlas, program) = setup();
        let mut sprite = Sprite::new(
            &mut renderer,
            atlas,
            "brick",
            program,
            Vec2::ZERO,
            Vec2::ONE,
            0.0,
        )
        .unwrap();
        sprite.set_sub_texture(&mut renderer, "beton").unwrap();
        assert!(sprite.set_sub_texture(&mut renderer, "water").is_err());
        assert_eq!(backend.recording().borrow().buffer_updates, 1);
    }
}
