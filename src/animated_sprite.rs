use std::rc::Rc;

use glam::Vec2;

use crate::{
    animation::{AnimationFrame, Animator},
    atlas::{SubTexture, TextureAtlas},
    errors::{AssetKind, Error, Result},
    renderer::Renderer,
    shader::ShaderProgram,
    sprite::{Drawable, Sprite},
};

/// Sprite cycling through the frames of named animation states
#[derive(Debug)]
pub struct AnimatedSprite {
    sprite: Sprite,
    animator: Animator,
}

impl AnimatedSprite {
    pub fn new(
        renderer: &mut Renderer,
        texture: Rc<TextureAtlas>,
        initial_sub_texture: &str,
        program: Rc<ShaderProgram>,
        position: Vec2,
        size: Vec2,
        rotation: f32,
    ) -> Result<Self> {
        let sprite = Sprite::new(
            renderer,
            texture,
            initial_sub_texture,
            program,
            position,
            size,
            rotation,
        )?;
        Ok(Self::from_sprite(sprite))
    }

    pub fn from_sprite(sprite: Sprite) -> Self {
        Self {
            sprite,
            animator: Animator::default(),
        }
    }

    /// Insert or replace a state, every frame must name a sub texture of the atlas
    pub fn insert_state(
        &mut self,
        name: impl Into<String>,
        frames: Vec<AnimationFrame>,
    ) -> Result<()> {
        let name = name.into();
        let atlas = self.sprite.texture();
        if let Some(frame) = frames.iter().find(|f| !atlas.contains(&f.sub_texture)) {
            return Err(
                Error::not_found(AssetKind::SubTexture, frame.sub_texture.as_str())
                    .context(format!("animation state {name}")),
            );
        }
        self.animator.insert_state(name, frames)
    }

    pub fn set_state(&mut self, name: &str) -> Result<()> {
        self.animator.set_state(name)
    }

    /// Advance the active state by `delta` nanoseconds
    pub fn update(&mut self, delta: u64) -> bool {
        self.animator.update(delta)
    }

    /// Upload the current frame's UVs if it changed, then draw
    pub fn render(&mut self, renderer: &mut Renderer) {
        if self.animator.is_dirty() {
            let sub_texture = match self.animator.current_frame() {
                Some(frame) => self
                    .sprite
                    .texture()
                    .sub_texture(&frame.sub_texture)
                    .unwrap_or_else(|| {
                        log::warn!("Missing sub texture {}", frame.sub_texture);
                        SubTexture::default()
                    }),
                None => SubTexture::default(),
            };
            self.sprite.upload_sub_texture(renderer, &sub_texture);
            self.animator.clear_dirty();
        }
        self.sprite.render(renderer);
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.sprite.set_position(position);
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.sprite.set_size(size);
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.sprite.set_rotation(rotation);
    }

    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    pub fn sprite_mut(&mut self) -> &mut Sprite {
        &mut self.sprite
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }
}

impl Drawable for AnimatedSprite {
    fn render(&mut self, renderer: &mut Renderer) {
        AnimatedSprite::render(self, renderer)
    }

    fn update(&mut self, delta: u64) {
        AnimatedSprite::update(self, delta);
    }

    fn is_animated(&self) -> bool {
        true
    }
}
