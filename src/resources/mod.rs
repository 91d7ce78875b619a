use std::{
    cell::RefCell,
    env, fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use glam::{UVec2, Vec2};
use hashbrown::HashMap;
use image::DynamicImage;

use crate::{
    animated_sprite::AnimatedSprite,
    atlas::TextureAtlas,
    errors::{AssetKind, Error, Result},
    renderer::Renderer,
    shader::ShaderProgram,
    sprite::Sprite,
};

pub mod descriptor;

use descriptor::{AnimatedSpriteDescriptor, ResourceDescriptor};

/// Overrides the directory assets are read from
pub const ASSET_ROOT_ENV: &str = "BATTLE2D_ASSET_ROOT";

/// Asset root: `BATTLE2D_ASSET_ROOT`, then the cargo manifest directory when
/// run through cargo, else the directory of the executable
pub fn default_asset_root() -> PathBuf {
    if let Ok(root) = env::var(ASSET_ROOT_ENV) {
        return PathBuf::from(root);
    }
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        return PathBuf::from(manifest_dir);
    }
    env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(ToOwned::to_owned))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Result of loading a descriptor, failed entries don't stop the others
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub loaded: Vec<String>,
    pub failed: Vec<(String, Error)>,
}

impl LoadSummary {
    fn record<T>(&mut self, name: &str, result: Result<T>) {
        match result {
            Ok(_) => self.loaded.push(name.to_string()),
            Err(err) => {
                log::error!("Failed to load {name}: {err}");
                self.failed.push((name.to_string(), err));
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owner of every named shader, texture and sprite.
///
/// Call [`ResourceManager::unload_all`] before dropping the [`Renderer`].
#[derive(Default)]
pub struct ResourceManager {
    resource_path: PathBuf,
    shader_programs: HashMap<String, Rc<ShaderProgram>>,
    textures: HashMap<String, Rc<TextureAtlas>>,
    sprites: HashMap<String, Rc<RefCell<Sprite>>>,
    animated_sprites: HashMap<String, Rc<RefCell<AnimatedSprite>>>,
}

fn insert_named<T>(
    map: &mut HashMap<String, Rc<T>>,
    kind: AssetKind,
    name: &str,
    value: T,
) -> Rc<T> {
    let value = Rc::new(value);
    if map.insert(name.to_string(), value.clone()).is_some() {
        log::warn!("Replaced {kind} {name}");
    }
    value
}

fn get_named<T>(map: &HashMap<String, Rc<T>>, kind: AssetKind, name: &str) -> Option<Rc<T>> {
    let value = map.get(name).cloned();
    if value.is_none() {
        log::error!("Can't find the {kind}: {name}");
    }
    value
}

impl ResourceManager {
    pub fn new<P: Into<PathBuf>>(resource_path: P) -> Self {
        Self {
            resource_path: resource_path.into(),
            ..Default::default()
        }
    }

    /// Resources next to the executable
    pub fn from_executable_path<P: AsRef<Path>>(executable_path: P) -> Self {
        let dir = executable_path
            .as_ref()
            .parent()
            .map(ToOwned::to_owned)
            .unwrap_or_default();
        Self::new(dir)
    }

    pub fn resource_path(&self) -> &Path {
        &self.resource_path
    }

    pub fn full_path(&self, relative_path: &str) -> PathBuf {
        self.resource_path.join(relative_path)
    }

    pub fn file_string(&self, relative_path: &str) -> Result<String> {
        let path = self.full_path(relative_path);
        fs::read_to_string(&path).map_err(|source| Error::Io { path, source })
    }

    pub fn load_shaders(
        &mut self,
        renderer: &mut Renderer,
        name: &str,
        vertex_path: &str,
        fragment_path: &str,
    ) -> Result<Rc<ShaderProgram>> {
        let vertex = self.file_string(vertex_path)?;
        if vertex.trim().is_empty() {
            return Err(Error::config(format!("no vertex shader in {vertex_path}")));
        }
        let fragment = self.file_string(fragment_path)?;
        if fragment.trim().is_empty() {
            return Err(Error::config(format!("no fragment shader in {fragment_path}")));
        }
        let program =
            ShaderProgram::new(renderer, &vertex, &fragment).map_err(|source| Error::Shader {
                name: name.to_string(),
                vertex_path: vertex_path.to_string(),
                fragment_path: fragment_path.to_string(),
                source,
            })?;
        Ok(insert_named(
            &mut self.shader_programs,
            AssetKind::Shader,
            name,
            program,
        ))
    }

    /// Build a program from in-memory sources
    pub fn add_shader_program(
        &mut self,
        renderer: &mut Renderer,
        name: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Rc<ShaderProgram>> {
        let program = ShaderProgram::new(renderer, vertex_source, fragment_source)?;
        Ok(insert_named(
            &mut self.shader_programs,
            AssetKind::Shader,
            name,
            program,
        ))
    }

    pub fn shader_program(&self, name: &str) -> Option<Rc<ShaderProgram>> {
        get_named(&self.shader_programs, AssetKind::Shader, name)
    }

    fn open_image(&self, relative_path: &str) -> Result<DynamicImage> {
        let path = self.full_path(relative_path);
        image::open(&path).map_err(|source| Error::Image { path, source })
    }

    /// Whole image as a texture without sub textures
    pub fn load_texture(
        &mut self,
        renderer: &mut Renderer,
        name: &str,
        texture_path: &str,
    ) -> Result<Rc<TextureAtlas>> {
        let image = self.open_image(texture_path)?;
        let (texture, size) = upload_image(renderer, &image);
        Ok(insert_named(
            &mut self.textures,
            AssetKind::Texture,
            name,
            TextureAtlas::new(texture, size),
        ))
    }

    pub fn load_texture_atlas<S: AsRef<str>>(
        &mut self,
        renderer: &mut Renderer,
        name: &str,
        texture_path: &str,
        sub_textures: &[S],
        sub_texture_width: u32,
        sub_texture_height: u32,
    ) -> Result<Rc<TextureAtlas>> {
        let image = self.open_image(texture_path)?;
        self.add_texture_atlas(
            renderer,
            name,
            &image,
            sub_textures,
            UVec2::new(sub_texture_width, sub_texture_height),
        )
        .map_err(|err| err.context(format!("texture atlas {name} ({texture_path})")))
    }

    /// Tile an in-memory image into named cells
    pub fn add_texture_atlas<S: AsRef<str>>(
        &mut self,
        renderer: &mut Renderer,
        name: &str,
        image: &DynamicImage,
        sub_textures: &[S],
        cell_size: UVec2,
    ) -> Result<Rc<TextureAtlas>> {
        let size = UVec2::new(image.width(), image.height());
        // validate before uploading anything
        let tiles = crate::atlas::grid_sub_textures(size, sub_textures, cell_size)?;
        let (texture, size) = upload_image(renderer, image);
        let atlas = TextureAtlas::from_sub_textures(texture, size, tiles);
        Ok(insert_named(
            &mut self.textures,
            AssetKind::Texture,
            name,
            atlas,
        ))
    }

    pub fn texture(&self, name: &str) -> Option<Rc<TextureAtlas>> {
        get_named(&self.textures, AssetKind::Texture, name)
    }

    fn sprite_parts(
        &self,
        sprite_name: &str,
        texture_name: &str,
        shader_name: &str,
    ) -> Result<(Rc<TextureAtlas>, Rc<ShaderProgram>)> {
        let texture = self.textures.get(texture_name).cloned().ok_or_else(|| {
            Error::not_found(AssetKind::Texture, texture_name)
                .context(format!("sprite {sprite_name}"))
        })?;
        let program = self
            .shader_programs
            .get(shader_name)
            .cloned()
            .ok_or_else(|| {
                Error::not_found(AssetKind::Shader, shader_name)
                    .context(format!("sprite {sprite_name}"))
            })?;
        Ok((texture, program))
    }

    pub fn load_sprite(
        &mut self,
        renderer: &mut Renderer,
        sprite_name: &str,
        texture_name: &str,
        shader_name: &str,
        sprite_width: u32,
        sprite_height: u32,
        sub_texture_name: &str,
    ) -> Result<Rc<RefCell<Sprite>>> {
        let (texture, program) = self.sprite_parts(sprite_name, texture_name, shader_name)?;
        let sprite = Sprite::new(
            renderer,
            texture,
            sub_texture_name,
            program,
            Vec2::ZERO,
            UVec2::new(sprite_width, sprite_height).as_vec2(),
            0.0,
        )
        .map_err(|err| err.context(format!("sprite {sprite_name}")))?;
        Ok(insert_named(
            &mut self.sprites,
            AssetKind::Sprite,
            sprite_name,
            RefCell::new(sprite),
        ))
    }

    pub fn sprite(&self, name: &str) -> Option<Rc<RefCell<Sprite>>> {
        get_named(&self.sprites, AssetKind::Sprite, name)
    }

    fn build_animated_sprite(
        &self,
        renderer: &mut Renderer,
        sprite_name: &str,
        texture_name: &str,
        shader_name: &str,
        size: UVec2,
        sub_texture_name: &str,
    ) -> Result<AnimatedSprite> {
        let (texture, program) = self.sprite_parts(sprite_name, texture_name, shader_name)?;
        AnimatedSprite::new(
            renderer,
            texture,
            sub_texture_name,
            program,
            Vec2::ZERO,
            size.as_vec2(),
            0.0,
        )
        .map_err(|err| err.context(format!("animated sprite {sprite_name}")))
    }

    pub fn load_animated_sprite(
        &mut self,
        renderer: &mut Renderer,
        sprite_name: &str,
        texture_name: &str,
        shader_name: &str,
        sprite_width: u32,
        sprite_height: u32,
        sub_texture_name: &str,
    ) -> Result<Rc<RefCell<AnimatedSprite>>> {
        let sprite = self.build_animated_sprite(
            renderer,
            sprite_name,
            texture_name,
            shader_name,
            UVec2::new(sprite_width, sprite_height),
            sub_texture_name,
        )?;
        Ok(insert_named(
            &mut self.animated_sprites,
            AssetKind::AnimatedSprite,
            sprite_name,
            RefCell::new(sprite),
        ))
    }

    /// Cache a sprite built elsewhere
    pub fn add_animated_sprite(
        &mut self,
        name: &str,
        sprite: AnimatedSprite,
    ) -> Rc<RefCell<AnimatedSprite>> {
        insert_named(
            &mut self.animated_sprites,
            AssetKind::AnimatedSprite,
            name,
            RefCell::new(sprite),
        )
    }

    pub fn animated_sprite(&self, name: &str) -> Option<Rc<RefCell<AnimatedSprite>>> {
        get_named(&self.animated_sprites, AssetKind::AnimatedSprite, name)
    }

    /// Load every asset of a JSON descriptor file
    pub fn load_json_resources(
        &mut self,
        renderer: &mut Renderer,
        json_path: &str,
    ) -> Result<LoadSummary> {
        let json = self.file_string(json_path)?;
        let descriptor: ResourceDescriptor = serde_json::from_str(&json)
            .map_err(|err| Error::from(err).context(format!("JSON file {json_path}")))?;
        Ok(self.load_descriptor(renderer, &descriptor))
    }

    /// Load shaders, then atlases, then sprites. A failing entry is logged
    /// and skipped.
    pub fn load_descriptor(
        &mut self,
        renderer: &mut Renderer,
        descriptor: &ResourceDescriptor,
    ) -> LoadSummary {
        let mut summary = LoadSummary::default();
        for shader in &descriptor.shaders {
            let result = self.load_shaders(
                renderer,
                &shader.name,
                &shader.vertex_path,
                &shader.fragment_path,
            );
            summary.record(&shader.name, result);
        }
        for atlas in &descriptor.texture_atlases {
            let result = self.load_texture_atlas(
                renderer,
                &atlas.name,
                &atlas.file_path,
                &atlas.sub_textures,
                atlas.sub_texture_width,
                atlas.sub_texture_height,
            );
            summary.record(&atlas.name, result);
        }
        for sprite in &descriptor.sprites {
            let result = self.load_sprite(
                renderer,
                &sprite.name,
                &sprite.texture_atlas,
                &sprite.shader,
                sprite.initial_width,
                sprite.initial_height,
                &sprite.initial_sub_texture,
            );
            summary.record(&sprite.name, result);
        }
        for sprite in &descriptor.animated_sprites {
            let result = self.load_animated_descriptor(renderer, sprite);
            summary.record(&sprite.name, result);
        }
        summary
    }

    fn load_animated_descriptor(
        &mut self,
        renderer: &mut Renderer,
        desc: &AnimatedSpriteDescriptor,
    ) -> Result<Rc<RefCell<AnimatedSprite>>> {
        let mut sprite = self.build_animated_sprite(
            renderer,
            &desc.name,
            &desc.texture_atlas,
            &desc.shader,
            UVec2::new(desc.initial_width, desc.initial_height),
            &desc.initial_sub_texture,
        )?;
        for state in &desc.states {
            sprite
                .insert_state(state.state_name.as_str(), state.animation_frames())
                .map_err(|err| err.context(format!("animated sprite {}", desc.name)))?;
        }
        Ok(insert_named(
            &mut self.animated_sprites,
            AssetKind::AnimatedSprite,
            &desc.name,
            RefCell::new(sprite),
        ))
    }

    /// Drop every cached asset and release the backend objects nobody else holds.
    /// Returns the number of released objects.
    pub fn unload_all(&mut self, renderer: &mut Renderer) -> usize {
        self.animated_sprites.clear();
        self.sprites.clear();
        self.textures.clear();
        self.shader_programs.clear();
        renderer.collect_garbage()
    }
}

/// Upload an image flipped so that rows go bottom to top
fn upload_image(renderer: &mut Renderer, image: &DynamicImage) -> (crate::handle::Handle, UVec2) {
    let rgba = image.flipv().to_rgba8();
    let (width, height) = rgba.dimensions();
    let size = UVec2::new(width, height);
    let handle = renderer.create_texture(rgba.as_raw(), size, 4);
    (handle, size)
}
