//! JSON resource descriptor
//!
//! ```json
//! {
//!   "shaders": [{ "name": "spriteShader", "filePath_v": "res/shaders/vSprite.txt", "filePath_f": "res/shaders/fSprite.txt" }],
//!   "textureAtlases": [{ "name": "mapTextureAtlas", "filePath": "res/textures/map_16x16.png",
//!                        "subTextureWidth": 16, "subTextureHeight": 16, "subTextures": ["block", "topBlock"] }],
//!   "animatedSprites": [{ "name": "tankSprite", "textureAtlas": "tanksTextureAtlas", "shader": "spriteShader",
//!                         "initialWidth": 100, "initialHeight": 100, "initialSubTexture": "tankTop1",
//!                         "states": [{ "stateName": "tankTopState",
//!                                      "frames": [{ "subTexture": "tankTop1", "duration": 500000000 }] }] }]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::animation::AnimationFrame;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceDescriptor {
    pub shaders: Vec<ShaderDescriptor>,
    pub texture_atlases: Vec<TextureAtlasDescriptor>,
    pub sprites: Vec<SpriteDescriptor>,
    pub animated_sprites: Vec<AnimatedSpriteDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderDescriptor {
    pub name: String,
    #[serde(rename = "filePath_v")]
    pub vertex_path: String,
    #[serde(rename = "filePath_f")]
    pub fragment_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureAtlasDescriptor {
    pub name: String,
    pub file_path: String,
    pub sub_texture_width: u32,
    pub sub_texture_height: u32,
    pub sub_textures: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteDescriptor {
    pub name: String,
    pub texture_atlas: String,
    pub shader: String,
    pub initial_width: u32,
    pub initial_height: u32,
    pub initial_sub_texture: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimatedSpriteDescriptor {
    pub name: String,
    pub texture_atlas: String,
    pub shader: String,
    pub initial_width: u32,
    pub initial_height: u32,
    pub initial_sub_texture: String,
    #[serde(default)]
    pub states: Vec<StateDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDescriptor {
    pub state_name: String,
    pub frames: Vec<FrameDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDescriptor {
    pub sub_texture: String,
    /// Nanoseconds
    pub duration: u64,
}

impl StateDescriptor {
    pub fn animation_frames(&self) -> Vec<AnimationFrame> {
        self.frames
            .iter()
            .map(|f| AnimationFrame::new(f.sub_texture.as_str(), f.duration))
            .collect()
    }
}
