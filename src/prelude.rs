pub use crate::animated_sprite::AnimatedSprite;
pub use crate::animation::{AnimationFrame, AnimationState, Animator};
pub use crate::app::App;
pub use crate::atlas::{SubTexture, TextureAtlas};
pub use crate::backend::{Backend, HeadlessBackend};
pub use crate::errors::{AssetKind, Error, Result};
pub use crate::game::{Game, GameState, Orientation, Tank};
pub use crate::input::{InputState, KeyCode};
pub use crate::renderer::Renderer;
pub use crate::resources::{LoadSummary, ResourceManager};
pub use crate::shader::{ShaderError, ShaderProgram, ShaderStage};
pub use crate::sprite::{Drawable, Sprite};
pub use glam;
