pub mod animated_sprite;
pub mod animation;
pub mod app;
pub mod atlas;
pub mod backend;
pub mod buffer;
pub mod errors;
pub mod game;
pub mod handle;
pub mod input;
pub mod prelude;
pub mod renderer;
pub mod resources;
pub mod shader;
pub mod sprite;
