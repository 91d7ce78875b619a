use std::rc::Rc;

use glam::{Mat4, UVec2, Vec2};

use crate::{
    errors::{AssetKind, Error, Result},
    input::{InputState, KeyCode},
    renderer::Renderer,
    resources::ResourceManager,
    shader::ShaderProgram,
};

pub mod tank;

pub use tank::{Orientation, Tank};

/// Descriptor loaded by [`Game::init`], relative to the asset root
pub const RESOURCES_JSON: &str = "res/resources.json";
pub const SPRITE_SHADER: &str = "spriteShader";
pub const TANK_SPRITE: &str = "tankSprite";
pub const PROJECTION_UNIFORM: &str = "projectionMat";
pub const TEXTURE_UNIFORM: &str = "tex";
/// Pixels per nanosecond
pub const TANK_VELOCITY: f32 = 1e-7;

const CONTROLS: [(Orientation, [KeyCode; 2]); 4] = [
    (Orientation::Top, [KeyCode::KeyW, KeyCode::Up]),
    (Orientation::Left, [KeyCode::KeyA, KeyCode::Left]),
    (Orientation::Right, [KeyCode::KeyD, KeyCode::Right]),
    (Orientation::Bottom, [KeyCode::KeyS, KeyCode::Down]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    #[default]
    Active,
    Pause,
}

/// Orthographic projection with the origin at the bottom left corner
pub fn projection_matrix(window_size: UVec2) -> Mat4 {
    let size = window_size.as_vec2();
    Mat4::orthographic_rh_gl(0.0, size.x, 0.0, size.y, -100.0, 100.0)
}

pub struct Game {
    state: GameState,
    window_size: UVec2,
    input: InputState,
    program: Option<Rc<ShaderProgram>>,
    tank: Option<Tank>,
}

impl Game {
    pub fn new(window_size: UVec2) -> Self {
        Self {
            state: GameState::Active,
            window_size,
            input: InputState::default(),
            program: None,
            tank: None,
        }
    }

    /// Load the resource descriptor and spawn the tank
    pub fn init(&mut self, resources: &mut ResourceManager, renderer: &mut Renderer) -> Result<()> {
        let summary = resources.load_json_resources(renderer, RESOURCES_JSON)?;
        log::info!(
            "Loaded {} resources, {} failed",
            summary.loaded.len(),
            summary.failed.len()
        );
        self.start(resources, renderer)
    }

    /// Spawn the tank from already loaded resources
    pub fn start(&mut self, resources: &ResourceManager, renderer: &mut Renderer) -> Result<()> {
        let program = resources
            .shader_program(SPRITE_SHADER)
            .ok_or_else(|| Error::not_found(AssetKind::Shader, SPRITE_SHADER))?;
        program.set_uniform_i32(renderer, TEXTURE_UNIFORM, 0)?;
        program.set_uniform_mat4(
            renderer,
            PROJECTION_UNIFORM,
            &projection_matrix(self.window_size),
        )?;
        self.program = Some(program);

        let sprite = resources
            .animated_sprite(TANK_SPRITE)
            .ok_or_else(|| Error::not_found(AssetKind::AnimatedSprite, TANK_SPRITE))?;
        self.tank = Some(Tank::new(sprite, TANK_VELOCITY, Vec2::new(100.0, 100.0)));
        Ok(())
    }

    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        if key == KeyCode::Pause && pressed {
            self.state = match self.state {
                GameState::Active => GameState::Pause,
                GameState::Pause => GameState::Active,
            };
        }
        self.input.set_key(key, pressed);
    }

    /// Advance by `delta` nanoseconds
    pub fn update(&mut self, delta: u64) {
        if self.state == GameState::Pause {
            return;
        }
        let Some(tank) = self.tank.as_mut() else {
            return;
        };
        let pressed = CONTROLS
            .iter()
            .find(|(_, keys)| self.input.any_pressed(keys));
        match pressed {
            Some((orientation, _)) => {
                tank.set_orientation(*orientation);
                tank.set_moving(true);
            }
            None => tank.set_moving(false),
        }
        tank.update(delta);
    }

    pub fn render(&self, renderer: &mut Renderer) {
        if let Some(tank) = &self.tank {
            tank.render(renderer);
        }
    }

    /// Follow the window size with viewport and projection
    pub fn resize(&mut self, renderer: &mut Renderer, window_size: UVec2) {
        self.window_size = window_size;
        renderer.set_viewport(window_size, UVec2::ZERO);
        let Some(program) = &self.program else {
            return;
        };
        let projection = projection_matrix(window_size);
        if let Err(err) = program.set_uniform_mat4(renderer, PROJECTION_UNIFORM, &projection) {
            log::error!("Resize {err}");
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn window_size(&self) -> UVec2 {
        self.window_size
    }

    pub fn tank(&self) -> Option<&Tank> {
        self.tank.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::{
        backend::HeadlessBackend,
        shader::{SPRITE_FRAGMENT_SOURCE, SPRITE_VERTEX_SOURCE},
    };

    fn setup() -> (Renderer, HeadlessBackend, ResourceManager, Game) {
        let backend = HeadlessBackend::default();
        let mut renderer = Renderer::new(backend.clone());
        let mut resources = ResourceManager::new(".");
        resources
            .add_shader_program(
                &mut renderer,
                SPRITE_SHADER,
                SPRITE_VERTEX_SOURCE,
                SPRITE_FRAGMENT_SOURCE,
            )
            .unwrap();
        let sprite = tank::tests::tank_sprite(&mut renderer);
        resources.add_animated_sprite(TANK_SPRITE, sprite);
        let mut game = Game::new(UVec2::new(640, 480));
        game.start(&resources, &mut renderer).unwrap();
        (renderer, backend, resources, game)
    }

    fn tank_position(game: &Game) -> Vec2 {
        game.tank().unwrap().position()
    }

    #[test]
    fn test_start_requires_tank_sprite() {
        let mut renderer = Renderer::new(HeadlessBackend::default());
        let mut resources = ResourceManager::new(".");
        resources
            .add_shader_program(
                &mut renderer,
                SPRITE_SHADER,
                SPRITE_VERTEX_SOURCE,
                SPRITE_FRAGMENT_SOURCE,
            )
            .unwrap();
        let mut game = Game::new(UVec2::new(640, 480));
        let err = game.start(&resources, &mut renderer).unwrap_err();
        assert!(matches!(
            err,
            Error::AssetNotFound {
                kind: AssetKind::AnimatedSprite,
                ..
            }
        ));
        assert!(game.tank().is_none());
    }

    #[test]
    fn test_start_sets_uniforms() {
        let (_renderer, backend, resources, _game) = setup();
        let program = resources.shader_program(SPRITE_SHADER).unwrap();
        let recording = backend.recording();
        let recording = recording.borrow();
        let info = &recording.programs[&program.id()];
        assert_eq!(info.ints[TEXTURE_UNIFORM], 0);
        assert_eq!(
            info.mat4[PROJECTION_UNIFORM],
            projection_matrix(UVec2::new(640, 480))
        );
    }

    #[test]
    fn test_keys_drive_tank() {
        let (_renderer, _backend, _resources, mut game) = setup();
        game.set_key(KeyCode::KeyD, true);
        game.update(1_000_000_000);
        assert_eq!(game.tank().unwrap().orientation(), Orientation::Right);
        assert!(tank_position(&game).abs_diff_eq(Vec2::new(200.0, 100.0), 1e-3));

        game.set_key(KeyCode::KeyD, false);
        game.set_key(KeyCode::Down, true);
        game.update(500_000_000);
        assert_eq!(game.tank().unwrap().orientation(), Orientation::Bottom);
        assert!(tank_position(&game).abs_diff_eq(Vec2::new(200.0, 50.0), 1e-3));

        game.set_key(KeyCode::Down, false);
        let before = tank_position(&game);
        game.update(500_000_000);
        assert!(!game.tank().unwrap().is_moving());
        assert_eq!(tank_position(&game), before);
    }

    #[test]
    fn test_pause_freezes_update() {
        let (_renderer, _backend, _resources, mut game) = setup();
        game.set_key(KeyCode::Pause, true);
        game.set_key(KeyCode::Pause, false);
        assert_eq!(game.state(), GameState::Pause);
        game.set_key(KeyCode::KeyW, true);
        game.update(1_000_000_000);
        assert_eq!(tank_position(&game), Vec2::new(100.0, 100.0));

        game.set_key(KeyCode::Pause, true);
        assert_eq!(game.state(), GameState::Active);
    }

    #[test]
    fn test_projection_maps_window_to_clip_space() {
        let projection = projection_matrix(UVec2::new(640, 480));
        let corner = projection.project_point3(Vec3::new(640.0, 480.0, 0.0));
        assert!(corner.truncate().abs_diff_eq(Vec2::ONE, 1e-6));
        let origin = projection.project_point3(Vec3::ZERO);
        assert!(origin.truncate().abs_diff_eq(Vec2::NEG_ONE, 1e-6));
    }

    #[test]
    fn test_render_draws_tank() {
        let (mut renderer, backend, _resources, game) = setup();
        game.render(&mut renderer);
        assert_eq!(renderer.draw_calls(), 1);
        let recording = backend.recording();
        let recording = recording.borrow();
        let model = recording.last_draw().unwrap().model.unwrap();
        let origin = model.transform_point3(Vec3::ZERO);
        assert!(origin.truncate().abs_diff_eq(Vec2::new(100.0, 100.0), 1e-4));
    }

    #[test]
    fn test_resize_updates_viewport() {
        let (mut renderer, backend, _resources, mut game) = setup();
        game.resize(&mut renderer, UVec2::new(800, 600));
        assert_eq!(game.window_size(), UVec2::new(800, 600));
        assert_eq!(
            backend.recording().borrow().viewport,
            (UVec2::ZERO, UVec2::new(800, 600))
        );
    }
}
