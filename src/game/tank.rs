use std::{cell::RefCell, rc::Rc};

use glam::Vec2;

use crate::{animated_sprite::AnimatedSprite, renderer::Renderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Top,
    Bottom,
    Left,
    Right,
}

impl Orientation {
    /// Animation state shown while facing this way
    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Top => "tankTopState",
            Self::Bottom => "tankBottomState",
            Self::Left => "tankLeftState",
            Self::Right => "tankRightState",
        }
    }

    /// Unit step in screen space, y goes up
    pub fn direction(&self) -> Vec2 {
        match self {
            Self::Top => Vec2::Y,
            Self::Bottom => Vec2::NEG_Y,
            Self::Left => Vec2::NEG_X,
            Self::Right => Vec2::X,
        }
    }
}

/// Player tank driving a shared animated sprite
#[derive(Debug)]
pub struct Tank {
    orientation: Orientation,
    sprite: Rc<RefCell<AnimatedSprite>>,
    moving: bool,
    /// Pixels per nanosecond
    velocity: f32,
    position: Vec2,
}

impl Tank {
    pub fn new(sprite: Rc<RefCell<AnimatedSprite>>, velocity: f32, position: Vec2) -> Self {
        let orientation = Orientation::Top;
        {
            let mut sprite = sprite.borrow_mut();
            sprite.set_position(position);
            if let Err(err) = sprite.set_state(orientation.state_name()) {
                log::warn!("Tank sprite {err}");
            }
        }
        Self {
            orientation,
            sprite,
            moving: false,
            velocity,
            position,
        }
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        if self.orientation == orientation {
            return;
        }
        self.orientation = orientation;
        if let Err(err) = self
            .sprite
            .borrow_mut()
            .set_state(orientation.state_name())
        {
            log::error!("Tank orientation {err}");
        }
    }

    pub fn set_moving(&mut self, moving: bool) {
        self.moving = moving;
    }

    /// Move and animate, a standing tank keeps its frame
    pub fn update(&mut self, delta: u64) {
        if !self.moving {
            return;
        }
        self.position += delta as f32 * self.velocity * self.orientation.direction();
        let mut sprite = self.sprite.borrow_mut();
        sprite.set_position(self.position);
        sprite.update(delta);
    }

    pub fn render(&self, renderer: &mut Renderer) {
        self.sprite.borrow_mut().render(renderer);
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn sprite(&self) -> &Rc<RefCell<AnimatedSprite>> {
        &self.sprite
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use glam::UVec2;

    use super::*;
    use crate::{
        atlas::TextureAtlas,
        backend::HeadlessBackend,
        shader::{ShaderProgram, SPRITE_FRAGMENT_SOURCE, SPRITE_VERTEX_SOURCE},
    };

    pub(crate) const TANK_SUB_TEXTURES: [&str; 8] = [
        "tankTop1",
        "tankTop2",
        "tankLeft1",
        "tankLeft2",
        "tankBottom1",
        "tankBottom2",
        "tankRight1",
        "tankRight2",
    ];

    /// Tank sprite with two frames of 100ns per orientation
    pub(crate) fn tank_sprite(renderer: &mut Renderer) -> AnimatedSprite {
        let size = UVec2::new(128, 16);
        let texture = renderer.create_texture(&[0; 128 * 16 * 4], size, 4);
        let atlas =
            TextureAtlas::from_grid(texture, size, &TANK_SUB_TEXTURES, UVec2::splat(16)).unwrap();
        let program =
            ShaderProgram::new(renderer, SPRITE_VERTEX_SOURCE, SPRITE_FRAGMENT_SOURCE).unwrap();
        let mut sprite = AnimatedSprite::new(
            renderer,
            Rc::new(atlas),
            "tankTop1",
            Rc::new(program),
            Vec2::ZERO,
            Vec2::splat(100.0),
            0.0,
        )
        .unwrap();
        for (state, prefix) in [
            ("tankTopState", "tankTop"),
            ("tankBottomState", "tankBottom"),
            ("tankLeftState", "tankLeft"),
            ("tankRightState", "tankRight"),
        ] {
            sprite
                .insert_state(
                    state,
                    vec![(format!("{prefix}1"), 100).into(), (format!("{prefix}2"), 100).into()],
                )
                .unwrap();
        }
        sprite
    }

    fn setup() -> (Renderer, Tank) {
        let mut renderer = Renderer::new(HeadlessBackend::default());
        let sprite = Rc::new(RefCell::new(tank_sprite(&mut renderer)));
        let tank = Tank::new(sprite, 0.5, Vec2::new(100.0, 100.0));
        (renderer, tank)
    }

    #[test]
    fn test_new_tank_faces_top() {
        let (_renderer, tank) = setup();
        let sprite = tank.sprite().borrow();
        assert_eq!(sprite.animator().current_state(), Some("tankTopState"));
        assert_eq!(sprite.sprite().position, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_standing_tank_does_not_animate() {
        let (_renderer, mut tank) = setup();
        tank.update(150);
        assert_eq!(tank.position(), Vec2::new(100.0, 100.0));
        assert_eq!(tank.sprite().borrow().animator().current_frame_index(), 0);
    }

    #[test]
    fn test_moving_tank() {
        let (_renderer, mut tank) = setup();
        tank.set_orientation(Orientation::Left);
        tank.set_moving(true);
        tank.update(100);

        assert_eq!(tank.position(), Vec2::new(50.0, 100.0));
        let sprite = tank.sprite().borrow();
        assert_eq!(sprite.sprite().position, Vec2::new(50.0, 100.0));
        assert_eq!(sprite.animator().current_state(), Some("tankLeftState"));
        assert_eq!(sprite.animator().current_frame().unwrap().sub_texture, "tankLeft2");
    }

    #[test]
    fn test_same_orientation_keeps_animation() {
        let (_renderer, mut tank) = setup();
        tank.set_moving(true);
        tank.update(100);
        tank.set_orientation(Orientation::Top);
        assert_eq!(tank.sprite().borrow().animator().current_frame_index(), 1);
    }
}
