use battle2d::prelude::*;
use glam::UVec2;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    App::default()
        .title("Battle City".to_string())
        .window(UVec2::new(640, 480))
        .vsync(true)
        .run()
}
