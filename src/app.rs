use std::path::PathBuf;

use anyhow::Result;
use glam::UVec2;

use crate::{
    backend::HeadlessBackend, game::Game, renderer::Renderer, resources::ResourceManager,
};

#[derive(Debug)]
pub struct App {
    pub title: String,
    pub window: UVec2,
    pub vsync: bool,
    /// Falls back to [`crate::resources::default_asset_root`]
    pub asset_root: Option<PathBuf>,
}

impl Default for App {
    fn default() -> Self {
        Self {
            title: "Battle City".to_string(),
            window: UVec2::new(640, 480),
            vsync: false,
            asset_root: None,
        }
    }
}

impl App {
    pub fn title(mut self, title: String) -> Self {
        self.title = title;
        self
    }

    pub fn window(mut self, window: UVec2) -> Self {
        self.window = window;
        self
    }

    pub fn vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn asset_root(mut self, asset_root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(asset_root.into());
        self
    }

    pub fn resource_manager(&self) -> ResourceManager {
        let root = self
            .asset_root
            .clone()
            .unwrap_or_else(crate::resources::default_asset_root);
        log::info!("Asset root {}", root.display());
        ResourceManager::new(root)
    }

    /// Run the game in a window until it is closed
    #[cfg(feature = "sdl")]
    pub fn run(self) -> Result<()> {
        crate::backend::sdl::run(self)
    }

    /// Run `frames` frames of `frame_time` nanoseconds without a window,
    /// returning the backend that recorded them
    pub fn run_headless(self, frames: u32, frame_time: u64) -> Result<HeadlessBackend> {
        let backend = HeadlessBackend::default();
        let mut renderer = Renderer::new(backend.clone());
        let mut resources = self.resource_manager();
        let mut game = Game::new(self.window);
        game.init(&mut resources, &mut renderer)?;
        renderer.set_viewport(self.window, UVec2::ZERO);
        for _ in 0..frames {
            frame(&mut game, &mut renderer, frame_time);
        }
        shutdown(game, resources, &mut renderer);
        Ok(backend)
    }
}

/// Update, clear, draw and present one frame
pub(crate) fn frame(game: &mut Game, renderer: &mut Renderer, delta: u64) {
    game.update(delta);
    renderer.clear();
    game.render(renderer);
    renderer.present();
}

/// Release every resource before the renderer goes away
pub(crate) fn shutdown(game: Game, mut resources: ResourceManager, renderer: &mut Renderer) {
    drop(game);
    let released = resources.unload_all(renderer);
    log::debug!("Shutdown released {released} objects");
}
