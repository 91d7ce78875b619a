use glam::{UVec2, Vec2};
use hashbrown::{HashMap, HashSet};

use crate::{
    errors::{Error, Result},
    handle::Handle,
};

/// Named region of an atlas in normalized UV space, origin at the bottom left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubTexture {
    pub left_bottom: Vec2,
    pub right_top: Vec2,
}

impl Default for SubTexture {
    /// The whole texture
    fn default() -> Self {
        Self {
            left_bottom: Vec2::ZERO,
            right_top: Vec2::ONE,
        }
    }
}

impl SubTexture {
    pub fn new(left_bottom: Vec2, right_top: Vec2) -> Self {
        Self {
            left_bottom,
            right_top,
        }
    }

    /// UVs for the quad corners in order left-bottom, left-top, right-top, right-bottom
    pub fn uv_coords(&self) -> [f32; 8] {
        let Self {
            left_bottom: lb,
            right_top: rt,
        } = *self;
        [lb.x, lb.y, lb.x, rt.y, rt.x, rt.y, rt.x, lb.y]
    }

    pub fn is_valid(&self) -> bool {
        self.left_bottom.cmpge(Vec2::ZERO).all()
            && self.left_bottom.cmple(self.right_top).all()
            && self.right_top.cmple(Vec2::ONE).all()
    }
}

/// Split a texture into a grid of cells and name them row by row, starting
/// from the top row of the image.
pub fn grid_sub_textures<S: AsRef<str>>(
    texture_size: UVec2,
    names: &[S],
    cell_size: UVec2,
) -> Result<Vec<(String, SubTexture)>> {
    let UVec2 {
        x: width,
        y: height,
    } = texture_size;
    if cell_size.x == 0 || cell_size.y == 0 {
        return Err(Error::config(format!("empty atlas cell {cell_size}")));
    }
    if cell_size.x > width || cell_size.y > height {
        return Err(Error::config(format!(
            "atlas cell {cell_size} is larger than the texture {texture_size}"
        )));
    }
    if width % cell_size.x != 0 || height % cell_size.y != 0 {
        return Err(Error::config(format!(
            "texture {texture_size} is not a whole number of {cell_size} cells"
        )));
    }
    let capacity = (width / cell_size.x) as usize * (height / cell_size.y) as usize;
    if names.len() > capacity {
        return Err(Error::config(format!(
            "{} sub textures don't fit in {capacity} cells",
            names.len()
        )));
    }

    let size = texture_size.as_vec2();
    let mut offset_x = 0;
    let mut offset_y = height;
    let mut seen = HashSet::with_capacity(names.len());
    let mut sub_textures: Vec<(String, SubTexture)> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.as_ref();
        if !seen.insert(name) {
            return Err(Error::config(format!("duplicated sub texture {name}")));
        }
        let left_bottom = Vec2::new(
            offset_x as f32 / size.x,
            (offset_y - cell_size.y) as f32 / size.y,
        );
        let right_top = Vec2::new(
            (offset_x + cell_size.x) as f32 / size.x,
            offset_y as f32 / size.y,
        );
        sub_textures.push((name.to_string(), SubTexture::new(left_bottom, right_top)));

        offset_x += cell_size.x;
        if offset_x >= width {
            offset_x = 0;
            offset_y -= cell_size.y;
        }
    }
    Ok(sub_textures)
}

/// Texture with named sub textures
#[derive(Debug)]
pub struct TextureAtlas {
    texture: Handle,
    size: UVec2,
    sub_textures: HashMap<String, SubTexture>,
    names: Vec<String>,
}

impl TextureAtlas {
    /// Atlas without sub textures
    pub fn new(texture: Handle, size: UVec2) -> Self {
        Self {
            texture,
            size,
            sub_textures: HashMap::new(),
            names: Vec::new(),
        }
    }

    /// Atlas tiled by [`grid_sub_textures`]
    pub fn from_grid<S: AsRef<str>>(
        texture: Handle,
        size: UVec2,
        names: &[S],
        cell_size: UVec2,
    ) -> Result<Self> {
        let tiles = grid_sub_textures(size, names, cell_size)?;
        Ok(Self::from_sub_textures(texture, size, tiles))
    }

    /// Atlas from already tiled, uniquely named sub textures
    pub fn from_sub_textures(
        texture: Handle,
        size: UVec2,
        tiles: impl IntoIterator<Item = (String, SubTexture)>,
    ) -> Self {
        let mut atlas = Self::new(texture, size);
        for (name, sub_texture) in tiles {
            if atlas.sub_textures.insert(name.clone(), sub_texture).is_none() {
                atlas.names.push(name);
            }
        }
        atlas
    }

    /// Add or replace a named region
    pub fn add_sub_texture(
        &mut self,
        name: impl Into<String>,
        left_bottom: Vec2,
        right_top: Vec2,
    ) -> Result<()> {
        let name = name.into();
        let sub_texture = SubTexture::new(left_bottom, right_top);
        if !sub_texture.is_valid() {
            return Err(Error::config(format!(
                "sub texture {name} has invalid UVs {left_bottom}..{right_top}"
            )));
        }
        if self.sub_textures.insert(name.clone(), sub_texture).is_none() {
            self.names.push(name);
        }
        Ok(())
    }

    pub fn sub_texture(&self, name: &str) -> Option<SubTexture> {
        self.sub_textures.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sub_textures.contains_key(name)
    }

    /// Sub texture names in insertion order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn texture(&self) -> &Handle {
        &self.texture
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.x
    }

    pub fn height(&self) -> u32 {
        self.size.y
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("tile{i}")).collect()
    }

    #[test]
    fn test_grid_fills_top_row_first() {
        let tiles = grid_sub_textures(UVec2::new(32, 32), &["a", "b", "c"], UVec2::splat(16))
            .expect("grid");

        assert_eq!(tiles[0].0, "a");
        assert_eq!(
            tiles[0].1,
            SubTexture::new(Vec2::new(0.0, 0.5), Vec2::new(0.5, 1.0))
        );
        assert_eq!(
            tiles[1].1,
            SubTexture::new(Vec2::new(0.5, 0.5), Vec2::new(1.0, 1.0))
        );
        // wraps to the second row
        assert_eq!(
            tiles[2].1,
            SubTexture::new(Vec2::new(0.0, 0.0), Vec2::new(0.5, 0.5))
        );
    }

    #[test]
    fn test_grid_map_16x16_layout() {
        // 8 columns, the 19th tile sits on the third row from the top
        let tiles = grid_sub_textures(UVec2::new(128, 64), &names(31), UVec2::splat(16))
            .expect("grid");
        let (_, water1) = &tiles[18];
        assert_eq!(water1.left_bottom, Vec2::new(2.0 / 8.0, 1.0 / 4.0));
        assert_eq!(water1.right_top, Vec2::new(3.0 / 8.0, 2.0 / 4.0));
    }

    #[test]
    fn test_grid_rejects_bad_tiling() {
        let err = |size: UVec2, n: usize, cell: UVec2| {
            matches!(
                grid_sub_textures(size, &names(n), cell),
                Err(Error::Configuration(_))
            )
        };
        assert!(err(UVec2::new(32, 32), 1, UVec2::new(0, 16)));
        assert!(err(UVec2::new(32, 32), 1, UVec2::new(64, 16)));
        assert!(err(UVec2::new(30, 32), 1, UVec2::splat(16)));
        assert!(err(UVec2::new(32, 32), 5, UVec2::splat(16)));
        assert!(matches!(
            grid_sub_textures(UVec2::new(32, 32), &["a", "a"], UVec2::splat(16)),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_grid_rejects_late_duplicate_in_large_atlas() {
        let mut tiles = names(4095);
        tiles.push("tile17".to_string());
        let err = grid_sub_textures(UVec2::splat(1024), &tiles, UVec2::splat(16)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: duplicated sub texture tile17"
        );
        assert_eq!(
            grid_sub_textures(UVec2::splat(1024), &names(4096), UVec2::splat(16))
                .expect("grid")
                .len(),
            4096
        );
    }

    #[test]
    fn test_grid_random_layouts_stay_in_range_and_adjacent() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let cell = UVec2::new(rng.gen_range(1..=32), rng.gen_range(1..=32));
            let grid = UVec2::new(rng.gen_range(1..=10), rng.gen_range(1..=10));
            let size = cell * grid;
            let n = rng.gen_range(1..=(grid.x * grid.y) as usize);
            let tiles = grid_sub_textures(size, &names(n), cell).expect("grid");
            assert_eq!(tiles.len(), n);

            let cell_uv = cell.as_vec2() / size.as_vec2();
            for (i, (_, tile)) in tiles.iter().enumerate() {
                assert!(tile.is_valid(), "{tile:?}");
                let Some((_, next)) = tiles.get(i + 1) else {
                    continue;
                };
                if (i as u32 + 1) % grid.x == 0 {
                    // next row starts at the left edge, one cell lower
                    assert_eq!(next.left_bottom.x, 0.0);
                    assert!((next.right_top.y - tile.left_bottom.y).abs() < 1e-6);
                } else {
                    assert_eq!(next.left_bottom.y, tile.left_bottom.y);
                    assert!((next.left_bottom.x - tile.right_top.x).abs() < 1e-6);
                }
                assert!(((tile.right_top - tile.left_bottom) - cell_uv).abs().max_element() < 1e-6);
            }
        }
    }

    #[test]
    fn test_sub_texture_uv_coords() {
        let sub = SubTexture::new(Vec2::new(0.25, 0.5), Vec2::new(0.5, 0.75));
        assert_eq!(
            sub.uv_coords(),
            [0.25, 0.5, 0.25, 0.75, 0.5, 0.75, 0.5, 0.5]
        );
        assert!(SubTexture::default().is_valid());
        assert!(!SubTexture::new(Vec2::ONE, Vec2::ZERO).is_valid());
    }
}
