use hashbrown::HashMap;

use crate::errors::{Error, Result};

/// Sub texture shown for `duration` nanoseconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationFrame {
    pub sub_texture: String,
    pub duration: u64,
}

impl AnimationFrame {
    pub fn new(sub_texture: impl Into<String>, duration: u64) -> Self {
        Self {
            sub_texture: sub_texture.into(),
            duration,
        }
    }
}

impl<S: Into<String>> From<(S, u64)> for AnimationFrame {
    fn from((sub_texture, duration): (S, u64)) -> Self {
        Self::new(sub_texture, duration)
    }
}

/// Cyclic sequence of frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationState {
    frames: Vec<AnimationFrame>,
    period: u64,
}

impl AnimationState {
    /// Frames must be non empty and every duration positive
    pub fn new(frames: Vec<AnimationFrame>) -> Result<Self> {
        if frames.is_empty() {
            return Err(Error::config("animation state without frames"));
        }
        if let Some(frame) = frames.iter().find(|f| f.duration == 0) {
            return Err(Error::config(format!(
                "frame {} has zero duration",
                frame.sub_texture
            )));
        }
        let period = frames
            .iter()
            .try_fold(0u64, |acc, f| acc.checked_add(f.duration))
            .ok_or_else(|| Error::config("animation period overflows"))?;
        Ok(Self { frames, period })
    }

    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&AnimationFrame> {
        self.frames.get(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Duration of one full cycle
    pub fn period(&self) -> u64 {
        self.period
    }
}

/// Named animation states and the playback position of the active one.
///
/// No state is active after construction; [`Animator::update`] does nothing
/// until [`Animator::set_state`] selects one.
#[derive(Debug, Clone, Default)]
pub struct Animator {
    states: HashMap<String, AnimationState>,
    current: Option<String>,
    frame_index: usize,
    elapsed: u64,
    dirty: bool,
}

impl Animator {
    /// Insert or replace a state. Replacing the active state restarts it
    /// from the first frame.
    pub fn insert_state(
        &mut self,
        name: impl Into<String>,
        frames: Vec<AnimationFrame>,
    ) -> Result<()> {
        let name = name.into();
        let state = AnimationState::new(frames)?;
        if self.current.as_ref() == Some(&name) {
            self.restart();
        }
        self.states.insert(name, state);
        Ok(())
    }

    /// Switch to another state. Selecting the active state keeps its timing.
    pub fn set_state(&mut self, name: &str) -> Result<()> {
        if !self.states.contains_key(name) {
            return Err(Error::AnimationStateNotFound(name.to_string()));
        }
        if self.current.as_deref() == Some(name) {
            return Ok(());
        }
        self.current = Some(name.to_string());
        self.restart();
        Ok(())
    }

    fn restart(&mut self) {
        self.frame_index = 0;
        self.elapsed = 0;
        self.dirty = true;
    }

    /// Advance by `delta` nanoseconds, stepping over as many frames as the
    /// elapsed time covers. Returns true if the frame changed.
    pub fn update(&mut self, delta: u64) -> bool {
        let Some(state) = self
            .current
            .as_deref()
            .and_then(|name| self.states.get(name))
        else {
            return false;
        };

        self.elapsed = self.elapsed.saturating_add(delta);
        let mut advanced = false;
        // whole cycles end on the same frame
        if self.elapsed >= state.period {
            self.elapsed %= state.period;
            advanced = true;
        }
        loop {
            let duration = state.frames[self.frame_index].duration;
            if self.elapsed < duration {
                break;
            }
            self.elapsed -= duration;
            self.frame_index += 1;
            if self.frame_index == state.frames.len() {
                self.frame_index = 0;
            }
            advanced = true;
        }
        if advanced {
            self.dirty = true;
        }
        advanced
    }

    pub fn current_state(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn current_frame(&self) -> Option<&AnimationFrame> {
        let state = self.states.get(self.current.as_deref()?)?;
        state.frame(self.frame_index)
    }

    /// Time spent in the current frame
    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// The current frame changed since the last [`Animator::clear_dirty`]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn state(&self, name: &str) -> Option<&AnimationState> {
        self.states.get(name)
    }

    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(list: &[(&str, u64)]) -> Vec<AnimationFrame> {
        list.iter().map(|&(name, d)| AnimationFrame::new(name, d)).collect()
    }

    fn animator() -> Animator {
        let mut animator = Animator::default();
        animator
            .insert_state("move", frames(&[("a", 100), ("b", 200)]))
            .unwrap();
        animator
            .insert_state("idle", frames(&[("c", 50)]))
            .unwrap();
        animator
    }

    #[test]
    fn test_update_without_state_is_noop() {
        let mut animator = animator();
        assert!(!animator.update(1_000));
        assert_eq!(animator.current_state(), None);
        assert_eq!(animator.current_frame(), None);
        assert_eq!(animator.elapsed(), 0);
        assert!(!animator.is_dirty());
    }

    #[test]
    fn test_frame_accurate_update() {
        let mut animator = animator();
        animator.set_state("move").unwrap();
        animator.clear_dirty();

        assert!(!animator.update(50));
        assert!(!animator.is_dirty());
        assert_eq!(animator.current_frame().unwrap().sub_texture, "a");

        // 110 >= 100
        assert!(animator.update(60));
        assert!(animator.is_dirty());
        assert_eq!(animator.current_frame().unwrap().sub_texture, "b");
        assert_eq!(animator.elapsed(), 10);
    }

    #[test]
    fn test_catch_up_update() {
        let mut animator = animator();
        animator.set_state("move").unwrap();

        // a(100) -> b(200) -> a(100) -> b with 100 left
        assert!(animator.update(500));
        assert_eq!(animator.current_frame_index(), 1);
        assert_eq!(animator.current_frame().unwrap().sub_texture, "b");
        assert_eq!(animator.elapsed(), 100);
    }

    #[test]
    fn test_catch_up_matches_small_steps() {
        let mut big = animator();
        let mut small = animator();
        big.set_state("move").unwrap();
        small.set_state("move").unwrap();
        big.update(12_345);
        for _ in 0..12_345 {
            small.update(1);
        }
        assert_eq!(big.current_frame_index(), small.current_frame_index());
        assert_eq!(big.elapsed(), small.elapsed());
    }

    #[test]
    fn test_set_same_state_keeps_timing() {
        let mut animator = animator();
        animator.set_state("move").unwrap();
        animator.update(150);
        animator.clear_dirty();

        animator.set_state("move").unwrap();
        assert_eq!(animator.current_frame_index(), 1);
        assert_eq!(animator.elapsed(), 50);
        assert!(!animator.is_dirty());
    }

    #[test]
    fn test_set_unknown_state() {
        let mut animator = animator();
        animator.set_state("idle").unwrap();
        let err = animator.set_state("jump").unwrap_err();
        assert!(matches!(err, Error::AnimationStateNotFound(name) if name == "jump"));
        assert_eq!(animator.current_state(), Some("idle"));
    }

    #[test]
    fn test_switch_back_resets_timing() {
        let mut animator = animator();
        animator.set_state("move").unwrap();
        animator.update(150);
        animator.set_state("idle").unwrap();
        animator.set_state("move").unwrap();
        assert_eq!(animator.current_frame_index(), 0);
        assert_eq!(animator.elapsed(), 0);
        assert!(animator.is_dirty());
    }

    #[test]
    fn test_overwrite_active_state_restarts() {
        let mut animator = animator();
        animator.set_state("move").unwrap();
        animator.update(150);
        animator.clear_dirty();

        animator
            .insert_state("move", frames(&[("x", 10), ("y", 10), ("z", 10)]))
            .unwrap();
        assert_eq!(animator.current_state(), Some("move"));
        assert_eq!(animator.current_frame().unwrap().sub_texture, "x");
        assert_eq!(animator.elapsed(), 0);
        assert!(animator.is_dirty());
    }

    #[test]
    fn test_invalid_frames() {
        let mut animator = Animator::default();
        assert!(matches!(
            animator.insert_state("empty", Vec::new()),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            animator.insert_state("stuck", frames(&[("a", 10), ("b", 0)])),
            Err(Error::Configuration(_))
        ));
        assert!(!animator.has_state("stuck"));
    }

    #[test]
    fn test_water_cycles_back_to_start() {
        let mut animator = Animator::default();
        animator
            .insert_state(
                "waterState",
                frames(&[
                    ("water1", 1_000_000_000),
                    ("water2", 1_000_000_000),
                    ("water3", 1_000_000_000),
                ]),
            )
            .unwrap();
        animator.set_state("waterState").unwrap();
        let start = animator.current_frame_index();

        let mut seen = Vec::new();
        for _ in 0..60 {
            animator.update(50_000_000);
            seen.push(animator.current_frame_index());
        }
        assert_eq!(animator.current_frame_index(), start);
        assert_eq!(seen[19], 1);
        assert_eq!(seen[39], 2);
    }
}
