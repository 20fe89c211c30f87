//! Spawn-position providers for newly created vertices

use std::collections::VecDeque;
use std::f32::consts::PI;

use crate::model::Vec2;

/// Supplies a world coordinate for a new vertex. `None` makes creation fail.
pub trait SpawnPositionProvider: Send {
    fn next(&mut self) -> Option<Vec2>;
}

/// Deterministic sunflower spiral around the origin. Never exhausts.
#[derive(Debug, Clone)]
pub struct SpiralSpawner {
    spawned: u32,
    spacing: f32,
}

impl SpiralSpawner {
    pub fn new(spacing: f32) -> Self {
        SpiralSpawner { spawned: 0, spacing }
    }
}

impl Default for SpiralSpawner {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SpawnPositionProvider for SpiralSpawner {
    fn next(&mut self) -> Option<Vec2> {
        let golden_angle = PI * (3.0 - 5f32.sqrt());
        let n = self.spawned as f32 + 1.0;
        let angle = n * golden_angle;
        let radius = self.spacing * n.sqrt();
        self.spawned = self.spawned.wrapping_add(1);
        Some(Vec2::new(radius * angle.cos(), radius * angle.sin()))
    }
}

/// Hands out a fixed list of positions, then reports exhaustion.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSpawner {
    queue: VecDeque<Vec2>,
}

impl ScriptedSpawner {
    pub fn new(positions: impl IntoIterator<Item = Vec2>) -> Self {
        ScriptedSpawner {
            queue: positions.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl SpawnPositionProvider for ScriptedSpawner {
    fn next(&mut self) -> Option<Vec2> {
        self.queue.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spiral_positions_are_distinct_and_nonzero() {
        let mut spawner = SpiralSpawner::default();
        let a = spawner.next().unwrap();
        let b = spawner.next().unwrap();
        assert_ne!(a, b);
        assert!(a.length() > 0.0);
        assert!(b.length() > a.length());
    }

    #[test]
    fn scripted_spawner_exhausts() {
        let mut spawner = ScriptedSpawner::new([Vec2::new(1.0, 2.0)]);
        assert_eq!(spawner.next(), Some(Vec2::new(1.0, 2.0)));
        assert_eq!(spawner.next(), None);
        assert_eq!(spawner.remaining(), 0);
    }
}
