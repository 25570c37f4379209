//! Periodic enemy spawning

use glam::Vec2;
use rand::Rng;

use super::arena::{Arena, EnemyId};
use super::entity::Entity;
use super::zones::Band;

/// Spawns one enemy every `rate` frames, starting at frame 0
#[derive(Debug, Clone)]
pub struct Spawner {
    /// Frames between spawns (never zero)
    pub rate: u64,
    pub enemy_size: Vec2,
    pub min_speed: f32,
    pub max_speed: f32,
}

impl Spawner {
    pub fn new(rate: u64, enemy_size: Vec2, min_speed: f32, max_speed: f32) -> Self {
        Self {
            rate: rate.max(1),
            enemy_size,
            min_speed,
            max_speed,
        }
    }

    pub fn is_spawn_frame(&self, count: u64) -> bool {
        count.is_multiple_of(self.rate)
    }

    /// Run the spawn policy for one frame
    pub fn run<R: Rng + ?Sized>(
        &self,
        count: u64,
        rng: &mut R,
        band: Band,
        enemies: &mut Arena<Entity>,
    ) -> Option<EnemyId> {
        if !self.is_spawn_frame(count) {
            return None;
        }
        let enemy = Entity::spawn_enemy(rng, band, self.enemy_size, self.min_speed, self.max_speed);
        let id = enemies.insert(enemy);
        log::trace!("Spawned enemy {:?} at frame {}", id, count);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn band() -> Band {
        Band {
            top: 105.0,
            bottom: 495.0,
        }
    }

    #[test]
    fn test_spawns_on_multiples_including_zero() {
        let spawner = Spawner::new(50, Vec2::new(60.0, 40.0), 1.0, 3.0);
        let mut rng = Pcg32::seed_from_u64(3);
        let mut enemies = Arena::new();
        for count in 0..=150 {
            spawner.run(count, &mut rng, band(), &mut enemies);
        }
        // frames 0, 50, 100, 150
        assert_eq!(enemies.len(), 4);
    }

    #[test]
    fn test_half_open_run_spawns_three() {
        let spawner = Spawner::new(50, Vec2::new(60.0, 40.0), 1.0, 3.0);
        let mut rng = Pcg32::seed_from_u64(3);
        let mut enemies = Arena::new();
        for count in 0..150 {
            spawner.run(count, &mut rng, band(), &mut enemies);
        }
        assert_eq!(enemies.len(), 3);
    }

    #[test]
    fn test_zero_rate_is_clamped() {
        let spawner = Spawner::new(0, Vec2::new(60.0, 40.0), 1.0, 3.0);
        assert_eq!(spawner.rate, 1);
        assert!(spawner.is_spawn_frame(7));
    }

    #[test]
    fn test_ids_are_unique() {
        let spawner = Spawner::new(1, Vec2::new(60.0, 40.0), 1.0, 3.0);
        let mut rng = Pcg32::seed_from_u64(9);
        let mut enemies = Arena::new();
        let ids: Vec<_> = (0..10)
            .filter_map(|c| spawner.run(c, &mut rng, band(), &mut enemies))
            .collect();
        let mut unique = ids.clone();
        unique.dedup();
        assert_eq!(ids.len(), 10);
        assert_eq!(unique.len(), 10);
    }
}
