//! Player and enemy entities
//!
//! Both share one representation: a sprite-backed box that moves by
//! `direction * speed * frame scale`.

use glam::Vec2;
use rand::Rng;

use super::collision::Aabb;
use super::draw::DrawCommand;
use super::zones::Band;
use crate::assets::Sprite;

/// Smallest allowed entity dimension (px)
const MIN_DIMENSION: f32 = 1.0;

/// A positioned, sized sprite with a fixed speed
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Top-left corner
    pub pos: Vec2,
    /// Width and height, always positive
    pub size: Vec2,
    /// Speed multiplier applied to direction components
    pub speed: f32,
    pub sprite: Sprite,
}

impl Entity {
    pub fn new(sprite: Sprite, pos: Vec2, size: Vec2, speed: f32) -> Self {
        let clamped = size.max(Vec2::splat(MIN_DIMENSION));
        if clamped != size {
            log::error!(
                "{} entity size {:?} is not positive, clamping to {:?}",
                sprite.as_str(),
                size,
                clamped
            );
        }
        Self {
            pos,
            size: clamped,
            speed,
            sprite,
        }
    }

    /// Create an enemy just off the left edge, somewhere inside `band`
    ///
    /// Speed is drawn uniformly from `[min_speed, max_speed]` and fixed for
    /// the enemy's lifetime.
    pub fn spawn_enemy<R: Rng + ?Sized>(
        rng: &mut R,
        band: Band,
        size: Vec2,
        min_speed: f32,
        max_speed: f32,
    ) -> Self {
        let lowest = band.bottom - size.y;
        let y = if lowest > band.top {
            rng.random_range(band.top..=lowest)
        } else {
            band.top
        };
        let speed = if max_speed > min_speed {
            rng.random_range(min_speed..=max_speed)
        } else {
            min_speed
        };
        Self::new(Sprite::Enemy, Vec2::new(-size.x, y), size, speed)
    }

    pub fn x(&self) -> f32 {
        self.pos.x
    }

    pub fn y(&self) -> f32 {
        self.pos.y
    }

    pub fn width(&self) -> f32 {
        self.size.x
    }

    pub fn height(&self) -> f32 {
        self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    pub fn cx(&self) -> f32 {
        self.center().x
    }

    pub fn cy(&self) -> f32 {
        self.center().y
    }

    pub fn set_pos(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    /// Translate by `(dx, dy) * speed * scale`
    pub fn move_by(&mut self, dx: f32, dy: f32, scale: f32) {
        self.pos += Vec2::new(dx, dy) * self.speed * scale;
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_corner(self.pos, self.size)
    }

    pub fn collides_with(&self, other: &Entity) -> bool {
        self.bounds().overlaps(&other.bounds())
    }

    /// True if this entity overlaps any member of `others`
    pub fn collides_with_any<'a, I>(&self, others: I) -> bool
    where
        I: IntoIterator<Item = &'a Entity>,
    {
        let bounds = self.bounds();
        others.into_iter().any(|o| bounds.overlaps(&o.bounds()))
    }

    pub fn draw(&self) -> DrawCommand {
        DrawCommand::Sprite {
            sprite: self.sprite,
            x: self.pos.x,
            y: self.pos.y,
            width: self.size.x,
            height: self.size.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn player_at(x: f32, y: f32) -> Entity {
        Entity::new(Sprite::Character, Vec2::new(x, y), Vec2::new(40.0, 40.0), 2.0)
    }

    #[test]
    fn test_move_scales_by_speed_and_frame() {
        let mut e = player_at(100.0, 100.0);
        e.move_by(1.0, -1.0, 0.5);
        assert_eq!(e.pos, Vec2::new(101.0, 99.0));
        e.move_by(0.0, 0.0, 10.0);
        assert_eq!(e.pos, Vec2::new(101.0, 99.0));
    }

    #[test]
    fn test_center() {
        let e = player_at(10.0, 20.0);
        assert_eq!(e.cx(), 30.0);
        assert_eq!(e.cy(), 40.0);
    }

    #[test]
    fn test_non_positive_size_is_clamped() {
        let e = Entity::new(Sprite::Enemy, Vec2::ZERO, Vec2::new(0.0, -5.0), 1.0);
        assert!(e.width() > 0.0);
        assert!(e.height() > 0.0);
    }

    #[test]
    fn test_collides_with_any() {
        let p = player_at(0.0, 0.0);
        let far = player_at(500.0, 500.0);
        let near = player_at(30.0, 30.0);
        assert!(!p.collides_with_any([&far]));
        assert!(p.collides_with_any([&far, &near]));
        assert!(!p.collides_with_any(std::iter::empty()));
    }

    #[test]
    fn test_spawn_enemy_within_band() {
        let mut rng = Pcg32::seed_from_u64(7);
        let band = Band {
            top: 100.0,
            bottom: 500.0,
        };
        let size = Vec2::new(60.0, 40.0);
        for _ in 0..200 {
            let e = Entity::spawn_enemy(&mut rng, band, size, 2.0, 5.0);
            assert_eq!(e.x(), -60.0);
            assert!(e.y() >= band.top && e.y() <= band.bottom - size.y);
            assert!(e.speed >= 2.0 && e.speed <= 5.0);
            assert_eq!(e.sprite, Sprite::Enemy);
        }
    }

    #[test]
    fn test_spawn_enemy_narrow_band_and_fixed_speed() {
        let mut rng = Pcg32::seed_from_u64(1);
        let band = Band {
            top: 100.0,
            bottom: 120.0,
        };
        let e = Entity::spawn_enemy(&mut rng, band, Vec2::new(60.0, 40.0), 3.0, 3.0);
        assert_eq!(e.y(), 100.0);
        assert_eq!(e.speed, 3.0);
    }

    #[test]
    fn test_draw_matches_position() {
        let e = player_at(5.0, 6.0);
        assert_eq!(
            e.draw(),
            DrawCommand::Sprite {
                sprite: Sprite::Character,
                x: 5.0,
                y: 6.0,
                width: 40.0,
                height: 40.0
            }
        );
    }
}
