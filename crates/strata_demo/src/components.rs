//! Game-specific components

use crate::assets::{TextureSet, GLYPH_SIZE};
use rand::rngs::StdRng;
use rand::Rng;
use strata_engine::component_type;
use strata_engine::prelude::*;

/// Position, rotation and uniform scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// World position
    pub position: Vec2,
    /// Rotation in radians
    pub rotation: f32,
    /// Uniform scale
    pub scale: f32,
}

impl Transform {
    /// Unrotated, unscaled transform at `position`
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            rotation: 0.0,
            scale: 1.0,
        }
    }

    /// Unit vector the transform is facing
    pub fn forward(&self) -> Vec2 {
        Vec2::new(self.rotation.cos(), self.rotation.sin())
    }
}

impl Component for Transform {}
component_type!(Transform);

/// Read the transform of `entity`, if it has one
pub fn transform_of(entity: &Entity) -> Option<Transform> {
    let component = entity.try_get::<Transform>()?;
    let transform = *component.borrow::<Transform>()?;
    Some(transform)
}

/// Anything that takes part in collision tests
pub trait Collider: Component {
    /// Collision radius at scale 1
    fn radius(&self) -> f32;
}

/// Colliders that score points when shot
pub trait Hazard: Collider {
    /// Size category
    fn size(&self) -> AsteroidSize;

    /// Points awarded when destroyed
    fn points(&self) -> u32 {
        self.size().points()
    }
}

/// Player ship
#[derive(Debug, Clone, Default)]
pub struct Ship;

impl Component for Ship {
    fn initialize(&mut self, entity: &Entity) {
        entity.add_tag("player");
    }
}

impl Collider for Ship {
    fn radius(&self) -> f32 {
        14.0
    }
}

component_type!(Ship: dyn Collider);

/// Asteroid size categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsteroidSize {
    /// Large asteroid (splits into medium)
    Large,

    /// Medium asteroid (splits into small)
    Medium,

    /// Small asteroid (destroyed completely)
    Small,
}

impl AsteroidSize {
    /// Get the scale factor for this size
    pub fn scale_factor(self) -> f32 {
        match self {
            Self::Large => 2.0,
            Self::Medium => 1.5,
            Self::Small => 1.0,
        }
    }

    /// Get the points awarded for destroying this size
    pub fn points(self) -> u32 {
        match self {
            Self::Large => 20,
            Self::Medium => 50,
            Self::Small => 100,
        }
    }

    /// Get the next smaller size when split
    pub fn split_into(self) -> Option<Self> {
        match self {
            Self::Large => Some(Self::Medium),
            Self::Medium => Some(Self::Small),
            Self::Small => None,
        }
    }
}

/// Asteroid component
#[derive(Debug, Clone)]
pub struct Asteroid {
    /// Asteroid size category
    pub size: AsteroidSize,
}

impl Component for Asteroid {
    fn initialize(&mut self, entity: &Entity) {
        entity.add_tag("asteroid");
    }
}

impl Collider for Asteroid {
    fn radius(&self) -> f32 {
        12.0 * self.size.scale_factor()
    }
}

impl Hazard for Asteroid {
    fn size(&self) -> AsteroidSize {
        self.size
    }
}

component_type!(Asteroid: dyn Hazard, dyn Collider);

/// Bullet projectile; destroys its entity when its lifetime runs out
#[derive(Debug, Clone)]
pub struct Bullet {
    /// Remaining lifetime in seconds
    pub lifetime: f32,
}

impl Component for Bullet {
    fn initialize(&mut self, entity: &Entity) {
        entity.add_tag("bullet");
    }

    fn update(&mut self, entity: &Entity, time: &FrameTime) {
        self.lifetime -= time.delta;
        if self.lifetime <= 0.0 {
            entity.destroy_entity();
        }
    }
}

impl Collider for Bullet {
    fn radius(&self) -> f32 {
        2.0
    }
}

component_type!(Bullet: dyn Collider);

/// Linear and angular velocity, integrated on the fixed step
#[derive(Debug, Clone, Default)]
pub struct Motion {
    /// Linear velocity
    pub linear: Vec2,
    /// Angular velocity in radians per second
    pub angular: f32,
}

impl Component for Motion {
    fn fixed_update(&mut self, entity: &Entity, time: &FrameTime) {
        let Some(transform) = entity.try_get::<Transform>() else {
            return;
        };
        transform.with::<Transform, _>(|transform| {
            transform.position += self.linear * time.fixed_delta;
            transform.rotation += self.angular * time.fixed_delta;
        });
    }
}

component_type!(Motion);

/// Wraps the entity's position to the play field
#[derive(Debug, Clone)]
pub struct WrapAround {
    /// Play field
    pub bounds: Rect,
}

impl Component for WrapAround {
    fn fixed_update(&mut self, entity: &Entity, _time: &FrameTime) {
        let Some(transform) = entity.try_get::<Transform>() else {
            return;
        };
        let Some(mut transform) = transform.borrow_mut::<Transform>() else {
            return;
        };
        let bounds = self.bounds;
        transform.position.x = wrap(transform.position.x, bounds.x, bounds.x + bounds.width);
        transform.position.y = wrap(transform.position.y, bounds.y, bounds.y + bounds.height);
    }
}

component_type!(WrapAround);

fn wrap(value: f32, min: f32, max: f32) -> f32 {
    let span = max - min;
    if span <= 0.0 {
        return value;
    }
    min + (value - min).rem_euclid(span)
}

/// Draws one texture at the entity's transform
#[derive(Debug, Clone)]
pub struct Sprite {
    /// Texture to draw
    pub texture: TextureHandle,
    /// Tint
    pub color: Color,
}

impl Sprite {
    /// Untinted sprite
    pub fn new(texture: TextureHandle) -> Self {
        Self {
            texture,
            color: Color::WHITE,
        }
    }
}

impl Component for Sprite {
    fn draw(&mut self, entity: &Entity, batch: &mut dyn DrawBatch) {
        let transform = transform_of(entity).unwrap_or_else(|| Transform::at(Vec2::zeros()));
        batch.draw(
            DrawCall::new(self.texture, transform.position)
                .with_color(self.color)
                .with_rotation(transform.rotation, Vec2::new(0.5, 0.5))
                .with_scale(Vec2::new(transform.scale, transform.scale))
                .with_depth(entity.depth() as f32),
        );
    }
}

component_type!(Sprite);

/// Fires bullets along the entity's facing
#[derive(Debug, Clone)]
pub struct Gun {
    /// Seconds between shots
    pub interval: f32,
    /// Bullet speed
    pub speed: f32,
    /// Bullet lifetime
    pub lifetime: f32,
    /// Bullet texture
    pub texture: TextureHandle,
    cooldown: f32,
    shots: u32,
}

impl Gun {
    /// Gun that fires immediately, then every `interval` seconds
    pub fn new(interval: f32, speed: f32, lifetime: f32, texture: TextureHandle) -> Self {
        Self {
            interval,
            speed,
            lifetime,
            texture,
            cooldown: 0.0,
            shots: 0,
        }
    }

    /// Bullets fired so far
    pub fn shots(&self) -> u32 {
        self.shots
    }

    fn fire(&self, entity: &Entity) -> EcsResult<Entity> {
        let layer = entity
            .layer()
            .ok_or_else(|| EcsError::NotFound { what: format!("layer of {entity}") })?;
        let origin = transform_of(entity).unwrap_or_else(|| Transform::at(Vec2::zeros()));

        let bullet = Entity::with_name(&layer, "bullet")?;
        bullet.set_depth(entity.depth() + 1);
        bullet.add_component(Transform {
            rotation: origin.rotation,
            ..Transform::at(origin.position)
        })?;
        bullet.add_component(Motion {
            linear: origin.forward() * self.speed,
            angular: 0.0,
        })?;
        bullet.add_component(Bullet {
            lifetime: self.lifetime,
        })?;
        bullet.add_component(Sprite::new(self.texture))?;
        Ok(bullet)
    }
}

impl Component for Gun {
    fn update(&mut self, entity: &Entity, time: &FrameTime) {
        self.cooldown -= time.delta;
        if self.cooldown > 0.0 {
            return;
        }
        self.cooldown += self.interval;
        match self.fire(entity) {
            Ok(_) => self.shots += 1,
            Err(error) => log::warn!("Gun on {} failed to fire: {}", entity, error),
        }
    }
}

component_type!(Gun);

/// Player score
#[derive(Debug, Clone, Default)]
pub struct Score {
    /// Current score
    pub value: u32,
}

impl Score {
    /// Add points to the score
    pub fn add_points(&mut self, points: u32) {
        self.value += points;
    }
}

impl Component for Score {
    fn draw(&mut self, entity: &Entity, batch: &mut dyn DrawBatch) {
        let Some(font) = entity
            .try_get::<ScoreFont>()
            .and_then(|font| font.borrow::<ScoreFont>().map(|font| font.0))
        else {
            return;
        };

        let origin = transform_of(entity).map_or_else(Vec2::zeros, |t| t.position);
        for (index, digit) in self.value.to_string().chars().enumerate() {
            let glyph = digit.to_digit(10).unwrap_or(0) as f32;
            let offset = Vec2::new(index as f32 * GLYPH_SIZE, 0.0);
            batch.draw(
                DrawCall::new(font, origin + offset)
                    .with_source(Rect::new(glyph * GLYPH_SIZE, 0.0, GLYPH_SIZE, GLYPH_SIZE)),
            );
        }
    }
}

component_type!(Score);

/// Glyph texture used by [`Score`]
#[derive(Debug, Clone, Copy)]
pub struct ScoreFont(pub TextureHandle);

impl Component for ScoreFont {}
component_type!(ScoreFont);

/// Resolves bullet hits against hazards on the field
pub struct Collisions {
    field: Layer,
    textures: TextureSet,
    bounds: Rect,
    rng: StdRng,
    hits: u32,
}

impl Collisions {
    /// Collision pass over `field`
    pub fn new(field: Layer, textures: TextureSet, bounds: Rect, rng: StdRng) -> Self {
        Self {
            field,
            textures,
            bounds,
            rng,
            hits: 0,
        }
    }

    /// Hazards destroyed so far
    pub fn hits(&self) -> u32 {
        self.hits
    }

    fn hazard_at(
        &self,
        bullet: Vec2,
        hazards: &[Entity],
    ) -> Option<(Entity, AsteroidSize, u32, Vec2)> {
        hazards.iter().filter(|h| !h.is_destroyed()).find_map(|hazard| {
            let transform = transform_of(hazard)?;
            let component = hazard.try_get::<dyn Hazard>()?;
            let (radius, size, points) = {
                let hazard = component.borrow_as::<dyn Hazard>()?;
                (hazard.radius(), hazard.size(), hazard.points())
            };
            let hit = (transform.position - bullet).norm() <= radius;
            hit.then(|| (hazard.clone(), size, points, transform.position))
        })
    }
}

impl Component for Collisions {
    fn fixed_update(&mut self, entity: &Entity, _time: &FrameTime) {
        let hazards = self.field.entities_with_tag("asteroid");
        for bullet in self.field.entities_with_tag("bullet") {
            let Some(position) = transform_of(&bullet).map(|t| t.position) else {
                continue;
            };
            let Some((hazard, size, points, at)) = self.hazard_at(position, &hazards) else {
                continue;
            };

            bullet.destroy_entity();
            hazard.destroy_entity();
            self.hits += 1;

            let score = entity.scene().and_then(|scene| scene.first_of_type::<Score>());
            if let Some(score) = score {
                score.with::<Score, _>(|score| score.add_points(points));
            }

            if let Some(smaller) = size.split_into() {
                for _ in 0..2 {
                    let spawned = spawn_asteroid(
                        &self.field,
                        smaller,
                        at,
                        self.bounds,
                        &mut self.rng,
                        &self.textures,
                    );
                    if let Err(error) = spawned {
                        log::warn!("Failed to split asteroid: {}", error);
                    }
                }
            }
        }
    }
}

component_type!(Collisions);

/// Spawn an asteroid drifting in a random direction
pub fn spawn_asteroid(
    layer: &Layer,
    size: AsteroidSize,
    position: Vec2,
    bounds: Rect,
    rng: &mut StdRng,
    textures: &TextureSet,
) -> EcsResult<Entity> {
    let angle: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
    let speed: f32 = rng.gen_range(20.0..80.0) / size.scale_factor();

    let asteroid = Entity::with_name(layer, "asteroid")?;
    asteroid.add_component(Transform {
        scale: size.scale_factor(),
        ..Transform::at(position)
    })?;
    asteroid.add_component(Motion {
        linear: Vec2::new(angle.cos(), angle.sin()) * speed,
        angular: rng.gen_range(-1.0..1.0),
    })?;
    asteroid.add_component(WrapAround { bounds })?;
    asteroid.add_component(Asteroid { size })?;
    asteroid.add_component(Sprite::new(textures.asteroid))?;
    Ok(asteroid)
}
