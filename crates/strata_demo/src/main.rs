mod assets;
mod components;
mod config;

use assets::{builtin_content, TextureSet};
use components::{
    spawn_asteroid, AsteroidSize, Collisions, Gun, Motion, Score, ScoreFont, Ship, Sprite,
    Transform,
};
use config::{layers, GameConfig, GAME_SCENE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_engine::foundation::logging;
use strata_engine::prelude::*;

fn main() {
    if let Err(e) = run() {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), EngineError> {
    let path = std::env::args().nth(1);
    let config = GameConfig::load_or_default(path.as_deref())?;
    logging::init_with_level(&config.engine.log_level);
    log::info!("Starting asteroid field ({} frames)", config.gameplay.frames);

    let mut manager = SceneManager::from_config(config.engine.clone())?;
    let mut cache = TextureCache::new();
    let textures = TextureSet::load(&mut cache, &mut builtin_content())?;

    let scene = manager
        .scene(GAME_SCENE)
        .ok_or_else(|| EcsError::NotFound { what: format!("scene '{GAME_SCENE}'") })?;
    populate(&scene, &config, textures)?;

    let mut batch = RecordingBatch::new();
    let mut timer = Timer::new();
    for _ in 0..config.gameplay.frames {
        batch.clear();
        manager.tick(config.gameplay.frame_delta, &mut batch);
        timer.update();
    }

    let stats = manager.stats();
    log::info!(
        "Ran {} frames in {:.2}s ({:.0} fps), {} entities alive, last frame drew {} sprites",
        stats.frame_count,
        timer.total_time(),
        timer.average_fps(),
        stats.entity_count,
        batch.call_count()
    );

    let score = scene
        .first_of_type::<Score>()
        .and_then(|score| score.with::<Score, _>(|score| score.value))
        .unwrap_or(0);
    let shots = scene
        .first_of_type::<Gun>()
        .and_then(|gun| gun.with::<Gun, _>(|gun| gun.shots()))
        .unwrap_or(0);
    let hits = scene
        .first_of_type::<Collisions>()
        .and_then(|collisions| collisions.with::<Collisions, _>(|collisions| collisions.hits()))
        .unwrap_or(0);
    log::info!("Final score: {} ({} hits from {} shots)", score, hits, shots);
    Ok(())
}

fn layer(scene: &Scene, name: &str) -> EcsResult<Layer> {
    scene
        .layer(name)
        .ok_or_else(|| EcsError::NotFound { what: format!("layer '{name}'") })
}

/// Fill the gameplay scene with the backdrop, ship, asteroids and score
fn populate(scene: &Scene, config: &GameConfig, textures: TextureSet) -> EcsResult<()> {
    let gameplay = &config.gameplay;
    let bounds = Rect::new(
        -gameplay.half_width,
        -gameplay.half_height,
        gameplay.half_width * 2.0,
        gameplay.half_height * 2.0,
    );
    let mut rng = StdRng::seed_from_u64(gameplay.seed);

    let background = layer(scene, layers::BACKGROUND)?;
    let stars = Entity::with_name(&background, "stars")?;
    stars.add_component(Transform::at(Vec2::zeros()))?;
    stars.add_component(Sprite::new(textures.stars))?;

    let field = layer(scene, layers::FIELD)?;
    let ship = Entity::with_name(&field, "ship")?;
    ship.set_depth(-1);
    ship.add_component(Transform::at(Vec2::zeros()))?;
    ship.add_component(Motion {
        linear: Vec2::zeros(),
        angular: gameplay.ship_rotation_speed,
    })?;
    ship.add_component(Ship)?;
    ship.add_component(Gun::new(
        gameplay.fire_interval,
        gameplay.bullet_speed,
        gameplay.bullet_lifetime,
        textures.bullet,
    ))?;
    ship.add_component(Sprite::new(textures.ship))?;

    for _ in 0..gameplay.asteroid_count {
        let position = Vec2::new(
            rng.gen_range(bounds.x..bounds.x + bounds.width),
            rng.gen_range(bounds.y..bounds.y + bounds.height),
        );
        spawn_asteroid(&field, AsteroidSize::Large, position, bounds, &mut rng, &textures)?;
    }

    let referee = Entity::with_name(&field, "collisions")?;
    referee.add_component(Collisions::new(field.clone(), textures, bounds, rng))?;

    let hud = layer(scene, layers::HUD)?;
    let score = Entity::with_name(&hud, "score")?;
    score.add_component(Transform::at(Vec2::new(16.0, 16.0)))?;
    score.add_component(Score::default())?;
    score.add_component(ScoreFont(textures.font))?;

    log::debug!("Populated scene '{}' with {} entities", scene.name(), scene.entity_count());
    Ok(())
}
