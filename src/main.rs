use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use bevy::{input::mouse::MouseWheel, prelude::*, sprite_render::Material2dPlugin};
use thiserror::Error;

mod config;
mod entities;
mod render;
mod tiles;
mod world;

use config::{ConfigError, GameConfig};
use entities::{motion, player, Actor, Player};
use render::{build_tile_table, TileAtlas, TileMaterial};
use tiles::{registry::RegistryError, TileRegistry};
use world::{
    serialization, streaming, BorderWallGenerator, SaveError, SaveGame, StreamingState, TileEdit,
    Tilemap, TilemapRenderer,
};

const ASSET_ROOT: &str = "assets";

/// World position where new players appear, just off the axis walls
const SPAWN_TILE: IVec2 = IVec2::new(8, 8);

// Multiplicative zoom bounds relative to the configured default
const ZOOM_MIN: f32 = 0.25;
const ZOOM_MAX: f32 = 4.0;
const ZOOM_STEP: f32 = 1.1;

#[derive(Debug, Error)]
enum BootstrapError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("failed to read tile definitions: {0}")]
    DefinitionsIo(std::io::Error),
    #[error("invalid tile definitions: {0}")]
    Definitions(#[from] RegistryError),
    #[error("tileset not found at {0}")]
    MissingTileset(PathBuf),
    #[error("save slot error: {0}")]
    Save(#[from] SaveError),
}

/// Everything main needs before the app can be built
struct Bootstrap {
    config: GameConfig,
    registry: TileRegistry,
    slot_dir: PathBuf,
    seed: String,
}

fn bootstrap() -> Result<Bootstrap, BootstrapError> {
    let config = GameConfig::load(&Path::new(ASSET_ROOT).join("config.json"))?;

    let definitions_path = Path::new(ASSET_ROOT).join(&config.definitions);
    let raw = fs::read_to_string(&definitions_path).map_err(BootstrapError::DefinitionsIo)?;
    let registry = TileRegistry::from_json(&raw)?;

    let tileset_path = Path::new(ASSET_ROOT).join(&config.tileset);
    if !tileset_path.exists() {
        return Err(BootstrapError::MissingTileset(tileset_path));
    }

    // Adopt the slot's recorded seed when it exists, so the config seed
    // only shapes worlds created from scratch
    let save_root = PathBuf::from(&config.save_root);
    let slot_dir = serialization::slot_directory(&save_root, &config.slot)?;
    let seed = match serialization::read_save_game(&slot_dir) {
        Ok(save) => save.seed,
        Err(SaveError::Io(_)) => {
            let save = SaveGame {
                name: config.slot.clone(),
                icon_sprite: [0, 0],
                seed: config.seed.clone(),
            };
            serialization::write_save_game(&save_root, &save)?;
            save.seed
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Bootstrap {
        config,
        registry,
        slot_dir,
        seed,
    })
}

fn main() {
    let boot = match bootstrap() {
        Ok(boot) => boot,
        Err(e) => {
            eprintln!("startup failed: {e}");
            process::exit(1);
        }
    };

    let atlas = TileAtlas::new(IVec2::new(
        boot.config.atlas_grid[0],
        boot.config.atlas_grid[1],
    ));
    let tilemap = Tilemap::new(Box::new(BorderWallGenerator), boot.seed);

    App::new()
        .add_plugins(DefaultPlugins.set(ImagePlugin::default_nearest()))
        .add_plugins(Material2dPlugin::<TileMaterial>::default())
        .insert_resource(boot.registry)
        .insert_resource(atlas)
        .insert_resource(tilemap)
        .insert_resource(StreamingState::new(
            boot.slot_dir,
            boot.config.stream_margin,
        ))
        .insert_resource(boot.config)
        .add_message::<TileEdit>()
        .add_systems(Startup, (setup_scene, setup_tile_material))
        .add_systems(
            Update,
            (
                (
                    player::player_input,
                    motion::apply_motion,
                    motion::sync_actor_transforms,
                    player::camera_follow,
                )
                    .chain(),
                (
                    streaming::apply_tile_edits,
                    streaming::stream_visible_chunks,
                    streaming::bake_stale_chunks,
                    streaming::evict_distant_chunks,
                )
                    .chain()
                    .after(player::camera_follow),
                streaming::autosave_modified_chunks,
                zoom_camera,
            ),
        )
        .run();
}

fn setup_scene(mut commands: Commands, assets: Res<AssetServer>, config: Res<GameConfig>) {
    // One world unit is one tile; scale the default pixel-sized camera
    // down so a tile covers the configured pixel footprint
    commands.spawn((
        Camera2d,
        Projection::Orthographic(OrthographicProjection {
            scale: 1.0 / config.pixels_per_tile,
            ..OrthographicProjection::default_2d()
        }),
        Transform::from_xyz(SPAWN_TILE.x as f32, SPAWN_TILE.y as f32, 999.0),
    ));

    commands.spawn((
        Sprite {
            image: assets.load("characters/player.png"),
            custom_size: Some(Vec2::ONE),
            ..default()
        },
        Transform::from_xyz(SPAWN_TILE.x as f32, SPAWN_TILE.y as f32, 10.0),
        Actor::at_tile(SPAWN_TILE)
            .with_step_duration(Duration::from_millis(config.motion_duration_ms)),
        Player,
    ));

    info!("Scene ready, player at {:?}", SPAWN_TILE);
}

fn setup_tile_material(
    mut commands: Commands,
    assets: Res<AssetServer>,
    mut materials: ResMut<Assets<TileMaterial>>,
    mut buffers: ResMut<Assets<bevy::render::storage::ShaderStorageBuffer>>,
    registry: Res<TileRegistry>,
    atlas: Res<TileAtlas>,
    config: Res<GameConfig>,
) {
    let material = materials.add(TileMaterial {
        tileset: assets.load(config.tileset.clone()),
        tiles: buffers.add(bevy::render::storage::ShaderStorageBuffer::from(
            build_tile_table(&registry, &atlas),
        )),
    });
    commands.insert_resource(TilemapRenderer { material });
    info!("Tile material ready, {} tiles defined", registry.len());
}

/// Scroll wheel and -/= keys zoom around the configured default
fn zoom_camera(
    mut scroll_events: MessageReader<MouseWheel>,
    keyboard: Res<ButtonInput<KeyCode>>,
    config: Res<GameConfig>,
    mut camera_query: Query<&mut Projection, With<Camera2d>>,
) {
    let Ok(mut projection) = camera_query.single_mut() else {
        return;
    };

    let mut factor = 1.0;
    for event in scroll_events.read() {
        factor *= if event.y > 0.0 {
            1.0 / ZOOM_STEP
        } else if event.y < 0.0 {
            ZOOM_STEP
        } else {
            1.0
        };
    }
    if keyboard.just_pressed(KeyCode::Minus) {
        factor *= ZOOM_STEP;
    }
    if keyboard.just_pressed(KeyCode::Equal) {
        factor /= ZOOM_STEP;
    }

    if factor != 1.0 {
        if let Projection::Orthographic(ref mut ortho) = projection.as_mut() {
            let base = 1.0 / config.pixels_per_tile;
            ortho.scale = (ortho.scale * factor).clamp(base * ZOOM_MIN, base * ZOOM_MAX);
        }
    }
}
