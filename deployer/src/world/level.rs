// minetile_deployer/deployer/src/world/level.rs
use crate::core::config::GameRules;
use crate::core::constants::LEVEL_VERSION;
use crate::core::types::TileCoord;
use crate::nbt::{Compound, Document, List, Tag, TagKind};

/// `MineTile_x<x>_z<z>`
pub fn level_name(tile: TileCoord) -> String {
    format!("MineTile_x{}_z{}", tile.x, tile.z)
}

/// Builds the metadata document of one tile from the source world's metadata.
///
/// The source `Data` compound is copied (never mutated), then stamped with the
/// tile's name and a void flat generator so the tile server cannot generate terrain
/// outside the copied chunks. With `game_rules`, the tile's `GameRules` compound is
/// the source rules overlaid with the overrides.
pub fn build_tile_level(source: Option<&Document>, tile: TileCoord, game_rules: Option<&GameRules>) -> Document {
    let mut data = source
        .and_then(|doc| doc.root.get_compound("Data"))
        .cloned()
        .unwrap_or_default();

    data.insert("version", LEVEL_VERSION);
    data.insert("LevelName", level_name(tile));
    data.insert("generatorName", "flat");
    data.insert("MapFeatures", 0i8);
    data.insert("generatorOptions", void_generator_options());

    if let Some(overrides) = game_rules {
        // A non-compound `GameRules` is replaced; an existing one keeps its position.
        let mut rules = data.get_compound("GameRules").cloned().unwrap_or_default();
        for (name, value) in overrides {
            rules.insert(name.as_str(), value.as_str());
        }
        data.insert("GameRules", rules);
    }

    let mut root = Compound::new();
    root.insert("Data", data);
    Document::new("", root)
}

/// One layer of air over the void biome, no structures.
fn void_generator_options() -> Compound {
    let mut layer = Compound::new();
    layer.insert("block", "minecraft:air");
    layer.insert("height", 1i8);

    let layers = List::from_parts(TagKind::Compound, vec![Tag::Compound(layer)]);

    let mut options = Compound::new();
    options.insert("layers", layers);
    options.insert("biome", "minecraft:the_void");
    options.insert("structures", Compound::new());
    options
}
