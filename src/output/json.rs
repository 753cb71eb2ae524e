use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::atlas::{PixelDepth, PixelStore};
use crate::error::MosaicError;
use crate::output::atlas_png_filename;
use crate::sprite::{PackedSprite, SpriteSheet};

#[derive(Serialize)]
struct JsonOutput {
    meta: Meta,
    atlas: JsonAtlas,
}

#[derive(Serialize)]
struct Meta {
    app: &'static str,
    version: &'static str,
    format: &'static str,
}

#[derive(Serialize)]
struct JsonAtlas {
    image: String,
    size: Size,
    /// Number of times the atlas grew while packing
    grows: u64,
    occupancy: f64,
    sprites: Vec<JsonSprite>,
}

#[derive(Serialize)]
struct Size {
    w: u32,
    h: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSprite {
    name: String,
    frame: Frame,
    uv: Uv,
    trimmed: bool,
    sprite_source_size: Frame,
    source_size: Size,
}

#[derive(Serialize)]
struct Frame {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

#[derive(Serialize)]
struct Uv {
    u0: f32,
    v0: f32,
    u1: f32,
    v1: f32,
}

fn format_name(depth: PixelDepth) -> &'static str {
    match depth {
        PixelDepth::Alpha => "a8",
        PixelDepth::Rgb => "rgb888",
        PixelDepth::Rgba => "rgba8888",
    }
}

fn build_output<S: PixelStore>(sheet: &SpriteSheet<S>, base_name: &str) -> JsonOutput {
    let atlas = sheet.atlas();
    JsonOutput {
        meta: Meta {
            app: "mosaic",
            version: env!("CARGO_PKG_VERSION"),
            format: format_name(atlas.depth()),
        },
        atlas: JsonAtlas {
            image: atlas_png_filename(base_name),
            size: Size {
                w: atlas.width(),
                h: atlas.height(),
            },
            grows: atlas.generation(),
            occupancy: atlas.occupancy(),
            sprites: sheet.packed().iter().map(sprite_to_json).collect(),
        },
    }
}

/// Write JSON metadata file next to the atlas image
pub fn write_json<S: PixelStore>(
    sheet: &SpriteSheet<S>,
    output_dir: &Path,
    base_name: &str,
) -> Result<()> {
    let output = build_output(sheet, base_name);

    let json_path = output_dir.join(format!("{}.json", base_name));
    let content = serde_json::to_string_pretty(&output)?;

    fs::write(&json_path, content).map_err(|e| MosaicError::OutputWrite {
        path: json_path,
        source: e,
    })?;

    Ok(())
}

fn sprite_to_json(sprite: &PackedSprite) -> JsonSprite {
    let trim = &sprite.trim_info;
    let [u0, v0, u1, v1] = sprite.uv;

    JsonSprite {
        name: sprite.name.clone(),
        frame: Frame {
            x: sprite.x,
            y: sprite.y,
            w: sprite.width,
            h: sprite.height,
        },
        uv: Uv { u0, v0, u1, v1 },
        trimmed: trim.was_trimmed(),
        sprite_source_size: Frame {
            x: trim.offset_x,
            y: trim.offset_y,
            w: trim.trimmed_width,
            h: trim.trimmed_height,
        },
        source_size: Size {
            w: trim.source_width,
            h: trim.source_height,
        },
    }
}
