#![forbid(unsafe_code)]

mod config;

use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use log::info;
use serde::Serialize;
use strata_blocks::Block;
use strata_chunk::{ChunkTag, Pos};
use strata_lighting::{LightingEngine, Terrain};
use strata_world::{ChunkCoord, World, enqueue_box};

use crate::config::{DEFAULT_CONFIG, StrataConfig};

#[derive(Parser, Debug)]
#[command(name = "strata", about = "Build a small voxel world and light it")]
struct Args {
    /// TOML config with [layout], [lighting] and [[blocks]] (built-in defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    /// World extent in chunks along x and y, centred on the origin
    #[arg(long, default_value_t = 2)]
    chunks: i32,
    /// Ground fills z in 0..ground
    #[arg(long, default_value_t = 4)]
    ground: i32,
    /// Block used for the ground
    #[arg(long, default_value = "stone")]
    ground_block: String,
    /// Emitter placed at x,y,z (repeatable)
    #[arg(long = "emitter", value_parser = parse_pos)]
    emitters: Vec<Pos>,
    /// Block used for emitters
    #[arg(long, default_value = "torch")]
    emitter_block: String,
    /// Column printed after lighting, as x,y
    #[arg(long, value_parser = parse_column, default_value = "0,0")]
    column: (i32, i32),
    /// Write every chunk record as JSON
    #[arg(long)]
    dump: Option<PathBuf>,
}

fn parse_ints<const N: usize>(s: &str) -> Result<[i32; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {N} comma-separated integers, got '{s}'"));
    }
    let mut out = [0; N];
    for (slot, p) in out.iter_mut().zip(parts) {
        *slot = p.parse().map_err(|e| format!("'{p}': {e}"))?;
    }
    Ok(out)
}

fn parse_pos(s: &str) -> Result<Pos, String> {
    parse_ints::<3>(s).map(|[x, y, z]| (x, y, z))
}

fn parse_column(s: &str) -> Result<(i32, i32), String> {
    parse_ints::<2>(s).map(|[x, y]| (x, y))
}

#[derive(Serialize)]
struct ChunkDump<'a> {
    coord: ChunkCoord,
    tag: &'a ChunkTag,
}

fn named_block(world: &World, name: &str) -> Result<Block, Box<dyn Error>> {
    world
        .registry()
        .block_by_name(name)
        .ok_or_else(|| format!("block '{name}' is not defined").into())
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let cfg = match &args.config {
        Some(path) => {
            info!("loading config from {}", path.display());
            StrataConfig::from_path(path)?
        }
        None => StrataConfig::from_toml_str(DEFAULT_CONFIG)?,
    };
    let registry = cfg.registry()?;
    info!("{} block types, layout {:?}", registry.blocks.len(), cfg.layout);

    let world = Arc::new(World::new(cfg.layout, Arc::new(registry)));
    let half = args.chunks.max(1) / 2;
    let lo = -half;
    let hi = args.chunks.max(1) - half - 1;
    for cx in lo..=hi {
        for cy in lo..=hi {
            world.load_chunk(ChunkCoord::new(cx, cy, 0));
        }
    }
    let (sx, sy, sz) = cfg.layout.chunk_size();
    let min = (lo * sx, lo * sy, 0);
    let max = ((hi + 1) * sx - 1, (hi + 1) * sy - 1, sz - 1);
    info!("loaded {} chunks covering {:?}..={:?}", world.loaded_chunks().len(), min, max);

    if args.ground > 0 {
        let ground = named_block(&world, &args.ground_block)?;
        let top = args.ground.min(sz) - 1;
        world.fill_box((min.0, min.1, 0), (max.0, max.1, top), ground);
    }
    let emitter = named_block(&world, &args.emitter_block)?;
    for &(x, y, z) in &args.emitters {
        if !world.set_block(x, y, z, emitter) {
            log::warn!("emitter at ({x}, {y}, {z}) is outside the world");
        }
    }

    let start = Instant::now();
    let engine = LightingEngine::spawn(world.clone(), cfg.lighting.clone())?;
    let queued = enqueue_box(&engine.queue(), min, max)?;
    let report = engine.dispose();
    info!(
        "lit {} voxels in {:.2?}: processed={} discarded={} block={:?} sun={:?}",
        queued,
        start.elapsed(),
        report.processed,
        report.discarded,
        report.block,
        report.sun
    );

    let (cx, cy) = args.column;
    let out = std::io::stdout();
    let mut out = out.lock();
    writeln!(out, "column ({cx}, {cy}):")?;
    writeln!(out, "{:>5} {:>8} {:>5} {:>5}", "z", "block", "sun", "light")?;
    for z in (min.2..=max.2).rev() {
        let b = world.block(cx, cy, z);
        let name = &world.block_type(b).name;
        writeln!(
            out,
            "{:>5} {:>8} {:>5} {:>5}",
            z,
            name,
            world.sun_light(cx, cy, z),
            world.block_light(cx, cy, z)
        )?;
    }

    let uniform = world.compress();
    info!("{uniform} sections uniform after compression");

    if let Some(path) = &args.dump {
        let tags: Vec<(ChunkCoord, ChunkTag)> = world
            .loaded_chunks()
            .into_iter()
            .filter_map(|c| world.save_chunk(c).map(|t| (c, t)))
            .collect();
        let dump: Vec<ChunkDump> = tags.iter().map(|(coord, tag)| ChunkDump { coord: *coord, tag }).collect();
        let mut w = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut w, &dump)?;
        w.flush()?;
        info!("wrote {} chunk records to {}", dump.len(), path.display());
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
