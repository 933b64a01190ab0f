// Breadth-first relaxation of one light field around a changed voxel.
//
// Each visited voxel is re-derived from its own seed and its six neighbours:
//   light(v) = clamp(max(base(v), max_n light(n) + trough(n)), 0, 15)
// where trough(n) is the attenuation of the neighbour the light passes through.
// A voxel whose derived value differs from the stored one is rewritten and its
// neighbours join the next frontier. The flood ends on the first round that
// changes nothing. There is no retraction pass: stale light next to a removed
// source is only lowered where the re-derivation reaches it.

use crate::MAX_LIGHT;
use crate::terrain::{Pos, Terrain};

pub const NEIGHBORS: [Pos; 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LightKind {
    Block,
    Sun,
}

impl LightKind {
    #[inline]
    pub fn get<T: Terrain + ?Sized>(self, terrain: &T, x: i32, y: i32, z: i32) -> u8 {
        match self {
            LightKind::Block => terrain.block_light(x, y, z),
            LightKind::Sun => terrain.sun_light(x, y, z),
        }
    }

    #[inline]
    pub fn set<T: Terrain + ?Sized>(self, terrain: &T, x: i32, y: i32, z: i32, value: u8) {
        match self {
            LightKind::Block => terrain.set_block_light(x, y, z, value),
            LightKind::Sun => terrain.set_sun_light(x, y, z, value),
        }
    }

    /// Seed value injected at a voxel before neighbour contributions.
    #[inline]
    pub fn base<T: Terrain + ?Sized>(self, terrain: &T, x: i32, y: i32, z: i32) -> u8 {
        match self {
            LightKind::Block => block_base(terrain, x, y, z),
            LightKind::Sun => sun_base(terrain, x, y, z),
        }
    }
}

/// Emission of the voxel itself.
pub fn block_base<T: Terrain + ?Sized>(terrain: &T, x: i32, y: i32, z: i32) -> u8 {
    let b = terrain.block(x, y, z);
    terrain.block_type(b).light_emit(b.data).min(MAX_LIGHT)
}

/// Sky light reaching `(x, y, z)` straight down its column.
///
/// Starts at full light and walks from the column's highest occupied voxel down
/// to `z` inclusive, adding the trough of every solid, non-transparent voxel.
pub fn sun_base<T: Terrain + ?Sized>(terrain: &T, x: i32, y: i32, z: i32) -> u8 {
    let max = i32::from(MAX_LIGHT);
    let Some(top) = terrain.highest_block_z_at(x, y) else {
        return MAX_LIGHT;
    };
    let mut light = max;
    let mut zz = top;
    while zz >= z {
        if terrain.is_block_loaded(x, y, zz) {
            let b = terrain.block(x, y, zz);
            let ty = terrain.block_type(b);
            if ty.occludes_sky(b.data) {
                light = (light + ty.light_trough(b.data)).clamp(0, max);
            }
        }
        zz -= 1;
    }
    light as u8
}

/// Value the relaxation would store at `(x, y, z)` given its current neighbours.
///
/// Light leaving a neighbour is attenuated by that neighbour's trough, so an
/// opaque voxel next to a source is itself lit but passes nothing onward:
/// `max(base, max_n light(n) + trough(n))`, clamped to `0..=MAX_LIGHT`.
pub fn candidate<T: Terrain + ?Sized>(terrain: &T, kind: LightKind, x: i32, y: i32, z: i32) -> u8 {
    let max = i32::from(MAX_LIGHT);
    let mut best = i32::from(kind.base(terrain, x, y, z));
    for (dx, dy, dz) in NEIGHBORS {
        let (nx, ny, nz) = (x + dx, y + dy, z + dz);
        if !terrain.is_block_loaded(nx, ny, nz) {
            continue;
        }
        let nb = terrain.block(nx, ny, nz);
        let through = i32::from(kind.get(terrain, nx, ny, nz)) + terrain.block_type(nb).light_trough(nb.data);
        best = best.max(through);
    }
    best.clamp(0, max) as u8
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FloodStats {
    pub rounds: u32,
    pub visited: u64,
    pub changed: u64,
}

impl FloodStats {
    pub fn accumulate(&mut self, other: FloodStats) {
        self.rounds += other.rounds;
        self.visited += other.visited;
        self.changed += other.changed;
    }
}

/// Reusable double-buffered frontier.
#[derive(Debug, Default)]
pub struct Flood {
    current: Vec<Pos>,
    next: Vec<Pos>,
}

impl Flood {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relax `kind` outward from `origin` until no voxel changes.
    pub fn relax<T: Terrain + ?Sized>(&mut self, terrain: &T, kind: LightKind, origin: Pos) -> FloodStats {
        let mut stats = FloodStats::default();
        self.current.clear();
        self.next.clear();
        self.current.push(origin);
        while !self.current.is_empty() {
            stats.rounds += 1;
            for &(x, y, z) in &self.current {
                stats.visited += 1;
                if !terrain.is_block_loaded(x, y, z) {
                    continue;
                }
                let value = candidate(terrain, kind, x, y, z);
                if value == kind.get(terrain, x, y, z) {
                    continue;
                }
                kind.set(terrain, x, y, z, value);
                stats.changed += 1;
                for (dx, dy, dz) in NEIGHBORS {
                    self.next.push((x + dx, y + dy, z + dz));
                }
            }
            std::mem::swap(&mut self.current, &mut self.next);
            self.next.clear();
        }
        stats
    }

    /// Block light pass, then sun light pass.
    pub fn settle<T: Terrain + ?Sized>(&mut self, terrain: &T, origin: Pos) -> (FloodStats, FloodStats) {
        let block = self.relax(terrain, LightKind::Block, origin);
        let sun = self.relax(terrain, LightKind::Sun, origin);
        (block, sun)
    }
}
