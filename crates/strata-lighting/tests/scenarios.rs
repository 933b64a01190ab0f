mod common;

use common::GridTerrain;
use proptest::prelude::*;
use strata_lighting::{Flood, LightKind, Terrain, candidate};

#[test]
fn open_column_is_fully_sunlit() {
    let t = GridTerrain::column(20, 0);
    let mut flood = Flood::new();
    let (block, sun) = flood.settle(&t, (0, 0, 10));
    for z in 0..=20 {
        assert_eq!(t.sun_light(0, 0, z), 15, "sun at z={z}");
        assert_eq!(t.block_light(0, 0, z), 0, "block light at z={z}");
    }
    assert_eq!(block.changed, 0);
    assert_eq!(sun.changed, 21);
}

#[test]
fn opaque_block_shadows_column() {
    let t = GridTerrain::column(20, 0);
    t.set_named(0, 0, 15, "stone");
    let mut flood = Flood::new();
    for z in 0..=20 {
        flood.settle(&t, (0, 0, z));
    }
    for z in 0..=20 {
        let expect = if z >= 15 { 15 } else { 0 };
        assert_eq!(t.sun_light(0, 0, z), expect, "sun at z={z}");
    }
}

#[test]
fn emitter_falls_off_by_manhattan_distance() {
    let t = GridTerrain::with_air_trough((-8, -8, -8), (8, 8, 8), -1);
    t.set_named(0, 0, 0, "lamp");
    let mut flood = Flood::new();
    let stats = flood.relax(&t, LightKind::Block, (0, 0, 0));
    assert!(stats.rounds > 15);
    for (x, y, z) in t.positions().collect::<Vec<_>>() {
        let d = x.abs() + y.abs() + z.abs();
        assert_eq!(i32::from(t.block_light(x, y, z)), (15 - d).max(0), "at ({x},{y},{z})");
    }
}

#[test]
fn settled_field_is_a_fixed_point() {
    let t = GridTerrain::with_air_trough((-4, -4, 0), (4, 4, 12), -1);
    for x in -4..=4 {
        for y in -4..=4 {
            t.set_named(x, y, 9, "stone");
        }
    }
    // Hole in the roof
    t.set_block(0, 0, 9, strata_blocks::Block::AIR);
    t.set_named(2, -3, 2, "lamp");
    let mut flood = Flood::new();
    flood.settle(&t, (2, -3, 2));
    for p in t.positions().collect::<Vec<_>>() {
        flood.settle(&t, p);
    }
    for (x, y, z) in t.positions().collect::<Vec<_>>() {
        assert_eq!(candidate(&t, LightKind::Block, x, y, z), t.block_light(x, y, z));
        assert_eq!(candidate(&t, LightKind::Sun, x, y, z), t.sun_light(x, y, z));
    }
    // Above the roof is open sky, directly under the hole too
    assert_eq!(t.sun_light(3, 3, 11), 15);
    assert_eq!(t.sun_light(0, 0, 5), 15);
    // Under the roof light leaks in from the hole and falls off
    assert_eq!(t.sun_light(1, 0, 5), 14);
    assert_eq!(t.sun_light(4, 4, 5), 7);
}

#[test]
fn lossy_medium_forgets_removed_emitter() {
    let t = GridTerrain::with_air_trough((-6, -6, -6), (6, 6, 6), -1);
    t.set_named(0, 0, 0, "lamp");
    let mut flood = Flood::new();
    flood.relax(&t, LightKind::Block, (0, 0, 0));
    assert_eq!(t.block_light(1, 0, 0), 14);
    t.set_block(0, 0, 0, strata_blocks::Block::AIR);
    flood.relax(&t, LightKind::Block, (0, 0, 0));
    for (x, y, z) in t.positions().collect::<Vec<_>>() {
        assert_eq!(t.block_light(x, y, z), 0);
    }
}

#[test]
fn unloaded_origin_is_skipped() {
    let t = GridTerrain::column(4, 0);
    let mut flood = Flood::new();
    let (block, sun) = flood.settle(&t, (50, 50, 50));
    assert_eq!(block.changed + sun.changed, 0);
    assert_eq!(block.visited, 1);
}

proptest! {
    // Block light never exceeds the strongest emitter minus path loss, and lamps hold their level
    #[test]
    fn emitters_hold_their_level(lamps in prop::collection::vec((-3i32..=3, -3i32..=3, -3i32..=3), 1..4)) {
        let t = GridTerrain::with_air_trough((-3, -3, -3), (3, 3, 3), -1);
        for &(x, y, z) in &lamps { t.set_named(x, y, z, "lamp"); }
        let mut flood = Flood::new();
        for &p in &lamps { flood.relax(&t, LightKind::Block, p); }
        for (x, y, z) in t.positions().collect::<Vec<_>>() {
            let expect = lamps.iter().map(|&(lx, ly, lz)| 15 - ((x - lx).abs() + (y - ly).abs() + (z - lz).abs())).max().unwrap().max(0);
            prop_assert_eq!(i32::from(t.block_light(x, y, z)), expect);
        }
    }
}

#[test]
fn opaque_block_is_lit_but_blocks_light() {
    let t = GridTerrain::with_air_trough((0, 0, 0), (3, 0, 0), -1);
    t.set_named(0, 0, 0, "lamp");
    t.set_named(1, 0, 0, "stone");
    let mut flood = Flood::new();
    flood.relax(&t, LightKind::Block, (0, 0, 0));
    assert_eq!(t.block_light(0, 0, 0), 15);
    // Light entering the stone is attenuated by the lamp it came through
    assert_eq!(t.block_light(1, 0, 0), 14);
    // Leaving the stone costs its full trough
    assert_eq!(t.block_light(2, 0, 0), 0);
    assert_eq!(t.block_light(3, 0, 0), 0);
    assert_eq!(candidate(&t, LightKind::Block, 2, 0, 0), 0);
}
