use proptest::prelude::*;
use strata_blocks::Block;
use strata_chunk::{Chunk, ChunkLayout};

fn layout() -> impl Strategy<Value = ChunkLayout> {
    ((0u8..=2, 0u8..=2, 0u8..=2), (0u8..=3, 0u8..=3, 0u8..=3))
        .prop_map(|(s, z)| ChunkLayout::new(s, z))
}

fn layout_and_pos() -> impl Strategy<Value = (ChunkLayout, (i32, i32, i32))> {
    layout().prop_flat_map(|l| {
        let (sx, sy, sz) = l.chunk_size();
        (Just(l), (0..sx, 0..sy, 0..sz))
    })
}

fn edits(l: ChunkLayout) -> impl Strategy<Value = Vec<((i32, i32, i32), u16)>> {
    let (sx, sy, sz) = l.chunk_size();
    prop::collection::vec(((0..sx, 0..sy, 0..sz), 1u16..4), 0..24)
}

proptest! {
    // split/join is lossless and the section index stays in range
    #[test]
    fn coordinate_bijection((l, (x, y, z)) in layout_and_pos()) {
        let (s, local) = l.split(x, y, z);
        prop_assert_eq!(l.join(s, local), (x, y, z));
        let (ssx, ssy, ssz) = l.section_size();
        prop_assert!(local.0 < ssx && local.1 < ssy && local.2 < ssz);
        let i = l.section_index(x, y, z).unwrap();
        prop_assert!(i < l.section_count());
        prop_assert_eq!(l.join(s, (0, 0, 0)), l.section_origin(i));
        prop_assert!(l.local_offset(x, y, z) < l.section_volume());
    }

    // Every voxel maps to a distinct (section, offset) pair covering the chunk
    #[test]
    fn decomposition_covers_chunk(l in layout()) {
        let (sx, sy, sz) = l.chunk_size();
        let mut seen = vec![false; l.section_count() * l.section_volume()];
        for z in 0..sz { for y in 0..sy { for x in 0..sx {
            let slot = l.section_index(x, y, z).unwrap() * l.section_volume() + l.local_offset(x, y, z);
            prop_assert!(!seen[slot]);
            seen[slot] = true;
        }}}
        prop_assert!(seen.into_iter().all(|b| b));
    }

    #[test]
    fn blocks_and_light_roundtrip((l, (x, y, z)) in layout_and_pos(), id in any::<u16>(), data in any::<u8>(), bl in 0u8..16, sl in 0u8..16) {
        let mut c = Chunk::new(l);
        c.set_block(x, y, z, Block::new(id, data));
        c.set_block_light(x, y, z, bl);
        c.set_sun_light(x, y, z, sl);
        prop_assert_eq!(c.block(x, y, z), Block::new(id, data));
        prop_assert_eq!(c.block_light(x, y, z), bl);
        prop_assert_eq!(c.sun_light(x, y, z), sl);
    }

    // Box emptiness agrees with a voxel-by-voxel scan
    #[test]
    fn empty_in_box_matches_scan((l, ed, a, b) in layout().prop_flat_map(|l| {
        let (sx, sy, sz) = l.chunk_size();
        (Just(l), edits(l), (-1..sx + 1, -1..sy + 1, -1..sz + 1), (-1..sx + 1, -1..sy + 1, -1..sz + 1))
    })) {
        let mut c = Chunk::new(l);
        for ((x, y, z), id) in &ed { c.set_block(*x, *y, *z, Block::from(*id)); }
        c.compress();
        let min = (a.0.min(b.0), a.1.min(b.1), a.2.min(b.2));
        let max = (a.0.max(b.0), a.1.max(b.1), a.2.max(b.2));
        let expect = !ed.iter().any(|((x, y, z), _)| {
            (min.0..=max.0).contains(x) && (min.1..=max.1).contains(y) && (min.2..=max.2).contains(z)
        });
        prop_assert_eq!(c.is_empty_in_box(min, max), expect);
    }

    #[test]
    fn highest_block_matches_scan((l, ed) in layout().prop_flat_map(|l| (Just(l), edits(l)))) {
        let mut c = Chunk::new(l);
        for ((x, y, z), id) in &ed { c.set_block(*x, *y, *z, Block::from(*id)); }
        let (sx, sy, _) = l.chunk_size();
        for y in 0..sy { for x in 0..sx {
            let expect = ed.iter().filter(|((ex, ey, _), _)| *ex == x && *ey == y).map(|((_, _, z), _)| *z).max();
            prop_assert_eq!(c.highest_block_z(x, y), expect);
        }}
    }

    #[test]
    fn chunk_tag_roundtrip((l, ed) in layout().prop_flat_map(|l| (Just(l), edits(l))), compress in any::<bool>()) {
        let mut c = Chunk::new(l);
        for ((x, y, z), id) in &ed {
            c.set_block(*x, *y, *z, Block::new(*id, 1));
            c.set_sun_light(*x, *y, *z, 15);
        }
        if compress { c.compress(); }
        let restored = Chunk::from_tag(l, &c.write());
        let (sx, sy, sz) = l.chunk_size();
        for z in 0..sz { for y in 0..sy { for x in 0..sx {
            prop_assert_eq!(restored.block(x, y, z), c.block(x, y, z));
            prop_assert_eq!(restored.sun_light(x, y, z), c.sun_light(x, y, z));
            prop_assert_eq!(restored.block_light(x, y, z), c.block_light(x, y, z));
        }}}
    }
}

#[test]
fn compress_restores_uniform_sections() {
    let l = ChunkLayout::new((0, 0, 1), (2, 2, 2));
    let mut c = Chunk::new(l);
    assert_eq!(c.dense_sections(), 0);
    c.set_block(1, 1, 1, Block::from(3));
    assert_eq!(c.dense_sections(), 1);
    c.set_block(1, 1, 1, Block::AIR);
    // Only the touched section reports: the rest were never written
    assert_eq!(c.compress(), 1);
    assert_eq!(c.dense_sections(), 0);
    assert!(c.is_all_air());
    assert_eq!(c.compress(), 0);
}

#[test]
fn short_record_resets_missing_sections() {
    let l = ChunkLayout::new((0, 0, 1), (1, 1, 1));
    let mut c = Chunk::new(l);
    c.set_block(0, 0, 0, Block::from(9));
    c.set_block(0, 0, 3, Block::from(9));
    let mut tag = c.write();
    tag.blocks.truncate(1);
    let restored = Chunk::from_tag(l, &tag);
    assert_eq!(restored.block(0, 0, 0).id, 9);
    assert_eq!(restored.block(0, 0, 3).id, 0);
}
