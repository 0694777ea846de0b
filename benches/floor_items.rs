use criterion::{criterion_group, criterion_main, Criterion};
use starboard_server::items::ItemData;
use starboard_server::lobby::FloorItemManager;
use std::hint::black_box;

fn bench_floor_items(c: &mut Criterion) {
    c.bench_function("floor_items_add_evict_churn", |b| {
        b.iter(|| {
            let mut manager = FloorItemManager::new(1, 0);
            for n in 0..256u32 {
                manager
                    .add_new(ItemData::new(0x1000 + n), 0.0, 0.0, 0x001 | (n as u16 & 0x00E))
                    .expect("add succeeds");
                let _ = manager.evict().expect("evict succeeds");
            }
            manager
        });
    });

    c.bench_function("floor_items_reassign_full_floor", |b| {
        let mut manager = FloorItemManager::new(1, 0);
        for n in 0..48u32 {
            manager
                .add_new(ItemData::new(0x1000 + n), 0.0, 0.0, 0xFFF)
                .expect("add succeeds");
        }

        b.iter(|| {
            black_box(manager.reassign_all_item_ids(0x2000).expect("reassign succeeds"));
        });
    });
}

criterion_group!(benches, bench_floor_items);
criterion_main!(benches);
