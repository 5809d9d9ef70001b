use std::time::Duration;

use arbor_bt::behaviours::Success;
use arbor_bt::{BehaviourTree, Subtree};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_tree_tick(c: &mut Criterion) {
    let conditions = (0..32)
        .map(|i| Subtree::behaviour(format!("condition {i}"), Success))
        .collect::<Vec<_>>();

    let root = Subtree::sequence("root", false, conditions);
    let mut tree = BehaviourTree::new(root);
    if let Err(err) = tree.setup(Duration::from_secs(1)) {
        panic!("setup failed: {err}");
    }

    c.bench_function("arbor-bt/tick(conditions=32)", |b| {
        b.iter(|| {
            if let Err(err) = black_box(tree.tick()) {
                panic!("tick failed: {err}");
            }
            black_box(tree.root_status());
        })
    });
}

criterion_group!(benches, bench_tree_tick);
criterion_main!(benches);
