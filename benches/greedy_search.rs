use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use table_repair::{config::RepairConfig, search};

/// A statement-like ground truth and a generated copy with a dropped row,
/// a fragmented value and a few off-by-one digits.
fn tables(rows: usize) -> (Vec<Vec<String>>, Vec<Vec<String>>) {
    let mut groundtruth = vec![vec![
        "Item".to_string(),
        "2023".to_string(),
        "2024".to_string(),
    ]];
    for i in 0..rows {
        groundtruth.push(vec![
            format!("Line {i}"),
            format!("{}", 1000 + i * 37),
            format!("{}", 2000 + i * 53),
        ]);
    }

    let mut generated = groundtruth.clone();
    if rows > 2 {
        generated.remove(2);
    }
    if let Some(row) = generated.get_mut(1) {
        let value = row[1].clone();
        let (head, tail) = value.split_at(2);
        row[1] = head.to_string();
        row.push(tail.to_string());
    }
    for row in generated.iter_mut().skip(3).step_by(4) {
        row[2].push('1');
    }
    (generated, groundtruth)
}

fn bench_repair(c: &mut Criterion) {
    let config = RepairConfig::default();
    let mut group = c.benchmark_group("greedy_search");
    for rows in [8usize, 24] {
        let (generated, groundtruth) = tables(rows);
        group.bench_function(format!("repair_{rows}_rows"), |b| {
            b.iter_batched(
                || (generated.clone(), groundtruth.clone()),
                |(generated, groundtruth)| {
                    black_box(search::repair(&generated, &groundtruth, &[], &config))
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_repair);
criterion_main!(benches);
