extern crate column_tables;
use column_tables::{DenseTable, SparseTable};

fn main() {
    let mut positions: SparseTable<(f32, f32, &str)> = SparseTable::new();
    positions.insert(0.0, 0.0, "origin");
    let target = positions.insert(3.0, 4.0, "target");
    positions.insert(-1.0, 2.5, "marker");

    positions.remove(target);
    positions.insert(9.0, 9.0, "far away");

    if !positions.contains(target) {
        println!("The target is gone");
    }

    // Prints: origin marker "far away"
    for (_, name) in positions.column::<&str, _>() {
        print!("{} ", name);
    }
    println!();

    positions.for_each_row(|_, x, y, name| {
        println!("{} is at ({}, {})", name, x, y);
    });

    // The dense strategy has the same surface, but keeps columns packed by
    // moving the last row into removed spots.
    let mut scores: DenseTable<(String, u32)> = DenseTable::new();
    scores.insert("alice".to_string(), 7);
    let bob = scores.insert("bob".to_string(), 3);
    scores.insert("carol".to_string(), 9);

    scores.remove(bob);

    // Prints: alice 7, carol 9
    for (handle, name) in scores.column::<String, _>() {
        match scores.get::<u32, _>(handle) {
            Some(score) => println!("{} {}", name, score),
            None => unreachable!(),
        }
    }
}
