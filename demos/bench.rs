#[macro_use]
extern crate bencher;

use bencher::{black_box, Bencher};
use column_tables::{DenseTable, SparseTable};
use std::collections::HashMap;

// 100 random indexes
static INDEXES: [usize; 100] = [
    69, 47, 15, 48, 51, 32, 75, 88, 28, 61, 75, 92, 75, 26, 79, 7, 19, 62, 5, 55, 23, 94, 37, 83,
    78, 99, 38, 87, 60, 77, 81, 19, 96, 61, 78, 47, 39, 74, 3, 65, 12, 29, 78, 61, 92, 71, 70, 71,
    38, 27, 97, 46, 20, 3, 47, 75, 6, 97, 37, 27, 23, 88, 44, 30, 87, 31, 17, 54, 26, 34, 15, 3,
    24, 42, 21, 15, 35, 65, 72, 37, 9, 45, 94, 45, 71, 3, 64, 67, 27, 36, 82, 9, 78, 86, 94, 35,
    62, 47, 99, 34,
];

static REMOVABLE_INDEXES: [usize; 10] = [69, 47, 15, 48, 51, 32, 75, 38, 28, 61];

fn create_empty_sparse_table(b: &mut Bencher) {
    b.iter(|| {
        let table = SparseTable::<(String,)>::new();
        black_box(&table);
    });
}

fn create_empty_dense_table(b: &mut Bencher) {
    b.iter(|| {
        let table = DenseTable::<(String,)>::new();
        black_box(&table);
    });
}

fn create_empty_thunderdome(b: &mut Bencher) {
    b.iter(|| {
        let arena = thunderdome::Arena::<String>::new();
        black_box(&arena);
    });
}

fn create_empty_slotmap(b: &mut Bencher) {
    b.iter(|| {
        let map = slotmap::SlotMap::<slotmap::DefaultKey, String>::new();
        black_box(&map);
    });
}

fn insert_hundred_elements_sparse_table(b: &mut Bencher) {
    b.iter(|| {
        let mut table = SparseTable::<(String,)>::new();
        for i in INDEXES.iter() {
            table.insert(i.to_string());
        }
        black_box(&table);
    });
}

fn insert_hundred_elements_dense_table(b: &mut Bencher) {
    b.iter(|| {
        let mut table = DenseTable::<(String,)>::new();
        for i in INDEXES.iter() {
            table.insert(i.to_string());
        }
        black_box(&table);
    });
}

fn insert_hundred_elements_vec(b: &mut Bencher) {
    b.iter(|| {
        let mut vec = Vec::<String>::new();
        for i in INDEXES.iter() {
            vec.push(i.to_string());
        }
        black_box(&vec);
    });
}

fn insert_hundred_elements_hash_map(b: &mut Bencher) {
    b.iter(|| {
        let mut map = HashMap::<i32, String>::new();
        for i in INDEXES.iter() {
            map.insert(*i as i32, i.to_string());
        }
        black_box(&map);
    });
}

fn insert_hundred_elements_thunderdome(b: &mut Bencher) {
    b.iter(|| {
        let mut arena = thunderdome::Arena::<String>::new();
        for i in INDEXES.iter() {
            arena.insert(i.to_string());
        }
        black_box(&arena);
    });
}

fn insert_hundred_elements_generational_arena(b: &mut Bencher) {
    b.iter(|| {
        let mut arena = generational_arena::Arena::<String>::new();
        for i in INDEXES.iter() {
            arena.insert(i.to_string());
        }
        black_box(&arena);
    });
}

fn insert_hundred_elements_slotmap(b: &mut Bencher) {
    b.iter(|| {
        let mut map = slotmap::SlotMap::<slotmap::DefaultKey, String>::new();
        for i in INDEXES.iter() {
            map.insert(i.to_string());
        }
        black_box(&map);
    });
}

fn insert_hundred_elements_slab(b: &mut Bencher) {
    b.iter(|| {
        let mut slab = slab::Slab::<String>::new();
        for i in INDEXES.iter() {
            slab.insert(i.to_string());
        }
        black_box(&slab);
    });
}

fn get_hundred_elements_sparse_table(b: &mut Bencher) {
    let mut table = SparseTable::<(String,)>::new();
    let mut handles = Vec::new();
    for i in INDEXES.iter() {
        handles.push(table.insert(i.to_string()));
    }
    black_box(&mut handles);
    black_box(&mut table);
    b.iter(|| {
        for i in INDEXES.iter() {
            black_box(&table.get::<String, _>(handles[*i]));
        }
    });
}

fn get_hundred_elements_dense_table(b: &mut Bencher) {
    let mut table = DenseTable::<(String,)>::new();
    let mut handles = Vec::new();
    for i in INDEXES.iter() {
        handles.push(table.insert(i.to_string()));
    }
    black_box(&mut handles);
    black_box(&mut table);
    b.iter(|| {
        for i in INDEXES.iter() {
            black_box(&table.get::<String, _>(handles[*i]));
        }
    });
}

fn get_hundred_elements_vec(b: &mut Bencher) {
    let mut vec = Vec::<String>::new();
    for i in INDEXES.iter() {
        vec.push(i.to_string());
    }
    black_box(&mut vec);
    b.iter(|| {
        for i in INDEXES.iter() {
            black_box(&vec[*i]);
        }
    });
}

fn get_hundred_elements_hash_map(b: &mut Bencher) {
    let mut map = HashMap::<i32, String>::new();
    for i in INDEXES.iter() {
        map.insert(*i as i32, i.to_string());
    }
    black_box(&mut map);
    b.iter(|| {
        for i in INDEXES.iter() {
            black_box(&map.get(&(*i as i32)));
        }
    });
}

fn get_hundred_elements_thunderdome(b: &mut Bencher) {
    let mut arena = thunderdome::Arena::<String>::new();
    let mut handles = Vec::new();
    for i in INDEXES.iter() {
        handles.push(arena.insert(i.to_string()));
    }
    black_box(&mut handles);
    black_box(&mut arena);
    b.iter(|| {
        for i in INDEXES.iter() {
            black_box(&arena.get(handles[*i]));
        }
    });
}

fn get_hundred_elements_generational_arena(b: &mut Bencher) {
    let mut arena = generational_arena::Arena::<String>::new();
    let mut handles = Vec::new();
    for i in INDEXES.iter() {
        handles.push(arena.insert(i.to_string()));
    }
    black_box(&mut handles);
    black_box(&mut arena);
    b.iter(|| {
        for i in INDEXES.iter() {
            black_box(&arena.get(handles[*i]));
        }
    });
}

fn get_hundred_elements_slotmap(b: &mut Bencher) {
    let mut map = slotmap::SlotMap::<slotmap::DefaultKey, String>::new();
    let mut handles = Vec::new();
    for i in INDEXES.iter() {
        handles.push(map.insert(i.to_string()));
    }
    black_box(&mut handles);
    black_box(&mut map);
    b.iter(|| {
        for i in INDEXES.iter() {
            black_box(&map.get(handles[*i]));
        }
    });
}

fn get_hundred_elements_slab(b: &mut Bencher) {
    let mut slab = slab::Slab::<String>::new();
    let mut handles = Vec::new();
    for i in INDEXES.iter() {
        handles.push(slab.insert(i.to_string()));
    }
    black_box(&mut handles);
    black_box(&mut slab);
    b.iter(|| {
        for i in INDEXES.iter() {
            black_box(&slab.get(handles[*i]));
        }
    });
}

fn iterate_over_hundred_elements_sparse_table(b: &mut Bencher) {
    let mut table = SparseTable::<(String,)>::new();
    for i in INDEXES.iter() {
        table.insert(i.to_string());
    }
    black_box(&mut table);
    b.iter(|| {
        for (_, element) in table.column::<String, _>() {
            black_box(element);
        }
    });
}

fn iterate_over_hundred_elements_dense_table(b: &mut Bencher) {
    let mut table = DenseTable::<(String,)>::new();
    for i in INDEXES.iter() {
        table.insert(i.to_string());
    }
    black_box(&mut table);
    b.iter(|| {
        for (_, element) in table.column::<String, _>() {
            black_box(element);
        }
    });
}

fn iterate_over_hundred_elements_vec(b: &mut Bencher) {
    let mut vec = Vec::<String>::new();
    for i in INDEXES.iter() {
        vec.push(i.to_string());
    }
    black_box(&mut vec);
    b.iter(|| {
        for element in vec.iter() {
            black_box(element);
        }
    });
}

fn iterate_over_hundred_elements_thunderdome(b: &mut Bencher) {
    let mut arena = thunderdome::Arena::<String>::new();
    for i in INDEXES.iter() {
        arena.insert(i.to_string());
    }
    black_box(&mut arena);
    b.iter(|| {
        for (_, element) in arena.iter() {
            black_box(element);
        }
    });
}

fn iterate_over_hundred_elements_slotmap(b: &mut Bencher) {
    let mut map = slotmap::SlotMap::<slotmap::DefaultKey, String>::new();
    for i in INDEXES.iter() {
        map.insert(i.to_string());
    }
    black_box(&mut map);
    b.iter(|| {
        for element in map.values() {
            black_box(element);
        }
    });
}

// The interesting comparison: after removals the sparse strategy scans over
// holes while the dense strategy stays packed.
fn iterate_fragmented_sparse_table(b: &mut Bencher) {
    let mut table = SparseTable::<(String,)>::new();
    let mut handles = Vec::new();
    for i in INDEXES.iter() {
        handles.push(table.insert(i.to_string()));
    }
    for i in REMOVABLE_INDEXES.iter() {
        table.remove(handles[*i]);
    }
    black_box(&mut table);
    b.iter(|| {
        for (_, element) in table.column::<String, _>() {
            black_box(element);
        }
    });
}

fn iterate_fragmented_dense_table(b: &mut Bencher) {
    let mut table = DenseTable::<(String,)>::new();
    let mut handles = Vec::new();
    for i in INDEXES.iter() {
        handles.push(table.insert(i.to_string()));
    }
    for i in REMOVABLE_INDEXES.iter() {
        table.remove(handles[*i]);
    }
    black_box(&mut table);
    b.iter(|| {
        for (_, element) in table.column::<String, _>() {
            black_box(element);
        }
    });
}

fn insert_and_remove_ten_elements_sparse_table(b: &mut Bencher) {
    let mut table = SparseTable::<(String,)>::new();
    let mut handles = Vec::new();
    for i in INDEXES.iter() {
        handles.push(table.insert(i.to_string()));
    }
    black_box(&mut table);
    b.iter(|| {
        let mut fresh = Vec::new();
        for i in REMOVABLE_INDEXES.iter() {
            table.remove(handles[*i]);
        }
        for i in REMOVABLE_INDEXES.iter() {
            fresh.push(table.insert(i.to_string()));
        }
        for (n, i) in REMOVABLE_INDEXES.iter().enumerate() {
            handles[*i] = fresh[n];
        }
        black_box(&table);
    });
}

fn insert_and_remove_ten_elements_dense_table(b: &mut Bencher) {
    let mut table = DenseTable::<(String,)>::new();
    let mut handles = Vec::new();
    for i in INDEXES.iter() {
        handles.push(table.insert(i.to_string()));
    }
    black_box(&mut table);
    b.iter(|| {
        let mut fresh = Vec::new();
        for i in REMOVABLE_INDEXES.iter() {
            table.remove(handles[*i]);
        }
        for i in REMOVABLE_INDEXES.iter() {
            fresh.push(table.insert(i.to_string()));
        }
        for (n, i) in REMOVABLE_INDEXES.iter().enumerate() {
            handles[*i] = fresh[n];
        }
        black_box(&table);
    });
}

fn insert_and_remove_ten_elements_thunderdome(b: &mut Bencher) {
    let mut arena = thunderdome::Arena::<String>::new();
    let mut handles = Vec::new();
    for i in INDEXES.iter() {
        handles.push(arena.insert(i.to_string()));
    }
    black_box(&mut arena);
    b.iter(|| {
        let mut fresh = Vec::new();
        for i in REMOVABLE_INDEXES.iter() {
            arena.remove(handles[*i]);
        }
        for i in REMOVABLE_INDEXES.iter() {
            fresh.push(arena.insert(i.to_string()));
        }
        for (n, i) in REMOVABLE_INDEXES.iter().enumerate() {
            handles[*i] = fresh[n];
        }
        black_box(&arena);
    });
}

fn insert_and_remove_ten_elements_slotmap(b: &mut Bencher) {
    let mut map = slotmap::SlotMap::<slotmap::DefaultKey, String>::new();
    let mut handles = Vec::new();
    for i in INDEXES.iter() {
        handles.push(map.insert(i.to_string()));
    }
    black_box(&mut map);
    b.iter(|| {
        let mut fresh = Vec::new();
        for i in REMOVABLE_INDEXES.iter() {
            map.remove(handles[*i]);
        }
        for i in REMOVABLE_INDEXES.iter() {
            fresh.push(map.insert(i.to_string()));
        }
        for (n, i) in REMOVABLE_INDEXES.iter().enumerate() {
            handles[*i] = fresh[n];
        }
        black_box(&map);
    });
}

benchmark_group!(
    benches,
    create_empty_sparse_table,
    create_empty_dense_table,
    create_empty_thunderdome,
    create_empty_slotmap,
    insert_hundred_elements_sparse_table,
    insert_hundred_elements_dense_table,
    insert_hundred_elements_vec,
    insert_hundred_elements_hash_map,
    insert_hundred_elements_thunderdome,
    insert_hundred_elements_generational_arena,
    insert_hundred_elements_slotmap,
    insert_hundred_elements_slab,
    get_hundred_elements_sparse_table,
    get_hundred_elements_dense_table,
    get_hundred_elements_vec,
    get_hundred_elements_hash_map,
    get_hundred_elements_thunderdome,
    get_hundred_elements_generational_arena,
    get_hundred_elements_slotmap,
    get_hundred_elements_slab,
    iterate_over_hundred_elements_sparse_table,
    iterate_over_hundred_elements_dense_table,
    iterate_over_hundred_elements_vec,
    iterate_over_hundred_elements_thunderdome,
    iterate_over_hundred_elements_slotmap,
    iterate_fragmented_sparse_table,
    iterate_fragmented_dense_table,
    insert_and_remove_ten_elements_sparse_table,
    insert_and_remove_ten_elements_dense_table,
    insert_and_remove_ten_elements_thunderdome,
    insert_and_remove_ten_elements_slotmap,
);
benchmark_main!(benches);
