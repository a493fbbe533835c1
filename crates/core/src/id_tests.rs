// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn uuid_gen_produces_unique_ids() {
    let gen = UuidIdGen;
    let a = gen.next();
    let b = gen.next();
    assert_ne!(a, b);
    assert_eq!(a.len(), 36);
}

#[test]
fn uuid_gen_ids_are_hyphenated_lowercase() {
    let id = UuidIdGen.next();
    assert_eq!(id.matches('-').count(), 4);
    assert_eq!(id, id.to_lowercase());
}

#[test]
fn sequential_gen_counts_up() {
    let gen = SequentialIdGen::new("job");
    assert_eq!(gen.next(), "job-1");
    assert_eq!(gen.next(), "job-2");

    // Clones share the counter
    let clone = gen.clone();
    assert_eq!(clone.next(), "job-3");
    assert_eq!(gen.next(), "job-4");
}

#[test]
fn sequential_gen_default_prefix() {
    let gen = SequentialIdGen::default();
    assert_eq!(gen.next(), "id-1");
}
