// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Multicast derivation and schema hashing throughput.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sdn::topic::generate_mcast_address;
use sdn::types::{ScalarKind, TypeDescriptor};

fn bench_mcast_derive(c: &mut Criterion) {
    c.bench_function("generate_mcast_address", |b| {
        b.iter(|| generate_mcast_address(black_box("plasma/density/profile-1")));
    });
}

fn bench_type_uid(c: &mut Criterion) {
    let mut desc = TypeDescriptor::new("bench-type");
    for index in 0..16 {
        desc.add_attribute(None, &format!("field{}", index), ScalarKind::F64, 4)
            .expect("attribute");
    }
    c.bench_function("type_descriptor_uid", |b| {
        b.iter(|| black_box(&desc).uid());
    });
}

criterion_group!(benches, bench_mcast_derive, bench_type_uid);
criterion_main!(benches);
