// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Property-based tests for packed triangular storage and leading-dimension
//! layouts.

use proptest::prelude::*;

use crate::matrix::{ColumnMajor, required_len};
use crate::spectral::{Triangle, pack, packed_len, packed_offset};

fn triangle_strategy() -> impl Strategy<Value = Triangle> {
    prop_oneof![Just(Triangle::Upper), Just(Triangle::Lower)]
}

/// `(rows, cols, ld)` with `ld >= max(1, rows)`.
fn layout_strategy() -> impl Strategy<Value = (usize, usize, usize)> {
    (0usize..7, 0usize..7, 0usize..4)
        .prop_map(|(rows, cols, pad)| (rows, cols, rows.max(1) + pad))
}

fn stored(triangle: Triangle, i: usize, j: usize) -> bool {
    match triangle {
        Triangle::Upper => i <= j,
        Triangle::Lower => i >= j,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn packed_offset_enumerates_the_triangle(triangle in triangle_strategy(), n in 0usize..12) {
        let mut seen = vec![false; packed_len(n)];
        for j in 1..=n {
            for i in 1..=n {
                match packed_offset(triangle, n, i, j) {
                    Some(off) => {
                        prop_assert!(stored(triangle, i, j));
                        prop_assert!(off < seen.len());
                        prop_assert!(!seen[off], "({i}, {j}) reuses slot {off}");
                        seen[off] = true;
                    }
                    None => prop_assert!(!stored(triangle, i, j)),
                }
            }
        }
        prop_assert!(seen.iter().all(|&s| s));
        prop_assert_eq!(packed_offset(triangle, n, 0, 1), None);
        prop_assert_eq!(packed_offset(triangle, n, n + 1, n + 1), None);
    }

    #[test]
    fn pack_places_each_entry_at_its_packed_offset(
        triangle in triangle_strategy(),
        n in 0usize..8,
        pad in 0usize..3,
    ) {
        let ld = n.max(1) + pad;
        let data: Vec<usize> = (0..required_len(n, n, ld).unwrap()).collect();
        let matrix = ColumnMajor::new(&data, n, n, ld).unwrap();
        let packed = pack(&matrix, triangle).unwrap();
        prop_assert_eq!(packed.len(), packed_len(n));
        for j in 1..=n {
            for i in 1..=n {
                if let Some(off) = packed_offset(triangle, n, i, j) {
                    prop_assert_eq!(Some(&packed[off]), matrix.get(i, j));
                }
            }
        }
    }

    #[test]
    fn required_len_is_the_smallest_buffer_accepted((rows, cols, ld) in layout_strategy()) {
        let needed = required_len(rows, cols, ld).unwrap();
        let data = vec![0u8; needed];
        let matrix = ColumnMajor::new(&data, rows, cols, ld).unwrap();
        if rows > 0 && cols > 0 {
            prop_assert!(matrix.get(rows, cols).is_some());
            let short = ColumnMajor::new(&data[..needed - 1], rows, cols, ld);
            prop_assert!(short.is_err());
        } else {
            prop_assert_eq!(needed, 0);
        }
    }
}
