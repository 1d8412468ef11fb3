// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Property-based tests for shape arithmetic and element access across the
//! array kinds.

use proptest::prelude::*;

use crate::array::Array;
use crate::dynamic::DynArray;
use crate::scattered::ScatteredArray;
use crate::shape::Shape;

fn dims_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..6, 1..=3)
}

/// A shape together with one valid 1-based index tuple into it.
fn dims_and_index() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
    dims_strategy().prop_flat_map(|dims| {
        let idx: Vec<_> = dims.iter().map(|&n| 1..=n).collect();
        (Just(dims), idx)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn num_elems_is_product_of_dims(dims in prop::collection::vec(0usize..8, 1..=4)) {
        let shape = Shape::new(&dims).unwrap();
        prop_assert_eq!(shape.num_elems(), dims.iter().product::<usize>());
        let array = DynArray::<u8>::new(&dims).unwrap();
        prop_assert_eq!(array.num_elems(), array.dims().iter().product::<usize>());
    }

    #[test]
    fn offset_matches_column_major_formula((dims, idx) in dims_and_index()) {
        let shape = Shape::new(&dims).unwrap();
        let mut expected = 0;
        let mut stride = 1;
        for (i, n) in idx.iter().zip(&dims) {
            expected += (i - 1) * stride;
            stride *= n;
        }
        prop_assert_eq!(shape.offset(&idx), Some(expected));
        prop_assert_eq!(shape.index_of(expected).unwrap().to_vec(), idx);
    }

    #[test]
    fn write_then_read_round_trips((dims, idx) in dims_and_index(), value in any::<i64>()) {
        let mut dynamic = DynArray::<i64>::new(&dims).unwrap();
        *dynamic.at_mut(&idx) = value;
        prop_assert_eq!(*dynamic.at(&idx), value);

        let mut block = vec![0i64; dynamic.num_elems()];
        let mut scattered = ScatteredArray::from_slice(&dims, &mut block).unwrap();
        *scattered.at_mut(&idx) = value;
        prop_assert_eq!(*scattered.at(&idx), value);
        let off = Shape::new(&dims).unwrap().offset(&idx).unwrap();
        drop(scattered);
        prop_assert_eq!(block[off], value);
    }

    #[test]
    fn resize_keeps_overlapping_values(
        old in prop::collection::vec(1usize..5, 2),
        new in prop::collection::vec(1usize..5, 2),
    ) {
        let n = old.iter().product::<usize>();
        let values: Vec<usize> = (0..n).collect();
        let mut array = DynArray::from_vec(&old, values).unwrap();
        let before = array.clone();
        array.resize(&new).unwrap();
        prop_assert_eq!(array.dims(), new.as_slice());
        for idx in array.shape().indices() {
            match before.shape().offset(&idx) {
                Some(_) => prop_assert_eq!(array.at(&idx), before.at(&idx)),
                None => prop_assert_eq!(*array.at(&idx), 0),
            }
        }
    }
}
