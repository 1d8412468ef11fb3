// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Arrays whose element count `N` is known at compile time.
//!
//! An owned `FixedArray` keeps its values inline in a `[T; N]`; an external
//! one aliases a block of the simulation's variable storage and never
//! copies on element access.  Both keep the shape they were built with.

use std::fmt;

use tracing::debug;

use crate::array::{
    Array, Elements, StorageKind, check_same_count, check_slice_len, copy_into, impl_index,
};
use crate::array_err;
use crate::common::Result;
use crate::shape::Shape;

enum Storage<'a, T, const N: usize> {
    Owned([T; N]),
    // None until the array is bound to caller storage
    External(Option<&'a mut [T; N]>),
}

pub struct FixedArray<'a, T, const N: usize> {
    shape: Shape,
    storage: Storage<'a, T, N>,
}

fn fixed_shape<const N: usize>(dims: &[usize]) -> Result<Shape> {
    let shape = Shape::new(dims)?;
    if shape.num_elems() != N {
        return array_err!(
            InvalidShape,
            format!(
                "shape {shape} holds {} elements, capacity is {N}",
                shape.num_elems()
            )
        );
    }
    Ok(shape)
}

impl<T: Clone + Default, const N: usize> FixedArray<'_, T, N> {
    /// An owned array with every element set to `T::default()`.
    pub fn new(dims: &[usize]) -> Result<Self> {
        Ok(FixedArray {
            shape: fixed_shape::<N>(dims)?,
            storage: Storage::Owned(std::array::from_fn(|_| T::default())),
        })
    }

    /// An owned array holding a copy of `data`, which is in column-major
    /// order.
    pub fn from_slice(dims: &[usize], data: &[T]) -> Result<Self> {
        let mut array = Self::new(dims)?;
        array.assign_slice(data)?;
        Ok(array)
    }

    /// An owned array holding a value copy of any other array.
    pub fn from_array(dims: &[usize], other: &dyn Array<T>) -> Result<Self> {
        let mut array = Self::new(dims)?;
        array.assign(other)?;
        Ok(array)
    }
}

impl<T: Clone, const N: usize> FixedArray<'_, T, N> {
    pub fn from_values(dims: &[usize], values: [T; N]) -> Result<Self> {
        Ok(FixedArray {
            shape: fixed_shape::<N>(dims)?,
            storage: Storage::Owned(values),
        })
    }
}

impl<'a, T: Clone, const N: usize> FixedArray<'a, T, N> {
    /// Bind to caller-owned storage.  No values are copied; writes through
    /// the array land in `data`.
    pub fn external(dims: &[usize], data: &'a mut [T; N]) -> Result<Self> {
        Ok(FixedArray {
            shape: fixed_shape::<N>(dims)?,
            storage: Storage::External(Some(data)),
        })
    }

    /// Bind to a block of exactly `N` elements, typically a sub-slice of the
    /// model's variable storage.
    pub fn external_slice(dims: &[usize], data: &'a mut [T]) -> Result<Self> {
        let len = data.len();
        match <&mut [T; N]>::try_from(data) {
            Ok(block) => Self::external(dims, block),
            Err(_) => array_err!(
                InvalidShape,
                format!("external block has {len} elements, capacity is {N}")
            ),
        }
    }

    /// An external array that is not yet bound to any storage.  Element
    /// access panics and assignment fails until `bind` is called.
    pub fn unbound(dims: &[usize]) -> Result<Self> {
        Ok(FixedArray {
            shape: fixed_shape::<N>(dims)?,
            storage: Storage::External(None),
        })
    }

    pub fn is_external(&self) -> bool {
        matches!(self.storage, Storage::External(_))
    }

    /// An external array aliasing this array's storage (owned or external).
    /// This is the O(1) view-of-view copy.
    pub fn view(&mut self) -> FixedArray<'_, T, N> {
        let storage = match &mut self.storage {
            Storage::Owned(values) => Storage::External(Some(values)),
            Storage::External(Some(block)) => Storage::External(Some(&mut **block)),
            Storage::External(None) => Storage::External(None),
        };
        FixedArray {
            shape: self.shape.clone(),
            storage,
        }
    }

    /// `self = src`.  An external destination takes over the binding of an
    /// external source (the address is copied, not the values); every other
    /// combination copies values into the destination's storage.
    pub fn bind(&mut self, src: FixedArray<'a, T, N>) -> Result<()> {
        if src.shape != self.shape {
            return array_err!(
                ShapeMismatch,
                format!("cannot bind shape {} to shape {}", src.shape, self.shape)
            );
        }
        match src.storage {
            Storage::External(block) => match &mut self.storage {
                Storage::External(dst) => {
                    debug!(
                        shape = %self.shape,
                        bound = block.is_some(),
                        "rebinding external array"
                    );
                    *dst = block;
                    Ok(())
                }
                Storage::Owned(values) => match block {
                    Some(block) => {
                        values.clone_from_slice(&block[..]);
                        Ok(())
                    }
                    None => array_err!(
                        UnsupportedOperation,
                        "cannot copy from an unbound external array".to_string()
                    ),
                },
            },
            Storage::Owned(values) => self.assign_slice(&values),
        }
    }

    /// A value copy into a new owned array.
    pub fn to_owned_array(&self) -> Result<FixedArray<'static, T, N>> {
        let values: &[T; N] = match &self.storage {
            Storage::Owned(values) => values,
            Storage::External(Some(block)) => &**block,
            Storage::External(None) => {
                return array_err!(
                    UnsupportedOperation,
                    "cannot copy an unbound external array".to_string()
                );
            }
        };
        Ok(FixedArray {
            shape: self.shape.clone(),
            storage: Storage::Owned(values.clone()),
        })
    }

    pub fn as_slice(&self) -> &[T] {
        match &self.storage {
            Storage::Owned(values) => values.as_slice(),
            Storage::External(Some(block)) => &block[..],
            Storage::External(None) => panic!("access to an unbound external array"),
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match &mut self.storage {
            Storage::Owned(values) => values.as_mut_slice(),
            Storage::External(Some(block)) => &mut block[..],
            Storage::External(None) => panic!("access to an unbound external array"),
        }
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    fn bound_mut(&mut self) -> Result<&mut [T]> {
        match &mut self.storage {
            Storage::Owned(values) => Ok(values.as_mut_slice()),
            Storage::External(Some(block)) => Ok(&mut block[..]),
            Storage::External(None) => array_err!(
                UnsupportedOperation,
                "assignment to an unbound external array".to_string()
            ),
        }
    }
}

impl<T: Clone, const N: usize> Array<T> for FixedArray<'_, T, N> {
    fn kind(&self) -> StorageKind {
        match self.storage {
            Storage::Owned(_) => StorageKind::FixedOwned,
            Storage::External(_) => StorageKind::FixedExternal,
        }
    }

    fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    fn element(&self, linear: usize) -> &T {
        &self.as_slice()[linear]
    }

    #[inline]
    fn element_mut(&mut self, linear: usize) -> &mut T {
        &mut self.as_mut_slice()[linear]
    }

    fn iter(&self) -> Elements<'_, T> {
        Elements::buffer(self.as_slice())
    }

    fn contiguous(&self) -> Option<&[T]> {
        match &self.storage {
            Storage::Owned(values) => Some(values.as_slice()),
            Storage::External(Some(block)) => Some(&block[..]),
            Storage::External(None) => None,
        }
    }

    fn data_mut(&mut self) -> Result<&mut [T]> {
        self.bound_mut()
    }

    fn assign_slice(&mut self, data: &[T]) -> Result<()> {
        check_slice_len(&self.shape, data.len())?;
        self.bound_mut()?.clone_from_slice(data);
        Ok(())
    }

    fn assign(&mut self, other: &dyn Array<T>) -> Result<()> {
        check_same_count(&self.shape, other)?;
        copy_into(self.bound_mut()?, other);
        Ok(())
    }

    fn resize(&mut self, dims: &[usize]) -> Result<()> {
        if dims == self.shape.dims() {
            return Ok(());
        }
        array_err!(
            UnsupportedOperation,
            format!(
                "cannot resize fixed array of shape {} to {dims:?}",
                self.shape
            )
        )
    }

    fn is_bound(&self) -> bool {
        !matches!(self.storage, Storage::External(None))
    }
}

impl_index!(FixedArray<'_, T, N>, [T, const N: usize], Clone);

impl<T: fmt::Debug, const N: usize> fmt::Debug for FixedArray<'_, T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, values): (&str, Option<&[T]>) = match &self.storage {
            Storage::Owned(values) => ("owned", Some(values.as_slice())),
            Storage::External(Some(block)) => ("external", Some(&block[..])),
            Storage::External(None) => ("unbound", None),
        };
        f.debug_struct("FixedArray")
            .field("shape", &self.shape)
            .field("storage", &kind)
            .field("values", &values)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorCode;

    #[test]
    fn test_owned_defaults_and_dims() {
        let a: FixedArray<f64, 6> = FixedArray::new(&[2, 3]).unwrap();
        assert_eq!(a.kind(), StorageKind::FixedOwned);
        assert_eq!(a.dims(), &[2, 3]);
        assert_eq!(a.num_dims(), 2);
        assert_eq!(a.num_elems(), 6);
        assert_eq!(a.dim(2).unwrap(), 3);
        assert!(a.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_shape_must_match_capacity() {
        let err = FixedArray::<f64, 6>::new(&[2, 2]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidShape);
    }

    #[test]
    fn test_column_major_2d() {
        let mut a: FixedArray<usize, 6> = FixedArray::new(&[2, 3]).unwrap();
        for i in 1..=2 {
            for j in 1..=3 {
                a[[i, j]] = 10 * i + j;
            }
        }
        for i in 1..=2 {
            for j in 1..=3 {
                assert_eq!(a.as_slice()[(i - 1) + 2 * (j - 1)], 10 * i + j);
            }
        }
    }

    #[test]
    fn test_column_major_3d() {
        let mut a: FixedArray<usize, 24> = FixedArray::new(&[2, 3, 4]).unwrap();
        *a.at_mut(&[2, 3, 4]) = 7;
        *a.at_mut(&[1, 2, 1]) = 5;
        assert_eq!(a.as_slice()[1 + 2 * (2 + 3 * 3)], 7);
        assert_eq!(a.as_slice()[2], 5);
    }

    #[test]
    fn test_external_writes_through() {
        let mut storage = [0.0; 4];
        {
            let mut a = FixedArray::external(&[4], &mut storage).unwrap();
            assert_eq!(a.kind(), StorageKind::FixedExternal);
            a[[3]] = 2.5;
            *a.at_mut(&[1]) = 1.0;
        }
        assert_eq!(storage, [1.0, 0.0, 2.5, 0.0]);
    }

    #[test]
    fn test_external_slice_binding() {
        let mut block = vec![0; 10];
        {
            let mut a = FixedArray::<i32, 4>::external_slice(&[2, 2], &mut block[3..7]).unwrap();
            a.assign_slice(&[1, 2, 3, 4]).unwrap();
        }
        assert_eq!(block, vec![0, 0, 0, 1, 2, 3, 4, 0, 0, 0]);

        let err = FixedArray::<i32, 4>::external_slice(&[4], &mut block[..3]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidShape);
    }

    #[test]
    fn test_owned_copy_is_independent() {
        let mut a = FixedArray::from_values(&[2, 2], [1, 2, 3, 4]).unwrap();
        let b = FixedArray::<i32, 4>::from_array(&[2, 2], &a).unwrap();
        let c = a.to_owned_array().unwrap();
        a[[1, 1]] = 100;
        assert_eq!(b[[1, 1]], 1);
        assert_eq!(c[[1, 1]], 1);
        assert_eq!(a[[1, 1]], 100);
    }

    #[test]
    fn test_view_aliases_storage() {
        let mut storage = [0; 3];
        let mut a = FixedArray::external(&[3], &mut storage).unwrap();
        {
            let mut v = a.view();
            assert_eq!(v.kind(), StorageKind::FixedExternal);
            v[[2]] = 9;
        }
        assert_eq!(a[[2]], 9);

        let mut owned = FixedArray::from_values(&[3], [1, 2, 3]).unwrap();
        owned.view()[[3]] = 30;
        assert_eq!(owned[[3]], 30);
    }

    #[test]
    fn test_bind_external_to_external_copies_address() {
        crate::test_utils::init_test_logging();

        let mut first = [1, 2];
        let mut second = [3, 4];
        let mut a = FixedArray::external(&[2], &mut first).unwrap();
        let b = FixedArray::external(&[2], &mut second).unwrap();
        a.bind(b).unwrap();
        a[[1]] = 30;
        drop(a);
        assert_eq!(first, [1, 2]);
        assert_eq!(second, [30, 4]);
    }

    #[test]
    fn test_bind_owned_source_copies_values() {
        let mut storage = [0; 2];
        let mut a = FixedArray::external(&[2], &mut storage).unwrap();
        let owned = FixedArray::from_values(&[2], [5, 6]).unwrap();
        a.bind(owned).unwrap();
        drop(a);
        assert_eq!(storage, [5, 6]);

        let mut other = [7, 8];
        let mut owned = FixedArray::<i32, 2>::new(&[2]).unwrap();
        owned
            .bind(FixedArray::external(&[2], &mut other).unwrap())
            .unwrap();
        assert_eq!(owned.kind(), StorageKind::FixedOwned);
        assert_eq!(owned.as_slice(), &[7, 8]);

        let unbound = FixedArray::<i32, 2>::unbound(&[2]).unwrap();
        assert_eq!(
            owned.bind(unbound).unwrap_err().code,
            ErrorCode::UnsupportedOperation
        );
    }

    #[test]
    fn test_unbound_external() {
        let mut a = FixedArray::<f64, 3>::unbound(&[3]).unwrap();
        assert!(!a.is_bound());
        assert!(a.contiguous().is_none());
        assert_eq!(
            a.assign_slice(&[1.0, 2.0, 3.0]).unwrap_err().code,
            ErrorCode::UnsupportedOperation
        );
        let src = FixedArray::from_values(&[3], [1.0, 2.0, 3.0]).unwrap();
        assert_eq!(
            a.assign(&src).unwrap_err().code,
            ErrorCode::UnsupportedOperation
        );
        assert_eq!(
            a.data_mut().unwrap_err().code,
            ErrorCode::UnsupportedOperation
        );
        assert_eq!(
            a.data_copy(&mut [0.0; 2]).unwrap_err().code,
            ErrorCode::UnsupportedOperation
        );

        let mut storage = [0.0; 3];
        let block = FixedArray::external(&[3], &mut storage).unwrap();
        a.bind(block).unwrap();
        assert!(a.is_bound());
        a.assign(&src).unwrap();
        drop(a);
        assert_eq!(storage, [1.0, 2.0, 3.0]);
    }

    #[test]
    #[should_panic(expected = "unbound")]
    fn test_unbound_access_panics() {
        let a = FixedArray::<f64, 3>::unbound(&[3]).unwrap();
        let _ = a[[1]];
    }

    #[test]
    #[should_panic(expected = "unbound")]
    fn test_unbound_iteration_panics() {
        let a = FixedArray::<f64, 3>::unbound(&[3]).unwrap();
        let _ = a.iter().count();
    }

    #[test]
    fn test_resize_rules() {
        let mut a = FixedArray::<f64, 6>::new(&[2, 3]).unwrap();
        a.resize(&[2, 3]).unwrap();
        a.set_dims(&[2, 3]).unwrap();
        assert_eq!(
            a.resize(&[3, 2]).unwrap_err().code,
            ErrorCode::UnsupportedOperation
        );
        assert_eq!(a.dims(), &[2, 3]);
    }

    #[test]
    fn test_assign_requires_equal_counts() {
        let mut a = FixedArray::<f64, 4>::new(&[4]).unwrap();
        let b = FixedArray::<f64, 6>::new(&[6]).unwrap();
        assert_eq!(a.assign(&b).unwrap_err().code, ErrorCode::ShapeMismatch);
        assert_eq!(
            a.assign_slice(&[1.0]).unwrap_err().code,
            ErrorCode::ShapeMismatch
        );
        // a 2x2 source is fine for a 4-vector: only the count must agree
        let c = FixedArray::from_values(&[2, 2], [1.0, 2.0, 3.0, 4.0]).unwrap();
        a.assign(&c).unwrap();
        assert_eq!(a.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_append_row() {
        let mut m = FixedArray::<i32, 6>::new(&[2, 3]).unwrap();
        let row = FixedArray::from_values(&[3], [7, 8, 9]).unwrap();
        m.append(2, &row).unwrap();
        assert_eq!(m[[2, 1]], 7);
        assert_eq!(m[[2, 2]], 8);
        assert_eq!(m[[2, 3]], 9);
        assert_eq!(m[[1, 1]], 0);
        assert_eq!(m.append(3, &row).unwrap_err().code, ErrorCode::OutOfRange);
    }

    #[test]
    fn test_data_is_live_view() {
        let a = FixedArray::from_values(&[3], [1, 2, 3]).unwrap();
        assert!(matches!(a.data(), std::borrow::Cow::Borrowed(_)));
        let mut out = [0; 2];
        a.data_copy(&mut out).unwrap();
        assert_eq!(out, [1, 2]);
        assert_eq!(
            a.data_copy(&mut [0; 4]).unwrap_err().code,
            ErrorCode::OutOfRange
        );
    }
}
