// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Heap-backed arrays whose shape may change at runtime.
//!
//! The rank of a `DynArray` is fixed when it is created; the extents are
//! not.  When the shape changes every value whose index tuple exists in
//! both the old and the new shape keeps its logical position, and new
//! positions hold `T::default()`.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::array::{Array, Elements, StorageKind, check_bound, check_slice_len, impl_index};
use crate::array_err;
use crate::common::Result;
use crate::shape::Shape;

#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        try_from = "RawDynArray<T>",
        bound(deserialize = "T: Deserialize<'de>")
    )
)]
pub struct DynArray<T> {
    shape: Shape,
    data: Vec<T>,
}

// unchecked wire form; converted through `DynArray::from_vec`
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawDynArray<T> {
    shape: Shape,
    data: Vec<T>,
}

#[cfg(feature = "serde")]
impl<T> TryFrom<RawDynArray<T>> for DynArray<T> {
    type Error = crate::common::Error;

    fn try_from(raw: RawDynArray<T>) -> Result<Self> {
        DynArray::from_vec(raw.shape.dims(), raw.data)
    }
}

impl<T> DynArray<T> {
    /// Take ownership of `data`, which is in column-major order for `dims`.
    pub fn from_vec(dims: &[usize], data: Vec<T>) -> Result<Self> {
        let shape = Shape::new(dims)?;
        check_slice_len(&shape, data.len())?;
        Ok(DynArray { shape, data })
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    fn check_rank(&self, dims: &[usize]) -> Result<()> {
        if dims.len() != self.shape.rank() {
            return array_err!(
                ShapeMismatch,
                format!(
                    "cannot change a rank {} array to rank {} ({dims:?})",
                    self.shape.rank(),
                    dims.len()
                )
            );
        }
        Ok(())
    }
}

impl<T: Clone> DynArray<T> {
    /// A contiguous value copy of any array, scattered ones included.
    /// Fails on an unbound external array.
    pub fn from_array(other: &dyn Array<T>) -> Result<Self> {
        check_bound(other)?;
        Ok(DynArray {
            shape: other.shape().clone(),
            data: other.iter().cloned().collect(),
        })
    }
}

impl<T: Clone + Default> DynArray<T> {
    pub fn new(dims: &[usize]) -> Result<Self> {
        let shape = Shape::new(dims)?;
        let data = vec![T::default(); shape.num_elems()];
        Ok(DynArray { shape, data })
    }

    /// An array of the given rank with every extent zero, waiting for a
    /// `resize` or an `assign`.
    pub fn empty(rank: usize) -> Result<Self> {
        Ok(DynArray {
            shape: Shape::empty(rank)?,
            data: Vec::new(),
        })
    }

    fn relayout(&mut self, shape: Shape) {
        let n = shape.num_elems();
        let rank = shape.rank();
        // only the last extent changed: the column-major prefix stays put
        if shape.dims()[..rank - 1] == self.shape.dims()[..rank - 1] {
            self.data.resize(n, T::default());
        } else {
            let mut data = vec![T::default(); n];
            let old = std::mem::take(&mut self.data);
            for (linear, value) in old.into_iter().enumerate() {
                let moved = self
                    .shape
                    .index_of(linear)
                    .and_then(|idx| shape.offset(&idx));
                if let Some(off) = moved {
                    data[off] = value;
                }
            }
            self.data = data;
        }
        self.shape = shape;
    }
}

impl<T: Clone + Default> Array<T> for DynArray<T> {
    fn kind(&self) -> StorageKind {
        StorageKind::Resizable
    }

    fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    fn element(&self, linear: usize) -> &T {
        &self.data[linear]
    }

    #[inline]
    fn element_mut(&mut self, linear: usize) -> &mut T {
        &mut self.data[linear]
    }

    fn iter(&self) -> Elements<'_, T> {
        Elements::buffer(&self.data)
    }

    fn contiguous(&self) -> Option<&[T]> {
        Some(&self.data)
    }

    fn data_mut(&mut self) -> Result<&mut [T]> {
        Ok(&mut self.data)
    }

    fn assign_slice(&mut self, data: &[T]) -> Result<()> {
        check_slice_len(&self.shape, data.len())?;
        self.data.clone_from_slice(data);
        Ok(())
    }

    fn assign(&mut self, other: &dyn Array<T>) -> Result<()> {
        self.check_rank(other.dims())?;
        check_bound(other)?;
        if other.dims() != self.shape.dims() {
            debug!(from = %self.shape, to = %other.shape(), "reshaping on assignment");
            self.shape = other.shape().clone();
        }
        self.data.clear();
        self.data.extend(other.iter().cloned());
        Ok(())
    }

    fn resize(&mut self, dims: &[usize]) -> Result<()> {
        self.check_rank(dims)?;
        if dims == self.shape.dims() {
            return Ok(());
        }
        let shape = Shape::new(dims)?;
        debug!(from = %self.shape, to = %shape, "resizing array");
        self.relayout(shape);
        Ok(())
    }
}

impl_index!(DynArray<T>, [T], Clone + Default);

impl<T> From<Vec<T>> for DynArray<T> {
    /// A rank-1 array over `data`.
    fn from(data: Vec<T>) -> Self {
        DynArray {
            shape: Shape::vector(data.len()),
            data,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for DynArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynArray")
            .field("shape", &self.shape)
            .field("values", &self.data)
            .finish()
    }
}
