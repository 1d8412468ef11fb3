// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The contract shared by every model-variable array.
//!
//! Generated equation code only ever talks to arrays through [`Array`]:
//! 1-based multi-index access, shape queries, bulk assignment and export of
//! the raw column-major buffer.  The concrete kinds differ in who owns the
//! storage and whether the shape may change; see [`StorageKind`].

use std::borrow::Cow;
use std::slice;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::array_err;
use crate::common::Result;
use crate::shape::Shape;

/// Which storage strategy backs an array.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StorageKind {
    /// Inline buffer of compile-time capacity, owned by the array.
    FixedOwned,
    /// Compile-time capacity, aliasing a caller-owned contiguous block.
    FixedExternal,
    /// A table of references to individually owned scalars.
    ScatteredReference,
    /// Heap buffer owned by the array; the shape may change.
    Resizable,
}

impl StorageKind {
    pub fn is_reference(self) -> bool {
        self == StorageKind::ScatteredReference
    }

    pub fn is_fixed_shape(self) -> bool {
        self != StorageKind::Resizable
    }

    pub fn owns_storage(self) -> bool {
        matches!(self, StorageKind::FixedOwned | StorageKind::Resizable)
    }

    /// Whether the elements live in one contiguous column-major buffer that
    /// can be handed to external numeric routines.
    pub fn is_contiguous(self) -> bool {
        !self.is_reference()
    }
}

pub trait Array<T: Clone> {
    fn kind(&self) -> StorageKind;

    fn shape(&self) -> &Shape;

    /// Element at column-major position `linear`.  Panics when `linear` is
    /// not below `num_elems()`.
    fn element(&self, linear: usize) -> &T;

    fn element_mut(&mut self, linear: usize) -> &mut T;

    /// Elements in column-major order.  Panics on an unbound external
    /// array, like element access does.
    fn iter(&self) -> Elements<'_, T>;

    /// A live view of the contiguous backing buffer, if there is one.
    fn contiguous(&self) -> Option<&[T]>;

    /// Mutable view of the contiguous backing buffer.  Scattered reference
    /// arrays have no such buffer and fail with `UnsupportedOperation`.
    fn data_mut(&mut self) -> Result<&mut [T]>;

    /// Overwrite every element, in column-major order, from `data`.
    fn assign_slice(&mut self, data: &[T]) -> Result<()>;

    /// Copy values (never references) from `other`.  Fixed-shape kinds
    /// require matching element counts; resizable arrays adopt the shape of
    /// `other` first.
    fn assign(&mut self, other: &dyn Array<T>) -> Result<()>;

    /// Change the shape.  Only resizable arrays can do this; for the
    /// fixed-shape kinds a request for the current shape is a no-op and
    /// anything else is `UnsupportedOperation`.
    fn resize(&mut self, dims: &[usize]) -> Result<()>;

    fn set_dims(&mut self, dims: &[usize]) -> Result<()> {
        self.resize(dims)
    }

    /// False only for an external fixed array that was never bound to
    /// storage.
    fn is_bound(&self) -> bool {
        true
    }

    fn dims(&self) -> &[usize] {
        self.shape().dims()
    }

    /// Size of dimension `d`, counted from 1.
    fn dim(&self, d: usize) -> Result<usize> {
        self.shape().dim(d)
    }

    fn num_dims(&self) -> usize {
        self.shape().rank()
    }

    fn num_elems(&self) -> usize {
        self.shape().num_elems()
    }

    /// 1-based multi-index access.  Out-of-range indices are a bug in the
    /// generated code and panic.
    fn at(&self, idx: &[usize]) -> &T {
        match self.shape().offset(idx) {
            Some(off) => self.element(off),
            None => panic!("{}", self.shape().out_of_range(idx)),
        }
    }

    fn at_mut(&mut self, idx: &[usize]) -> &mut T {
        match self.shape().offset(idx) {
            Some(off) => self.element_mut(off),
            None => panic!("{}", self.shape().out_of_range(idx)),
        }
    }

    fn try_at(&self, idx: &[usize]) -> Result<&T> {
        let off = self.shape().checked_offset(idx)?;
        Ok(self.element(off))
    }

    fn try_at_mut(&mut self, idx: &[usize]) -> Result<&mut T> {
        let off = self.shape().checked_offset(idx)?;
        Ok(self.element_mut(off))
    }

    /// Read-only column-major data.  Contiguous kinds return a borrowed live
    /// view; scattered reference arrays build a fresh snapshot on every call
    /// which does not follow later mutations.
    fn data(&self) -> Cow<'_, [T]> {
        match self.contiguous() {
            Some(data) => Cow::Borrowed(data),
            None => Cow::Owned(self.iter().cloned().collect()),
        }
    }

    /// Copy the first `out.len()` elements into `out`.
    fn data_copy(&self, out: &mut [T]) -> Result<()> {
        if out.len() > self.num_elems() {
            return array_err!(
                OutOfRange,
                format!(
                    "cannot export {} elements from an array of {}",
                    out.len(),
                    self.num_elems()
                )
            );
        }
        if !self.is_bound() {
            return array_err!(
                UnsupportedOperation,
                "export from an unbound external array".to_string()
            );
        }
        for (dst, src) in out.iter_mut().zip(self.iter()) {
            dst.clone_from(src);
        }
        Ok(())
    }

    /// Copy a rank-(k-1) array into the slice whose first index is `row`
    /// (1-based), i.e. `self(row, j, k, ..) = src(j, k, ..)`.
    fn append(&mut self, row: usize, src: &dyn Array<T>) -> Result<()> {
        let row_shape = match self.shape().row_shape() {
            Some(row_shape) => row_shape,
            None => {
                return array_err!(
                    ShapeMismatch,
                    "append needs an array of rank 2 or more".to_string()
                );
            }
        };
        if src.dims() != row_shape.dims() {
            return array_err!(
                ShapeMismatch,
                format!(
                    "row of shape {row_shape} cannot hold an array of shape {}",
                    src.shape()
                )
            );
        }
        let rows = self.dims()[0];
        if row == 0 || row > rows {
            return array_err!(OutOfRange, format!("row {row} outside 1..={rows}"));
        }
        if !self.is_bound() {
            return array_err!(
                UnsupportedOperation,
                "append into an unbound external array".to_string()
            );
        }
        check_bound(src)?;
        for (n, value) in src.iter().enumerate() {
            self.element_mut(row - 1 + rows * n).clone_from(value);
        }
        Ok(())
    }
}

/// Column-major iterator over the elements of any array kind.
pub struct Elements<'b, T> {
    inner: ElementsInner<'b, T>,
}

enum ElementsInner<'b, T> {
    Buffer(slice::Iter<'b, T>),
    Refs(slice::Iter<'b, &'b mut T>),
}

impl<'b, T> Elements<'b, T> {
    pub(crate) fn buffer(data: &'b [T]) -> Self {
        Elements {
            inner: ElementsInner::Buffer(data.iter()),
        }
    }

    pub(crate) fn refs(refs: &'b [&'b mut T]) -> Self {
        Elements {
            inner: ElementsInner::Refs(refs.iter()),
        }
    }
}

impl<'b, T> Iterator for Elements<'b, T> {
    type Item = &'b T;

    fn next(&mut self) -> Option<&'b T> {
        match &mut self.inner {
            ElementsInner::Buffer(iter) => iter.next(),
            ElementsInner::Refs(iter) => iter.next().map(|r| &**r),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            ElementsInner::Buffer(iter) => iter.size_hint(),
            ElementsInner::Refs(iter) => iter.size_hint(),
        }
    }
}

impl<T> ExactSizeIterator for Elements<'_, T> {}

/// Reading from an unbound external array is refused rather than treated
/// as empty.
pub(crate) fn check_bound<T: Clone>(src: &dyn Array<T>) -> Result<()> {
    if !src.is_bound() {
        return array_err!(
            UnsupportedOperation,
            format!(
                "cannot read from unbound external array of shape {}",
                src.shape()
            )
        );
    }
    Ok(())
}

/// Check that `other` can be copied into an array of `shape` without
/// reshaping.
pub(crate) fn check_same_count<T: Clone>(shape: &Shape, other: &dyn Array<T>) -> Result<()> {
    check_bound(other)?;
    if other.num_elems() != shape.num_elems() {
        return array_err!(
            ShapeMismatch,
            format!(
                "cannot assign {} elements (shape {}) to an array of {} elements (shape {shape})",
                other.num_elems(),
                other.shape(),
                shape.num_elems()
            )
        );
    }
    Ok(())
}

pub(crate) fn check_slice_len(shape: &Shape, len: usize) -> Result<()> {
    if len != shape.num_elems() {
        return array_err!(
            ShapeMismatch,
            format!(
                "expected {} values for shape {shape}, got {len}",
                shape.num_elems()
            )
        );
    }
    Ok(())
}

/// Copy every value of `src` into the contiguous buffer `dst`; the caller has
/// checked that the element counts agree.
pub(crate) fn copy_into<T: Clone>(dst: &mut [T], src: &dyn Array<T>) {
    match src.contiguous() {
        Some(values) => dst.clone_from_slice(values),
        None => {
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                d.clone_from(s);
            }
        }
    }
}

macro_rules! impl_index {
    ($ty:ty, [$($gen:tt)*], $($bound:tt)+) => {
        impl<$($gen)*, const R: usize> std::ops::Index<[usize; R]> for $ty
        where
            T: $($bound)+,
        {
            type Output = T;

            fn index(&self, idx: [usize; R]) -> &T {
                $crate::array::Array::at(self, &idx)
            }
        }

        impl<$($gen)*, const R: usize> std::ops::IndexMut<[usize; R]> for $ty
        where
            T: $($bound)+,
        {
            fn index_mut(&mut self, idx: [usize; R]) -> &mut T {
                $crate::array::Array::at_mut(self, &idx)
            }
        }
    };
}

pub(crate) use impl_index;
