// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Arrays of references to individually owned scalars.
//!
//! Model variables that belong to one logical array are not always stored
//! next to each other.  A `ScatteredArray` keeps one reference per logical
//! element and presents them in the same column-major order the other kinds
//! use.  It never owns the scalars, so the borrow checker keeps it from
//! outliving them.

use std::fmt;

use tracing::trace;

use crate::array::{Array, Elements, StorageKind, check_same_count, check_slice_len, impl_index};
use crate::array_err;
use crate::common::Result;
use crate::shape::Shape;

pub struct ScatteredArray<'a, T> {
    shape: Shape,
    refs: Vec<&'a mut T>,
}

impl<'a, T: Clone> ScatteredArray<'a, T> {
    /// Reference every element of a contiguous block: element `i` of the
    /// array is `data[i]`.
    pub fn from_slice(dims: &[usize], data: &'a mut [T]) -> Result<Self> {
        Self::from_refs(dims, data.iter_mut().collect())
    }

    /// Use a pre-built table of references, in column-major order.
    pub fn from_refs(dims: &[usize], refs: Vec<&'a mut T>) -> Result<Self> {
        let shape = Shape::new(dims)?;
        if refs.len() != shape.num_elems() {
            return array_err!(
                InvalidShape,
                format!(
                    "shape {shape} needs {} references, got {}",
                    shape.num_elems(),
                    refs.len()
                )
            );
        }
        Ok(ScatteredArray { shape, refs })
    }

    /// Copy of the referenced values as they are right now.
    pub fn snapshot(&self) -> Vec<T> {
        trace!(
            elements = self.refs.len(),
            "materializing reference array snapshot"
        );
        self.refs.iter().map(|r| (**r).clone()).collect()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.refs.iter_mut().map(|r| &mut **r)
    }

    /// Give the reference table back to the caller.
    pub fn into_refs(self) -> Vec<&'a mut T> {
        self.refs
    }

    fn scatter(&mut self, data: &[T]) {
        for (dst, src) in self.refs.iter_mut().zip(data) {
            (**dst).clone_from(src);
        }
    }
}

impl<T: Clone> Array<T> for ScatteredArray<'_, T> {
    fn kind(&self) -> StorageKind {
        StorageKind::ScatteredReference
    }

    fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    fn element(&self, linear: usize) -> &T {
        &*self.refs[linear]
    }

    #[inline]
    fn element_mut(&mut self, linear: usize) -> &mut T {
        &mut *self.refs[linear]
    }

    fn iter(&self) -> Elements<'_, T> {
        Elements::refs(&self.refs)
    }

    fn contiguous(&self) -> Option<&[T]> {
        None
    }

    fn data(&self) -> std::borrow::Cow<'_, [T]> {
        std::borrow::Cow::Owned(self.snapshot())
    }

    fn data_mut(&mut self) -> Result<&mut [T]> {
        array_err!(
            UnsupportedOperation,
            "reference arrays have no contiguous storage to expose".to_string()
        )
    }

    fn assign_slice(&mut self, data: &[T]) -> Result<()> {
        check_slice_len(&self.shape, data.len())?;
        self.scatter(data);
        Ok(())
    }

    fn assign(&mut self, other: &dyn Array<T>) -> Result<()> {
        check_same_count(&self.shape, other)?;
        match other.contiguous() {
            Some(values) => self.scatter(values),
            // reference to reference: copy pointee by pointee
            None => {
                for (dst, src) in self.refs.iter_mut().zip(other.iter()) {
                    (**dst).clone_from(src);
                }
            }
        }
        Ok(())
    }

    fn resize(&mut self, dims: &[usize]) -> Result<()> {
        if dims == self.shape.dims() {
            return Ok(());
        }
        array_err!(
            UnsupportedOperation,
            format!(
                "cannot resize reference array of shape {} to {dims:?}",
                self.shape
            )
        )
    }
}

impl_index!(ScatteredArray<'_, T>, [T], Clone);

impl<T: fmt::Debug> fmt::Debug for ScatteredArray<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScatteredArray")
            .field("shape", &self.shape)
            .field("values", &self.refs)
            .finish()
    }
}
