// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Multi-dimensional arrays for model variables in generated simulation
//! code.
//!
//! All kinds share the [`Array`] contract: 1-based indices, column-major
//! storage, and value (never reference) semantics on assignment.  They
//! differ in where the elements live:
//!
//! - [`FixedArray`]: compile-time capacity, either inline or aliasing a
//!   block of caller storage,
//! - [`ScatteredArray`]: one borrowed reference per element,
//! - [`DynArray`]: a heap buffer whose extents can change.

#![forbid(unsafe_code)]

pub mod common;

mod array;
mod cstr;
mod dynamic;
mod fixed;
mod scattered;
mod shape;

#[cfg(test)]
mod array_proptest;

pub use array::{Array, Elements, StorageKind};
pub use common::{Error, ErrorCode, ErrorKind, Result};
pub use cstr::CStrArray;
pub use dynamic::DynArray;
pub use fixed::FixedArray;
pub use scattered::ScatteredArray;
pub use shape::{Dims, Indices, Shape};
