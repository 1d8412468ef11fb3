// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Hand-off of model arrays to external dense linear-algebra drivers.
//!
//! Drivers want a contiguous column-major buffer with a leading dimension
//! ([`ColumnMajor`], [`ColumnMajorMut`]) and caller-allocated scratch space
//! sized through a query call ([`run`], [`WorkspaceRoutine`]).  The drivers
//! themselves are not part of this crate.

#![forbid(unsafe_code)]

mod matrix;
mod spectral;
mod workspace;

#[cfg(test)]
mod packed_proptest;

pub use matrix::{ColumnMajor, ColumnMajorMut, required_len};
pub use spectral::{
    Field, PackedEigenArgs, PackedGeneralizedEigen, ProblemType, SpectralJob, Triangle,
    min_sizes, pack, packed_len, packed_offset,
};
pub use workspace::{
    FortranInt, WORKSPACE_QUERY, WorkSize, Workspace, WorkspaceArgs, WorkspacePolicy,
    WorkspaceRoutine, WorkspaceSizes, check_info, fortran_int, query_sizes, run, run_with,
};
