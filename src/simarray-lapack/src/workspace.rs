// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The two-phase workspace protocol of LAPACK-style drivers.
//!
//! A driver called with every workspace length set to [`WORKSPACE_QUERY`]
//! does no computation; it writes the workspace sizes it would prefer into
//! the first slot of each buffer.  The caller then allocates buffers of
//! that size and calls again to do the real work.  Drivers also publish a
//! minimum size for each buffer, which is enough to run unblocked.

use simarray::{Result, workspace_err};
use tracing::{debug, warn};

/// The integer type of the driver interface.
pub type FortranInt = i32;

/// Length passed to a driver to ask for its preferred workspace sizes.
pub const WORKSPACE_QUERY: FortranInt = -1;

pub fn fortran_int(value: usize) -> Result<FortranInt> {
    match FortranInt::try_from(value) {
        Ok(value) => Ok(value),
        Err(_) => workspace_err!(
            BadArgument,
            format!(
                "{value} does not fit in a {}-bit driver integer",
                FortranInt::BITS
            )
        ),
    }
}

/// Element counts of the three scratch buffers.  A driver without a real
/// or integer workspace reports 0 for it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkspaceSizes {
    pub work: usize,
    pub rwork: usize,
    pub iwork: usize,
}

impl WorkspaceSizes {
    pub fn new(work: usize, rwork: usize, iwork: usize) -> Self {
        WorkspaceSizes { work, rwork, iwork }
    }

    /// Whether every buffer is at least as large as in `other`.
    pub fn covers(&self, other: &WorkspaceSizes) -> bool {
        self.work >= other.work && self.rwork >= other.rwork && self.iwork >= other.iwork
    }

    pub fn max(self, other: WorkspaceSizes) -> WorkspaceSizes {
        WorkspaceSizes {
            work: self.work.max(other.work),
            rwork: self.rwork.max(other.rwork),
            iwork: self.iwork.max(other.iwork),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkspacePolicy {
    /// Allocate the published minimum; the driver runs unblocked.
    Minimal,
    /// Ask the driver first and allocate what it prefers.
    Optimal,
}

/// A size a driver reported through the first slot of a workspace buffer.
///
/// Complex drivers are served by the interleaved `[re, im]` layout of
/// `[f64; 2]` and `[f32; 2]`.  A caller with its own complex type wraps it
/// in a local newtype and implements this trait for the wrapper.
pub trait WorkSize: Clone + Default {
    fn to_work_size(&self) -> Option<usize>;
}

impl WorkSize for f64 {
    fn to_work_size(&self) -> Option<usize> {
        if self.is_finite() && *self >= 0.0 && *self <= usize::MAX as f64 {
            Some(self.ceil() as usize)
        } else {
            None
        }
    }
}

impl WorkSize for f32 {
    fn to_work_size(&self) -> Option<usize> {
        f64::from(*self).to_work_size()
    }
}

impl WorkSize for FortranInt {
    fn to_work_size(&self) -> Option<usize> {
        usize::try_from(*self).ok()
    }
}

// the size comes back in the real part
impl<R: WorkSize> WorkSize for [R; 2] {
    fn to_work_size(&self) -> Option<usize> {
        self[0].to_work_size()
    }
}

/// Owned scratch buffers, reusable across driver calls.  `T` is the
/// element type of `work`, `R` the real type of `rwork`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Workspace<T, R = T> {
    pub work: Vec<T>,
    pub rwork: Vec<R>,
    pub iwork: Vec<FortranInt>,
}

impl<T: Clone + Default, R: Clone + Default> Workspace<T, R> {
    pub fn with_sizes(sizes: WorkspaceSizes) -> Self {
        Workspace {
            work: vec![T::default(); sizes.work],
            rwork: vec![R::default(); sizes.rwork],
            iwork: vec![0; sizes.iwork],
        }
    }
}

impl<T, R> Workspace<T, R> {
    pub fn sizes(&self) -> WorkspaceSizes {
        WorkspaceSizes {
            work: self.work.len(),
            rwork: self.rwork.len(),
            iwork: self.iwork.len(),
        }
    }
}

/// Buffers and lengths as a driver receives them.  During a size query
/// every length is [`WORKSPACE_QUERY`] and each buffer has one slot for
/// the answer.
#[derive(Debug)]
pub struct WorkspaceArgs<'w, T, R> {
    pub work: &'w mut [T],
    pub lwork: FortranInt,
    pub rwork: &'w mut [R],
    pub lrwork: FortranInt,
    pub iwork: &'w mut [FortranInt],
    pub liwork: FortranInt,
}

impl<T, R> WorkspaceArgs<'_, T, R> {
    pub fn is_query(&self) -> bool {
        self.lwork == WORKSPACE_QUERY
            || self.lrwork == WORKSPACE_QUERY
            || self.liwork == WORKSPACE_QUERY
    }
}

/// A driver that takes caller-provided scratch space.  Implementations
/// hold their own matrix arguments and return the driver's `info` code.
pub trait WorkspaceRoutine {
    type Scalar: WorkSize;
    type Real: WorkSize;

    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Smallest buffers the driver accepts for the current problem.
    fn minimal_sizes(&self) -> WorkspaceSizes;

    fn invoke(&mut self, args: &mut WorkspaceArgs<'_, Self::Scalar, Self::Real>) -> FortranInt;
}

/// Map a driver `info` code to a result.
pub fn check_info(routine: &str, info: FortranInt) -> Result<()> {
    if info < 0 {
        return workspace_err!(
            BadArgument,
            format!(
                "{routine}: argument {} had an illegal value",
                -i64::from(info)
            )
        );
    }
    if info > 0 {
        return workspace_err!(
            RoutineFailed,
            format!("{routine} failed with info = {info}")
        );
    }
    Ok(())
}

/// Ask the routine for its preferred sizes, never less than its minimum.
pub fn query_sizes<W: WorkspaceRoutine>(routine: &mut W) -> Result<WorkspaceSizes> {
    let minimal = routine.minimal_sizes();
    let mut work = vec![W::Scalar::default(); 1];
    let mut rwork = vec![W::Real::default(); 1];
    let mut iwork: Vec<FortranInt> = vec![0; 1];
    let info = routine.invoke(&mut WorkspaceArgs {
        work: &mut work,
        lwork: WORKSPACE_QUERY,
        rwork: &mut rwork,
        lrwork: WORKSPACE_QUERY,
        iwork: &mut iwork,
        liwork: WORKSPACE_QUERY,
    });
    check_info(routine.name(), info)?;

    let name = routine.name();
    let reported = |slot: &str, size: Option<usize>, fallback: usize| match size {
        Some(size) => size,
        None => {
            warn!(
                routine = name,
                slot,
                "workspace query returned an unusable size"
            );
            fallback
        }
    };
    let preferred = WorkspaceSizes {
        work: reported("work", work[0].to_work_size(), minimal.work),
        rwork: reported("rwork", rwork[0].to_work_size(), minimal.rwork),
        iwork: reported("iwork", iwork[0].to_work_size(), minimal.iwork),
    };
    debug!(routine = name, ?preferred, ?minimal, "workspace query");
    Ok(preferred.max(minimal))
}

/// Call the routine with caller-provided buffers, which must cover the
/// routine's minimum sizes.
pub fn run_with<W: WorkspaceRoutine>(
    routine: &mut W,
    workspace: &mut Workspace<W::Scalar, W::Real>,
) -> Result<()> {
    let minimal = routine.minimal_sizes();
    let sizes = workspace.sizes();
    if !sizes.covers(&minimal) {
        return workspace_err!(
            WorkspaceTooSmall,
            format!(
                "{}: workspace {sizes:?} is smaller than the minimum {minimal:?}",
                routine.name()
            )
        );
    }
    let mut args = WorkspaceArgs {
        lwork: fortran_int(sizes.work)?,
        lrwork: fortran_int(sizes.rwork)?,
        liwork: fortran_int(sizes.iwork)?,
        work: &mut workspace.work,
        rwork: &mut workspace.rwork,
        iwork: &mut workspace.iwork,
    };
    let info = routine.invoke(&mut args);
    check_info(routine.name(), info)
}

/// Size, allocate and run in one step, returning the workspace so later
/// calls on same-sized problems can reuse it through [`run_with`].
pub fn run<W: WorkspaceRoutine>(
    routine: &mut W,
    policy: WorkspacePolicy,
) -> Result<Workspace<W::Scalar, W::Real>> {
    let sizes = match policy {
        WorkspacePolicy::Minimal => routine.minimal_sizes(),
        WorkspacePolicy::Optimal => query_sizes(routine)?,
    };
    let mut workspace = Workspace::with_sizes(sizes);
    run_with(routine, &mut workspace)?;
    Ok(workspace)
}
