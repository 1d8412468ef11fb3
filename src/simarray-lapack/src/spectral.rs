// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The packed generalized symmetric (real) / Hermitian (complex)
//! definite eigenproblem, solved by divide and conquer (`?spgvd` and
//! `?hpgvd`).
//!
//! `A` and `B` are `n`-by-`n` and stored packed: only one triangle, column
//! by column, in `n(n+1)/2` elements.  The driver itself is supplied by the
//! caller (normally an FFI binding); this module validates the arguments,
//! knows the driver's minimum workspace, and plugs it into the
//! query/allocate/run protocol.

use simarray::{Result, array_err, workspace_err};

use crate::matrix::{ColumnMajor, ColumnMajorMut};
use crate::workspace::{
    FortranInt, WorkSize, WorkspaceArgs, WorkspaceRoutine, WorkspaceSizes, fortran_int,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpectralJob {
    ValuesOnly,
    ValuesAndVectors,
}

impl SpectralJob {
    /// The `jobz` character.
    pub fn jobz(self) -> u8 {
        match self {
            SpectralJob::ValuesOnly => b'N',
            SpectralJob::ValuesAndVectors => b'V',
        }
    }
}

/// Which generalized problem to solve (`itype`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProblemType {
    /// `A x = lambda B x`
    AxLambdaBx = 1,
    /// `A B x = lambda x`
    ABxLambdaX = 2,
    /// `B A x = lambda x`
    BAxLambdaX = 3,
}

impl ProblemType {
    pub fn itype(self) -> FortranInt {
        self as FortranInt
    }
}

/// Which triangle of `A` and `B` the packed arrays hold (`uplo`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Triangle {
    Upper,
    Lower,
}

impl Triangle {
    pub fn uplo(self) -> u8 {
        match self {
            Triangle::Upper => b'U',
            Triangle::Lower => b'L',
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
    Real,
    Complex,
}

pub fn packed_len(n: usize) -> usize {
    n * (n + 1) / 2
}

/// 0-based position of `A(i, j)` (1-based) in packed storage, or `None`
/// when `(i, j)` is outside the stored triangle.
pub fn packed_offset(triangle: Triangle, n: usize, i: usize, j: usize) -> Option<usize> {
    if i == 0 || j == 0 || i > n || j > n {
        return None;
    }
    match triangle {
        Triangle::Upper if i <= j => Some(i - 1 + j * (j - 1) / 2),
        Triangle::Lower if i >= j => Some(i - 1 + (j - 1) * (2 * n - j) / 2),
        _ => None,
    }
}

/// Copy one triangle of a square column-major matrix into packed storage.
pub fn pack<T: Clone>(matrix: &ColumnMajor<'_, T>, triangle: Triangle) -> Result<Vec<T>> {
    let n = matrix.rows();
    if matrix.cols() != n {
        return array_err!(
            ShapeMismatch,
            format!(
                "packed storage needs a square matrix, got {n}x{}",
                matrix.cols()
            )
        );
    }
    let mut packed = Vec::with_capacity(packed_len(n));
    for j in 1..=n {
        let rows = match triangle {
            Triangle::Upper => 1..=j,
            Triangle::Lower => j..=n,
        };
        for i in rows {
            if let Some(value) = matrix.get(i, j) {
                packed.push(value.clone());
            }
        }
    }
    Ok(packed)
}

/// Minimum workspace of the packed divide-and-conquer driver.
pub fn min_sizes(field: Field, job: SpectralJob, n: usize) -> WorkspaceSizes {
    let iwork = if job == SpectralJob::ValuesOnly || n < 2 {
        1
    } else {
        3 + 5 * n
    };
    match field {
        Field::Real => {
            let work = if n < 2 {
                1
            } else if job == SpectralJob::ValuesOnly {
                2 * n
            } else {
                1 + 6 * n + n * n
            };
            WorkspaceSizes::new(work, 0, iwork)
        }
        Field::Complex => {
            let (work, rwork) = if n < 2 {
                (1, 1)
            } else if job == SpectralJob::ValuesOnly {
                (n, n)
            } else {
                (2 * n, 1 + 5 * n + 2 * n * n)
            };
            WorkspaceSizes::new(work, rwork, iwork)
        }
    }
}

/// Everything but the workspace, as the driver receives it.
#[derive(Debug)]
pub struct PackedEigenArgs<'a, T, R> {
    pub itype: FortranInt,
    pub jobz: u8,
    pub uplo: u8,
    pub n: FortranInt,
    pub ap: &'a mut [T],
    pub bp: &'a mut [T],
    pub w: &'a mut [R],
    pub z: &'a mut [T],
    pub ldz: FortranInt,
}

/// A validated packed generalized eigenproblem, runnable with
/// [`crate::run`].  `T` is the matrix element type, `R` the (real)
/// eigenvalue type; `F` calls the actual driver and returns its `info`.
pub struct PackedGeneralizedEigen<'a, T, R, F> {
    field: Field,
    job: SpectralJob,
    n: usize,
    args: PackedEigenArgs<'a, T, R>,
    driver: F,
}

impl<'a, T, R, F> PackedGeneralizedEigen<'a, T, R, F>
where
    F: FnMut(&mut PackedEigenArgs<'a, T, R>, &mut WorkspaceArgs<'_, T, R>) -> FortranInt,
{
    /// `n` is taken from the length of `w`.  Eigenvectors, when requested,
    /// are written to `z`, which must be `n`-by-`n`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        field: Field,
        problem: ProblemType,
        job: SpectralJob,
        triangle: Triangle,
        ap: &'a mut [T],
        bp: &'a mut [T],
        w: &'a mut [R],
        z: Option<ColumnMajorMut<'a, T>>,
        driver: F,
    ) -> Result<Self> {
        let n = w.len();
        let needed = packed_len(n);
        for (name, len) in [("ap", ap.len()), ("bp", bp.len())] {
            if len < needed {
                return array_err!(
                    ShapeMismatch,
                    format!("{name} holds {len} elements, order {n} needs {needed}")
                );
            }
        }
        let (z, ldz): (&'a mut [T], usize) = match (job, z) {
            (_, Some(z)) => {
                if z.rows() != n || z.cols() != n {
                    return array_err!(
                        ShapeMismatch,
                        format!("z is {}x{}, eigenvectors need {n}x{n}", z.rows(), z.cols())
                    );
                }
                let ldz = z.ld();
                (z.into_slice(), ldz)
            }
            (SpectralJob::ValuesOnly, None) => (&mut [], 1),
            (SpectralJob::ValuesAndVectors, None) => {
                return workspace_err!(
                    BadArgument,
                    "eigenvectors were requested without an output matrix".to_string()
                );
            }
        };
        Ok(PackedGeneralizedEigen {
            field,
            job,
            n,
            args: PackedEigenArgs {
                itype: problem.itype(),
                jobz: job.jobz(),
                uplo: triangle.uplo(),
                n: fortran_int(n)?,
                ap,
                bp,
                w,
                z,
                ldz: fortran_int(ldz)?,
            },
            driver,
        })
    }

    pub fn order(&self) -> usize {
        self.n
    }

    pub fn eigenvalues(&self) -> &[R] {
        &*self.args.w
    }

    /// Eigenvectors as columns, when they were requested.
    pub fn eigenvectors(&self) -> Option<ColumnMajor<'_, T>> {
        if self.job == SpectralJob::ValuesOnly || self.args.z.is_empty() {
            return None;
        }
        ColumnMajor::new(&*self.args.z, self.n, self.n, self.args.ldz as usize).ok()
    }
}

impl<'a, T, R, F> WorkspaceRoutine for PackedGeneralizedEigen<'a, T, R, F>
where
    T: WorkSize,
    R: WorkSize,
    F: FnMut(&mut PackedEigenArgs<'a, T, R>, &mut WorkspaceArgs<'_, T, R>) -> FortranInt,
{
    type Scalar = T;
    type Real = R;

    fn name(&self) -> &str {
        match self.field {
            Field::Real => "spgvd",
            Field::Complex => "hpgvd",
        }
    }

    fn minimal_sizes(&self) -> WorkspaceSizes {
        min_sizes(self.field, self.job, self.n)
    }

    fn invoke(&mut self, args: &mut WorkspaceArgs<'_, T, R>) -> FortranInt {
        (self.driver)(&mut self.args, args)
    }
}
