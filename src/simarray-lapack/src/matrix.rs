// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Column-major matrix views in the form dense linear-algebra drivers take
//! them: a buffer, the number of rows and columns, and a leading dimension.
//!
//! Column `j` (1-based) starts at `ld * (j - 1)`, so the buffer must hold at
//! least `ld * (cols - 1) + rows` elements.  Views can be built directly
//! over a slice or from any array with contiguous storage; scattered
//! reference arrays must be copied into a `DynArray` first.

use std::fmt;

use simarray::{Array, Result, array_err, workspace_err};

use crate::workspace::{FortranInt, fortran_int};

/// `(rows, cols)` of a rank 1 or rank 2 array; vectors are one column.
fn matrix_dims(dims: &[usize]) -> Result<(usize, usize)> {
    match *dims {
        [n] => Ok((n, 1)),
        [rows, cols] => Ok((rows, cols)),
        _ => array_err!(
            ShapeMismatch,
            format!("a rank {} array is not a matrix", dims.len())
        ),
    }
}

/// Elements a column-major buffer must hold for the given layout.
pub fn required_len(rows: usize, cols: usize, ld: usize) -> Option<usize> {
    if rows == 0 || cols == 0 {
        return Some(0);
    }
    ld.checked_mul(cols - 1)?.checked_add(rows)
}

fn check_layout(len: usize, rows: usize, cols: usize, ld: usize) -> Result<()> {
    if ld < rows.max(1) {
        return workspace_err!(
            BadArgument,
            format!("leading dimension {ld} is smaller than max(1, {rows})")
        );
    }
    match required_len(rows, cols, ld) {
        Some(needed) if needed <= len => Ok(()),
        Some(needed) => array_err!(
            ShapeMismatch,
            format!("{rows}x{cols} matrix with ld {ld} needs {needed} elements, got {len}")
        ),
        None => array_err!(
            InvalidShape,
            format!("{rows}x{cols} matrix with leading dimension {ld} overflows usize")
        ),
    }
}

fn not_contiguous<T: Clone, A: Array<T> + ?Sized>(array: &A) -> simarray::Error {
    simarray::Error::new(
        simarray::ErrorKind::Array,
        simarray::ErrorCode::UnsupportedOperation,
        Some(format!(
            "{:?} array of shape {} has no contiguous column-major buffer",
            array.kind(),
            array.shape()
        )),
    )
}

pub struct ColumnMajor<'a, T> {
    data: &'a [T],
    rows: usize,
    cols: usize,
    ld: usize,
}

impl<'a, T> ColumnMajor<'a, T> {
    pub fn new(data: &'a [T], rows: usize, cols: usize, ld: usize) -> Result<Self> {
        check_layout(data.len(), rows, cols, ld)?;
        Ok(ColumnMajor {
            data,
            rows,
            cols,
            ld,
        })
    }

    /// A view of a rank 1 or rank 2 array's own buffer, with
    /// `ld = max(1, rows)`.
    pub fn from_array<A>(array: &'a A) -> Result<Self>
    where
        T: Clone,
        A: Array<T> + ?Sized,
    {
        let (rows, cols) = matrix_dims(array.dims())?;
        match array.contiguous() {
            Some(data) => ColumnMajor::new(data, rows, cols, rows.max(1)),
            None => Err(not_contiguous(array)),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn ld(&self) -> usize {
        self.ld
    }

    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Element `(i, j)`, both 1-based.
    pub fn get(&self, i: usize, j: usize) -> Option<&'a T> {
        if i == 0 || i > self.rows || j == 0 || j > self.cols {
            return None;
        }
        self.data.get(i - 1 + self.ld * (j - 1))
    }

    pub fn column(&self, j: usize) -> Option<&'a [T]> {
        if j == 0 || j > self.cols {
            return None;
        }
        let start = self.ld * (j - 1);
        self.data.get(start..start + self.rows)
    }

    /// `(m, n, lda)` as the driver's integer type.
    pub fn fortran_dims(&self) -> Result<(FortranInt, FortranInt, FortranInt)> {
        Ok((
            fortran_int(self.rows)?,
            fortran_int(self.cols)?,
            fortran_int(self.ld)?,
        ))
    }
}

impl<T> Clone for ColumnMajor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ColumnMajor<'_, T> {}

impl<T> fmt::Debug for ColumnMajor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnMajor")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("ld", &self.ld)
            .finish()
    }
}

pub struct ColumnMajorMut<'a, T> {
    data: &'a mut [T],
    rows: usize,
    cols: usize,
    ld: usize,
}

impl<'a, T> ColumnMajorMut<'a, T> {
    pub fn new(data: &'a mut [T], rows: usize, cols: usize, ld: usize) -> Result<Self> {
        check_layout(data.len(), rows, cols, ld)?;
        Ok(ColumnMajorMut {
            data,
            rows,
            cols,
            ld,
        })
    }

    /// A mutable view of a rank 1 or rank 2 array's own buffer.  Output
    /// written by a driver lands directly in the array.
    pub fn from_array<A>(array: &'a mut A) -> Result<Self>
    where
        T: Clone,
        A: Array<T> + ?Sized,
    {
        let (rows, cols) = matrix_dims(array.dims())?;
        if !array.kind().is_contiguous() {
            return Err(not_contiguous(array));
        }
        let data = array.data_mut()?;
        ColumnMajorMut::new(data, rows, cols, rows.max(1))
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn ld(&self) -> usize {
        self.ld
    }

    pub fn as_slice(&self) -> &[T] {
        &*self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut *self.data
    }

    /// Give up the view, keeping the borrow of the buffer.
    pub fn into_slice(self) -> &'a mut [T] {
        self.data
    }

    pub fn as_view(&self) -> ColumnMajor<'_, T> {
        ColumnMajor {
            data: &*self.data,
            rows: self.rows,
            cols: self.cols,
            ld: self.ld,
        }
    }

    pub fn get(&self, i: usize, j: usize) -> Option<&T> {
        self.as_view().get(i, j)
    }

    pub fn get_mut(&mut self, i: usize, j: usize) -> Option<&mut T> {
        if i == 0 || i > self.rows || j == 0 || j > self.cols {
            return None;
        }
        self.data.get_mut(i - 1 + self.ld * (j - 1))
    }

    pub fn column_mut(&mut self, j: usize) -> Option<&mut [T]> {
        if j == 0 || j > self.cols {
            return None;
        }
        let start = self.ld * (j - 1);
        self.data.get_mut(start..start + self.rows)
    }

    pub fn fortran_dims(&self) -> Result<(FortranInt, FortranInt, FortranInt)> {
        self.as_view().fortran_dims()
    }
}

impl<T> fmt::Debug for ColumnMajorMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnMajorMut")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("ld", &self.ld)
            .finish()
    }
}
