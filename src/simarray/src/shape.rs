// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Shape bookkeeping and column-major index arithmetic.
//!
//! Every array kind stores its elements in Fortran order: the first index
//! varies fastest.  For a shape `[n1, n2, ..., nk]` and a 1-based index
//! tuple `(i1, i2, ..., ik)` the linear offset is
//!
//! ```text
//! (i1-1) + n1*((i2-1) + n2*((i3-1) + ...))
//! ```
//!
//! which is the same formula the generated code uses for its 2-D and 3-D
//! specializations, generalized over rank.

use std::fmt;

use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::array_err;
use crate::common::{Error, ErrorCode, ErrorKind, Result};

/// Dimension sizes (or an index tuple); rank 3 and below stay inline.
pub type Dims = SmallVec<[usize; 3]>;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<usize>", into = "Vec<usize>"))]
pub struct Shape {
    dims: Dims,
}

impl Shape {
    /// Build a shape from an ordered sequence of dimension sizes.  Rank 0 is
    /// rejected; a zero extent is allowed and yields an empty array.
    pub fn new(dims: &[usize]) -> Result<Shape> {
        if dims.is_empty() {
            return array_err!(
                InvalidShape,
                "arrays need at least one dimension".to_string()
            );
        }
        let mut count: usize = 1;
        for &n in dims {
            count = match count.checked_mul(n) {
                Some(count) => count,
                None => {
                    return array_err!(
                        InvalidShape,
                        format!("element count of {dims:?} overflows usize")
                    );
                }
            };
        }
        Ok(Shape {
            dims: Dims::from_slice(dims),
        })
    }

    /// A shape of the given rank with every extent zero.
    pub fn empty(rank: usize) -> Result<Shape> {
        Shape::new(&vec![0; rank])
    }

    pub fn vector(n: usize) -> Shape {
        Shape {
            dims: smallvec::smallvec![n],
        }
    }

    pub fn matrix(rows: usize, cols: usize) -> Result<Shape> {
        Shape::new(&[rows, cols])
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Size of dimension `d`, counted from 1.
    pub fn dim(&self, d: usize) -> Result<usize> {
        if d == 0 || d > self.rank() {
            return array_err!(
                BadDimension,
                format!("dimension {d} requested from a rank {} array", self.rank())
            );
        }
        Ok(self.dims[d - 1])
    }

    pub fn num_elems(&self) -> usize {
        self.dims.iter().product()
    }

    /// Element strides in column-major order; `strides()[0] == 1`.
    pub fn strides(&self) -> Dims {
        let mut strides = Dims::with_capacity(self.rank());
        let mut stride = 1;
        for &n in self.dims.iter() {
            strides.push(stride);
            stride *= n;
        }
        strides
    }

    /// Distance in elements between successive columns, as dense
    /// linear-algebra routines expect it (never less than 1).
    pub fn leading_dimension(&self) -> usize {
        self.dims[0].max(1)
    }

    /// Linear offset of a 1-based index tuple, or `None` when the tuple has
    /// the wrong rank or any index falls outside its dimension.
    #[inline]
    pub fn offset(&self, idx: &[usize]) -> Option<usize> {
        if idx.len() != self.dims.len() {
            return None;
        }
        let mut offset = 0;
        let mut stride = 1;
        for (&i, &n) in idx.iter().zip(self.dims.iter()) {
            if i == 0 || i > n {
                return None;
            }
            offset += (i - 1) * stride;
            stride *= n;
        }
        Some(offset)
    }

    pub fn checked_offset(&self, idx: &[usize]) -> Result<usize> {
        match self.offset(idx) {
            Some(off) => Ok(off),
            None => Err(self.out_of_range(idx)),
        }
    }

    pub(crate) fn out_of_range(&self, idx: &[usize]) -> Error {
        Error::new(
            ErrorKind::Array,
            ErrorCode::OutOfRange,
            Some(format!(
                "index {idx:?} outside dimensions {:?}",
                self.dims.as_slice()
            )),
        )
    }

    /// Inverse of `offset`: the 1-based index tuple stored at `linear`.
    pub fn index_of(&self, linear: usize) -> Option<Dims> {
        if linear >= self.num_elems() {
            return None;
        }
        let mut rest = linear;
        let mut idx = Dims::with_capacity(self.rank());
        for &n in self.dims.iter() {
            idx.push(rest % n + 1);
            rest /= n;
        }
        Some(idx)
    }

    /// Index tuples in storage order.
    pub fn indices(&self) -> Indices<'_> {
        Indices {
            shape: self,
            next: 0,
            len: self.num_elems(),
        }
    }

    /// The shape with the first dimension dropped, i.e. the shape of one
    /// "row" when the first index is held fixed.
    pub fn row_shape(&self) -> Option<Shape> {
        if self.rank() < 2 {
            return None;
        }
        Some(Shape {
            dims: Dims::from_slice(&self.dims[1..]),
        })
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self.dims.iter().map(|n| n.to_string()).collect();
        write!(f, "[{}]", parts.join("×"))
    }
}

impl TryFrom<Vec<usize>> for Shape {
    type Error = Error;

    fn try_from(dims: Vec<usize>) -> Result<Shape> {
        Shape::new(&dims)
    }
}

impl From<Shape> for Vec<usize> {
    fn from(shape: Shape) -> Self {
        shape.dims.into_vec()
    }
}

pub struct Indices<'a> {
    shape: &'a Shape,
    next: usize,
    len: usize,
}

impl Iterator for Indices<'_> {
    type Item = Dims;

    fn next(&mut self) -> Option<Dims> {
        if self.next >= self.len {
            return None;
        }
        let idx = self.shape.index_of(self.next);
        self.next += 1;
        idx
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.len - self.next;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for Indices<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strides_are_column_major() {
        let shape = Shape::new(&[2, 3, 4]).unwrap();
        assert_eq!(shape.strides().as_slice(), &[1, 2, 6]);
        assert_eq!(shape.num_elems(), 24);
        assert_eq!(shape.leading_dimension(), 2);
    }

    #[test]
    fn test_offset_2d() {
        let shape = Shape::matrix(2, 3).unwrap();
        for i in 1..=2 {
            for j in 1..=3 {
                assert_eq!(shape.offset(&[i, j]), Some((i - 1) + 2 * (j - 1)));
            }
        }
    }

    #[test]
    fn test_offset_3d() {
        let shape = Shape::new(&[2, 3, 4]).unwrap();
        let (s1, s2) = (2, 3);
        for i in 1..=2 {
            for j in 1..=3 {
                for k in 1..=4 {
                    let expected = (i - 1) + s1 * ((j - 1) + s2 * (k - 1));
                    assert_eq!(shape.offset(&[i, j, k]), Some(expected));
                }
            }
        }
    }

    #[test]
    fn test_offset_rejects_bad_indices() {
        let shape = Shape::matrix(2, 3).unwrap();
        assert_eq!(shape.offset(&[0, 1]), None);
        assert_eq!(shape.offset(&[3, 1]), None);
        assert_eq!(shape.offset(&[1, 4]), None);
        assert_eq!(shape.offset(&[1]), None);
        assert_eq!(shape.offset(&[1, 1, 1]), None);

        let err = shape.checked_offset(&[3, 1]).unwrap_err();
        assert_eq!(err.code, ErrorCode::OutOfRange);
    }

    #[test]
    fn test_dim_is_one_based() {
        let shape = Shape::new(&[4, 5, 6]).unwrap();
        assert_eq!(shape.dim(1).unwrap(), 4);
        assert_eq!(shape.dim(3).unwrap(), 6);
        assert_eq!(shape.dim(0).unwrap_err().code, ErrorCode::BadDimension);
        assert_eq!(shape.dim(4).unwrap_err().code, ErrorCode::BadDimension);
    }

    #[test]
    fn test_invalid_shapes() {
        assert_eq!(Shape::new(&[]).unwrap_err().code, ErrorCode::InvalidShape);
        assert_eq!(
            Shape::new(&[usize::MAX, 2]).unwrap_err().code,
            ErrorCode::InvalidShape
        );
        let empty = Shape::empty(2).unwrap();
        assert_eq!(empty.num_elems(), 0);
        assert_eq!(empty.leading_dimension(), 1);
        assert_eq!(empty.indices().count(), 0);

        // a zero extent is an empty array, not an error; no index is valid
        let flat = Shape::new(&[0, 3]).unwrap();
        assert_eq!(flat.num_elems(), 0);
        assert_eq!(flat.offset(&[1, 1]), None);
        assert_eq!(
            flat.checked_offset(&[1, 1]).unwrap_err().code,
            ErrorCode::OutOfRange
        );
    }

    #[test]
    fn test_indices_walk_first_index_fastest() {
        let shape = Shape::matrix(2, 2).unwrap();
        let all: Vec<Vec<usize>> = shape.indices().map(|i| i.to_vec()).collect();
        assert_eq!(all, vec![vec![1, 1], vec![2, 1], vec![1, 2], vec![2, 2]]);
        for (linear, idx) in shape.indices().enumerate() {
            assert_eq!(shape.offset(&idx), Some(linear));
        }
    }

    #[test]
    fn test_row_shape() {
        let shape = Shape::new(&[5, 3, 2]).unwrap();
        assert_eq!(shape.row_shape().unwrap().dims(), &[3, 2]);
        assert!(Shape::vector(3).row_shape().is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(Shape::new(&[2, 3]).unwrap().to_string(), "[2×3]");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_validates() {
        let shape = Shape::new(&[2, 3]).unwrap();
        let json = serde_json::to_string(&shape).unwrap();
        assert_eq!(json, "[2,3]");
        let parsed: Shape = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, shape);
        assert!(serde_json::from_str::<Shape>("[]").is_err());
    }
}
