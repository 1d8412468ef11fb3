// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Export of string arrays to C callers as a `char **` table.

use std::ffi::{CStr, c_char};

use crate::array::Array;
use crate::array_err;
use crate::common::Result;

/// A table of NUL-terminated string pointers into a string array's own
/// storage, in column-major order.  Nothing is copied; the borrow keeps the
/// source alive (and unmodified) for as long as the table exists.
#[derive(Debug)]
pub struct CStrArray<'a> {
    strs: Vec<&'a CStr>,
    ptrs: Vec<*const c_char>,
}

impl<'a> CStrArray<'a> {
    /// Fails with `UnsupportedOperation` when `source` is an unbound
    /// external array.
    pub fn new<T, A>(source: &'a A) -> Result<Self>
    where
        T: Clone + AsRef<CStr> + 'a,
        A: Array<T> + ?Sized,
    {
        if !source.is_bound() {
            return array_err!(
                UnsupportedOperation,
                "cannot export an unbound external array".to_string()
            );
        }
        let strs: Vec<&'a CStr> = source.iter().map(|s| s.as_ref()).collect();
        let ptrs = strs.iter().map(|s| s.as_ptr()).collect();
        Ok(CStrArray { strs, ptrs })
    }

    /// Pointer to the first entry, suitable for a `const char **`
    /// parameter.
    pub fn as_ptr(&self) -> *const *const c_char {
        self.ptrs.as_ptr()
    }

    pub fn as_slice(&self) -> &[*const c_char] {
        &self.ptrs
    }

    pub fn len(&self) -> usize {
        self.ptrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ptrs.is_empty()
    }

    pub fn get(&self, linear: usize) -> Option<&'a CStr> {
        self.strs.get(linear).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a CStr> + '_ {
        self.strs.iter().copied()
    }
}
