// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use crate::{
    candidate::{CandidateSet, DataPoint, err::CandidateLoaderError},
    common::DataPointIdentifier,
};
use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

/// Reads candidate sets from the whitespace separated text format:
///
/// ```text
/// nr_dims
/// max_indices[0] .. max_indices[nr_dims - 1]
/// nr_points
/// probability v[0] .. v[nr_dims - 1]     (nr_points times)
/// ```
///
/// Data point identifiers are assigned in file order starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CandidateLoader {
    max_candidates: Option<usize>,
}

impl CandidateLoader {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the `k` most probable candidates after loading.
    #[inline]
    pub fn max_candidates(mut self, k: usize) -> Self {
        self.max_candidates = Some(k);
        self
    }

    pub fn from_bufread<R: BufRead>(&self, mut br: R) -> Result<CandidateSet, CandidateLoaderError> {
        let mut sc = Scanner::new(&mut br);
        let nr_dims = sc.next_usize()?;

        let mut max_indices = Vec::with_capacity(nr_dims);
        for _ in 0..nr_dims {
            max_indices.push(sc.next_usize()?);
        }

        let nr_points = sc.next_usize()?;
        let mut points = Vec::with_capacity(nr_points);
        for i in 0..nr_points {
            let probability = sc.next_f64()?;
            let mut vector = Vec::with_capacity(nr_dims);
            for _ in 0..nr_dims {
                vector.push(sc.next_usize()?);
            }
            points.push(DataPoint::new(
                DataPointIdentifier::new(i),
                vector,
                probability,
            ));
        }

        let set = CandidateSet::new(points, max_indices)?;
        Ok(match self.max_candidates {
            Some(k) => set.top_k(k),
            None => set,
        })
    }

    #[inline]
    pub fn from_path(&self, path: impl AsRef<Path>) -> Result<CandidateSet, CandidateLoaderError> {
        let file = File::open(path).map_err(CandidateLoaderError::Io)?;
        self.from_bufread(BufReader::new(file))
    }

    #[inline]
    pub fn from_reader<R: Read>(&self, r: R) -> Result<CandidateSet, CandidateLoaderError> {
        self.from_bufread(BufReader::new(r))
    }

    #[inline]
    pub fn from_str(&self, s: &str) -> Result<CandidateSet, CandidateLoaderError> {
        self.from_reader(s.as_bytes())
    }
}

#[derive(Debug)]
struct Scanner<R: BufRead> {
    rdr: R,
    buf: String,
    pos: usize,
}

impl<R: BufRead> Scanner<R> {
    fn new(rdr: R) -> Self {
        Self {
            rdr,
            buf: String::new(),
            pos: 0,
        }
    }

    #[inline]
    fn fill_line(&mut self) -> Result<(), CandidateLoaderError> {
        self.buf.clear();
        self.pos = 0;
        let n = self
            .rdr
            .read_line(&mut self.buf)
            .map_err(CandidateLoaderError::Io)?;
        if n == 0 {
            return Err(CandidateLoaderError::UnexpectedEof);
        }
        Ok(())
    }

    fn next_token(&mut self) -> Result<&str, CandidateLoaderError> {
        loop {
            let bytes = self.buf.as_bytes();
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.pos < self.buf.len() {
                break;
            }
            self.fill_line()?;
        }

        let start = self.pos;
        let bytes = self.buf.as_bytes();
        while self.pos < bytes.len() && !bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        Ok(&self.buf[start..self.pos])
    }

    #[inline]
    fn next_usize(&mut self) -> Result<usize, CandidateLoaderError> {
        let tok = self.next_token()?;
        tok.parse::<usize>().map_err(CandidateLoaderError::ParseInt)
    }

    #[inline]
    fn next_f64(&mut self) -> Result<f64, CandidateLoaderError> {
        let tok = self.next_token()?;
        tok.parse::<f64>().map_err(CandidateLoaderError::ParseFloat)
    }
}
