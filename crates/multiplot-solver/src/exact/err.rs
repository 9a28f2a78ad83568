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

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MilpSolveError {
    Infeasible,
    Unbounded,
    /// The time limit passed before any feasible assignment was found.
    NoIncumbent,
    Backend(String),
}

impl std::fmt::Display for MilpSolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MilpSolveError::Infeasible => write!(f, "The model is infeasible"),
            MilpSolveError::Unbounded => write!(f, "The model is unbounded"),
            MilpSolveError::NoIncumbent => write!(f, "No feasible assignment within the time limit"),
            MilpSolveError::Backend(e) => write!(f, "Solver backend error: {}", e),
        }
    }
}

impl std::error::Error for MilpSolveError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowOverflowError {
    row: usize,
    pixels: u64,
    budget: u64,
}

impl RowOverflowError {
    pub fn new(row: usize, pixels: u64, budget: u64) -> Self {
        Self {
            row,
            pixels,
            budget,
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn pixels(&self) -> u64 {
        self.pixels
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }
}

impl std::fmt::Display for RowOverflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Decoded row {} needs {} pixels, budget is {}",
            self.row, self.pixels, self.budget
        )
    }
}

impl std::error::Error for RowOverflowError {}
