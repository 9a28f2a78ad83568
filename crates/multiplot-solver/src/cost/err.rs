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
pub struct EstimatorUnavailableError {
    reason: String,
}

impl EstimatorUnavailableError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl std::fmt::Display for EstimatorUnavailableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cost estimator unavailable: {}", self.reason)
    }
}

impl std::error::Error for EstimatorUnavailableError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EstimateCountMismatchError {
    expected: usize,
    found: usize,
}

impl EstimateCountMismatchError {
    pub fn new(expected: usize, found: usize) -> Self {
        Self { expected, found }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn found(&self) -> usize {
        self.found
    }
}

impl std::fmt::Display for EstimateCountMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cost estimator returned {} estimates for {} queries",
            self.found, self.expected
        )
    }
}

impl std::error::Error for EstimateCountMismatchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CostEstimateError {
    Unavailable(EstimatorUnavailableError),
    CountMismatch(EstimateCountMismatchError),
}

impl std::fmt::Display for CostEstimateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostEstimateError::Unavailable(e) => write!(f, "{}", e),
            CostEstimateError::CountMismatch(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CostEstimateError {}

impl From<EstimatorUnavailableError> for CostEstimateError {
    fn from(err: EstimatorUnavailableError) -> Self {
        CostEstimateError::Unavailable(err)
    }
}

impl From<EstimateCountMismatchError> for CostEstimateError {
    fn from(err: EstimateCountMismatchError) -> Self {
        CostEstimateError::CountMismatch(err)
    }
}
