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

use crate::common::DataPointIdentifier;
use std::num::{ParseFloatError, ParseIntError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DimensionMismatchError {
    id: DataPointIdentifier,
    expected: usize,
    found: usize,
}

impl DimensionMismatchError {
    pub fn new(id: DataPointIdentifier, expected: usize, found: usize) -> Self {
        Self {
            id,
            expected,
            found,
        }
    }

    pub fn id(&self) -> DataPointIdentifier {
        self.id
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn found(&self) -> usize {
        self.found
    }
}

impl std::fmt::Display for DimensionMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} has {} dimensions, expected {}",
            self.id, self.found, self.expected
        )
    }
}

impl std::error::Error for DimensionMismatchError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueOutOfRangeError {
    id: DataPointIdentifier,
    dimension: usize,
    value: usize,
    cardinality: usize,
}

impl ValueOutOfRangeError {
    pub fn new(id: DataPointIdentifier, dimension: usize, value: usize, cardinality: usize) -> Self {
        Self {
            id,
            dimension,
            value,
            cardinality,
        }
    }

    pub fn id(&self) -> DataPointIdentifier {
        self.id
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn value(&self) -> usize {
        self.value
    }

    pub fn cardinality(&self) -> usize {
        self.cardinality
    }
}

impl std::fmt::Display for ValueOutOfRangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} has value {} in dimension {}, but the dimension only has {} values",
            self.id, self.value, self.dimension, self.cardinality
        )
    }
}

impl std::error::Error for ValueOutOfRangeError {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidProbabilityError {
    id: DataPointIdentifier,
    probability: f64,
}

impl InvalidProbabilityError {
    pub fn new(id: DataPointIdentifier, probability: f64) -> Self {
        Self { id, probability }
    }

    pub fn id(&self) -> DataPointIdentifier {
        self.id
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl std::fmt::Display for InvalidProbabilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} has probability {}, expected a value in [0, 1]",
            self.id, self.probability
        )
    }
}

impl std::error::Error for InvalidProbabilityError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardinalityOverflowError {
    max_indices: Vec<usize>,
}

impl CardinalityOverflowError {
    pub fn new(max_indices: Vec<usize>) -> Self {
        Self { max_indices }
    }

    pub fn max_indices(&self) -> &[usize] {
        &self.max_indices
    }
}

impl std::fmt::Display for CardinalityOverflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "The product of dimension cardinalities {:?} does not fit into 64 bits",
            self.max_indices
        )
    }
}

impl std::error::Error for CardinalityOverflowError {}

#[derive(Debug, Clone, PartialEq)]
pub enum CandidateSetError {
    DimensionMismatch(DimensionMismatchError),
    ValueOutOfRange(ValueOutOfRangeError),
    InvalidProbability(InvalidProbabilityError),
    CardinalityOverflow(CardinalityOverflowError),
}

impl std::fmt::Display for CandidateSetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateSetError::DimensionMismatch(e) => write!(f, "{}", e),
            CandidateSetError::ValueOutOfRange(e) => write!(f, "{}", e),
            CandidateSetError::InvalidProbability(e) => write!(f, "{}", e),
            CandidateSetError::CardinalityOverflow(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CandidateSetError {}

impl From<DimensionMismatchError> for CandidateSetError {
    fn from(err: DimensionMismatchError) -> Self {
        CandidateSetError::DimensionMismatch(err)
    }
}

impl From<ValueOutOfRangeError> for CandidateSetError {
    fn from(err: ValueOutOfRangeError) -> Self {
        CandidateSetError::ValueOutOfRange(err)
    }
}

impl From<InvalidProbabilityError> for CandidateSetError {
    fn from(err: InvalidProbabilityError) -> Self {
        CandidateSetError::InvalidProbability(err)
    }
}

impl From<CardinalityOverflowError> for CandidateSetError {
    fn from(err: CardinalityOverflowError) -> Self {
        CandidateSetError::CardinalityOverflow(err)
    }
}

#[derive(Debug)]
pub enum CandidateLoaderError {
    Io(std::io::Error),
    ParseInt(ParseIntError),
    ParseFloat(ParseFloatError),
    UnexpectedEof,
    CandidateSet(CandidateSetError),
}

impl std::fmt::Display for CandidateLoaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateLoaderError::Io(e) => write!(f, "I/O error: {}", e),
            CandidateLoaderError::ParseInt(e) => write!(f, "Parse int error: {}", e),
            CandidateLoaderError::ParseFloat(e) => write!(f, "Parse float error: {}", e),
            CandidateLoaderError::UnexpectedEof => write!(f, "Unexpected end of input"),
            CandidateLoaderError::CandidateSet(e) => write!(f, "Invalid candidate set: {}", e),
        }
    }
}

impl std::error::Error for CandidateLoaderError {}

impl From<std::io::Error> for CandidateLoaderError {
    fn from(err: std::io::Error) -> Self {
        CandidateLoaderError::Io(err)
    }
}

impl From<ParseIntError> for CandidateLoaderError {
    fn from(err: ParseIntError) -> Self {
        CandidateLoaderError::ParseInt(err)
    }
}

impl From<ParseFloatError> for CandidateLoaderError {
    fn from(err: ParseFloatError) -> Self {
        CandidateLoaderError::ParseFloat(err)
    }
}

impl From<CandidateSetError> for CandidateLoaderError {
    fn from(err: CandidateSetError) -> Self {
        CandidateLoaderError::CandidateSet(err)
    }
}
