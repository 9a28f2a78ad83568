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

/// Names the kind of thing an [`Identifier`] refers to.
pub trait IdKind: Copy {
    const LABEL: &'static str;
}

/// An index tagged with the kind of thing it identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier<I, K>(I, core::marker::PhantomData<K>);

impl<I, K> Identifier<I, K> {
    #[inline]
    pub fn new(id: I) -> Self {
        Self(id, core::marker::PhantomData)
    }

    #[inline]
    pub fn into_inner(self) -> I {
        self.0
    }
}

impl<I: std::fmt::Display, K: IdKind> std::fmt::Display for Identifier<I, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", K::LABEL, self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataPointKind;

impl IdKind for DataPointKind {
    const LABEL: &'static str = "DataPoint";
}

/// Stable identity of a candidate query, assigned by whoever produced the candidate list.
pub type DataPointIdentifier = Identifier<usize, DataPointKind>;

/// Pixel widths of the screen layout.
pub type Pixels = u64;

/// Expected user time in milliseconds.
pub type Millis = f64;
