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

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidConstantError {
    name: &'static str,
    value: f64,
}

impl InvalidConstantError {
    pub fn new(name: &'static str, value: f64) -> Self {
        Self { name, value }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl std::fmt::Display for InvalidConstantError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Configuration value `{}` must be finite and non-negative, got {}",
            self.name, self.value
        )
    }
}

impl std::error::Error for InvalidConstantError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ZeroRowWidthError;

impl std::fmt::Display for ZeroRowWidthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Row width must be positive")
    }
}

impl std::error::Error for ZeroRowWidthError {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    InvalidConstant(InvalidConstantError),
    ZeroRowWidth(ZeroRowWidthError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidConstant(e) => write!(f, "{}", e),
            ConfigError::ZeroRowWidth(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<InvalidConstantError> for ConfigError {
    fn from(err: InvalidConstantError) -> Self {
        ConfigError::InvalidConstant(err)
    }
}

impl From<ZeroRowWidthError> for ConfigError {
    fn from(err: ZeroRowWidthError) -> Self {
        ConfigError::ZeroRowWidth(err)
    }
}
