//  Copyright 2024 MrCroxx
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

/// A [`Generator`] generates values following some distribution.
pub trait Generator {
    /// Output type of the generator.
    type Output;

    /// Generate the next value.
    fn next(&self) -> Self::Output;

    /// Get the last generated value.
    ///
    /// For counters this is `counter - 1`, i.e. the value the most recent
    /// [`Generator::next`] call returned.
    ///
    /// # Panics
    ///
    /// Some generators require `next()` to be called at least once before
    /// calling `last()`.
    fn last(&self) -> Self::Output;
}

/// A [`NumberGenerator`] generates numeric values.
pub trait NumberGenerator: Generator {
    /// Return the expected value (mean) of the values this generator will generate.
    fn mean(&self) -> f64;
}

/// An [`AcknowledgedCounter`] only advances the published `last()` watermark
/// with `acknowledge()` calls.
pub trait AcknowledgedCounter: Generator {
    /// Mark `val` as durably completed, advancing the watermark as far as
    /// consecutive acknowledged values allow.
    fn acknowledge(&self, val: Self::Output);
}

/// Acknowledged atomic counter.
pub mod acknowledge;
/// Constant value generator.
pub mod constant;
/// Atomic counters.
pub mod counter;
/// Discrete value generator.
pub mod discrete;
/// Skewed-latest generator.
pub mod latest;
/// Printable random byte generator.
pub mod random_byte;
/// Scrambled zipfian generator.
pub mod scrambled;
/// Sequential generator.
pub mod sequential;
/// Uniform value generator.
pub mod uniform;
/// Zipfian generator.
pub mod zipfian;
