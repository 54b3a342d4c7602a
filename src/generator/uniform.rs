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

use super::{Generator, NumberGenerator};

use paste::paste;

use rand::{thread_rng, Rng};

use std::sync::atomic::{
    AtomicI16, AtomicI32, AtomicI64, AtomicI8, AtomicIsize, AtomicU16, AtomicU32, AtomicU64,
    AtomicU8, AtomicUsize, Ordering,
};

macro_rules! uniform {
    ($( {$atype:ty, $type:ty, $name:ident}, )*) => {
        paste! {
            $(
                /// Generates random values uniformly from a range, inclusive on both ends.
                #[derive(Debug)]
                pub struct [<Uniform $name Generator>] {
                    lower_bound: $type,
                    upper_bound: $type,
                    last: $atype,
                }

                impl [<Uniform $name Generator>] {
                    /// Creates a generator that will return numerics uniformly randomly from the interval
                    /// [lower_bound,upper_bound] inclusive (that is, lower_bound and upper_bound are possible values).
                    pub fn new(lower_bound: $type, upper_bound: $type) -> Self {
                        let gen = Self {
                            lower_bound,
                            upper_bound,
                            last: $atype::new(lower_bound),
                        };
                        gen.next();
                        gen
                    }
                }

                impl Generator for [<Uniform $name Generator>] {
                    type Output = $type;

                    fn next(&self) -> Self::Output {
                        let val = thread_rng().gen_range(self.lower_bound..=self.upper_bound);
                        self.last.store(val, Ordering::Relaxed);
                        val
                    }

                    fn last(&self) -> Self::Output {
                        self.last.load(Ordering::Relaxed)
                    }
                }

                impl NumberGenerator for [<Uniform $name Generator>] {
                    fn mean(&self) -> f64 {
                        (self.lower_bound as f64 + self.upper_bound as f64) / 2.0
                    }
                }
            )*
        }
    };
}

macro_rules! for_all_numeric_types {
    ($macro:ident) => {
        $macro! {
            {AtomicU8, u8, U8},
            {AtomicU16, u16, U16},
            {AtomicU32, u32, U32},
            {AtomicU64, u64, U64},
            {AtomicUsize, usize, Usize},
            {AtomicI8, i8, I8},
            {AtomicI16, i16, I16},
            {AtomicI32, i32, I32},
            {AtomicI64, i64, I64},
            {AtomicIsize, isize, Isize},
        }
    };
}

for_all_numeric_types! { uniform }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        let g = UniformU64Generator::new(3, 5);
        let mut seen = [false; 3];
        for _ in 0..10_000 {
            let v = g.next();
            assert!((3..=5).contains(&v));
            seen[(v - 3) as usize] = true;
            assert_eq!(g.last(), v);
        }
        assert!(seen.iter().all(|&s| s), "not all values of [3,5] were drawn");
    }

    #[test]
    fn degenerate_range() {
        let g = UniformUsizeGenerator::new(9, 9);
        assert_eq!(g.next(), 9);
        assert_eq!(g.last(), 9);
    }
}
