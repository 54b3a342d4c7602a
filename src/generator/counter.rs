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

use super::Generator;

use paste::paste;

use std::sync::atomic::{
    AtomicI16, AtomicI32, AtomicI64, AtomicI8, AtomicIsize, AtomicU16, AtomicU32, AtomicU64,
    AtomicU8, AtomicUsize, Ordering,
};

macro_rules! counter {
    ($( {$atype:ty, $type:ty, $name:ident}, )*) => {
        paste! {
            $(
                /// Generates a monotonic sequence of numeric values in an atomic manner.
                ///
                /// `next()` returns-and-increments, so concurrent callers observe
                /// distinct values forming an initial segment of `start..`.
                #[derive(Debug)]
                pub struct [<$name Counter>] {
                    counter: $atype,
                }

                impl [<$name Counter>] {
                    /// Create a counter that starts at `start`.
                    pub fn new(start: $type) -> Self {
                        Self {
                            counter: $atype::new(start),
                        }
                    }
                }

                impl Generator for [<$name Counter>] {
                    type Output = $type;

                    fn next(&self) -> Self::Output {
                        self.counter.fetch_add(1, Ordering::SeqCst)
                    }

                    fn last(&self) -> Self::Output {
                        self.counter.load(Ordering::SeqCst).wrapping_sub(1)
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

for_all_numeric_types! { counter }

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn sequence_from_start() {
        let c = U64Counter::new(7);
        assert_eq!(c.next(), 7);
        assert_eq!(c.next(), 8);
        assert_eq!(c.last(), 8);
    }

    #[test]
    fn concurrent_values_are_an_initial_segment() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 1000;

        let c = Arc::new(U64Counter::new(0));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let c = c.clone();
                std::thread::spawn(move || (0..PER_THREAD).map(|_| c.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for v in h.join().unwrap() {
                assert!(seen.insert(v), "duplicate value {v}");
            }
        }
        let total = (THREADS * PER_THREAD) as u64;
        assert!(seen.iter().all(|&v| v < total));
        assert_eq!(c.last(), total - 1);
    }
}
