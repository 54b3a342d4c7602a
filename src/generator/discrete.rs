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

use parking_lot::Mutex;
use rand::{thread_rng, Rng};

use super::Generator;

/// Choice of the generated value of [`DiscreteGenerator`].
pub struct Choice<T> {
    /// Value to generate.
    pub val: T,
    /// Possibility weight of the choice.
    pub weight: f64,
}

/// Generates a distribution by choosing from a discrete set of weighted values.
pub struct DiscreteGenerator<T> {
    choices: Vec<Choice<T>>,
    sum: f64,
    last: Mutex<Option<T>>,
}

impl<T> DiscreteGenerator<T> {
    /// Create a generator that chooses from `choices` proportionally to their weights.
    ///
    /// # Panics
    ///
    /// Panics if `choices` is empty.
    pub fn new(choices: Vec<Choice<T>>) -> Self {
        assert!(!choices.is_empty(), "discrete generator needs at least one choice");
        let sum = choices.iter().map(|choice| choice.weight).sum();
        Self {
            choices,
            sum,
            last: Mutex::new(None),
        }
    }
}

impl<T> Generator for DiscreteGenerator<T>
where
    T: Clone,
{
    type Output = T;

    fn next(&self) -> Self::Output {
        let target = thread_rng().gen_range(0.0..self.sum);
        let mut acc = 0.0;
        for choice in self.choices.iter() {
            acc += choice.weight;
            if target < acc {
                *self.last.lock() = Some(choice.val.clone());
                return choice.val.clone();
            }
        }
        unreachable!()
    }

    fn last(&self) -> Self::Output {
        self.last
            .lock()
            .clone()
            .expect("last() called before next()")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empirical_frequencies_track_weights() {
        const SAMPLES: usize = 1_000_000;

        let weights = [0.5, 0.3, 0.1, 0.05, 0.05];
        let gen = DiscreteGenerator::new(
            weights
                .iter()
                .enumerate()
                .map(|(i, &weight)| Choice { val: i, weight })
                .collect(),
        );

        let mut counts = [0usize; 5];
        for _ in 0..SAMPLES {
            counts[gen.next()] += 1;
        }

        for (i, &weight) in weights.iter().enumerate() {
            let freq = counts[i] as f64 / SAMPLES as f64;
            assert!(
                (freq - weight).abs() < 0.01,
                "choice {i}: frequency {freq} too far from weight {weight}"
            );
        }
    }

    #[test]
    fn last_returns_previous_sample() {
        let gen = DiscreteGenerator::new(vec![Choice { val: 'x', weight: 1.0 }]);
        assert_eq!(gen.next(), 'x');
        assert_eq!(gen.last(), 'x');
    }

    #[test]
    #[should_panic(expected = "at least one choice")]
    fn empty_choices_rejected() {
        let _ = DiscreteGenerator::<usize>::new(vec![]);
    }
}
