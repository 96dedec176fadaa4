//! Injectable randomness for backoff jitter.
//!
//! Only the delay magnitude is random; retry decisions never consult a
//! [`JitterSource`].

use rand::{Rng, RngCore};

/// Source of uniform samples in `[0, 1)`.
pub trait JitterSource {
    fn next_unit(&mut self) -> f64;
}

impl<J: JitterSource + ?Sized> JitterSource for Box<J> {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Thread-local RNG. The default for production callers.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadJitter;

impl JitterSource for ThreadJitter {
    fn next_unit(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Adapts any [`RngCore`] (e.g. a seeded `StdRng`) into a jitter source.
#[derive(Debug, Clone)]
pub struct RngJitter<R>(pub R);

impl<R: RngCore> JitterSource for RngJitter<R> {
    fn next_unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Always returns the same sample. Useful for deterministic schedules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn next_unit(&mut self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn seeded_rng_is_reproducible() {
        let mut a = RngJitter(StdRng::seed_from_u64(7));
        let mut b = RngJitter(StdRng::seed_from_u64(7));
        for _ in 0..16 {
            assert_eq!(a.next_unit(), b.next_unit());
        }
    }

    #[test]
    fn thread_jitter_in_unit_interval() {
        let mut j = ThreadJitter;
        for _ in 0..1000 {
            let u = j.next_unit();
            assert!((0.0..1.0).contains(&u));
        }
    }
}
