//! CLI command handlers, one per file.

mod classify;
mod completions;
mod decide;
mod delay;
mod show_config;
mod simulate;

pub use classify::run_classify;
pub use completions::{run_completions, run_man};
pub use decide::run_decide;
pub use delay::run_delay;
pub use show_config::run_show_config;
pub use simulate::run_simulate;

use donna_core::reconnect::{JitterSource, RngJitter, ThreadJitter};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seeded RNG when a seed is given, thread RNG otherwise.
pub(crate) fn jitter_source(seed: Option<u64>) -> Box<dyn JitterSource + Send> {
    match seed {
        Some(seed) => Box::new(RngJitter(StdRng::seed_from_u64(seed))),
        None => Box::new(ThreadJitter),
    }
}
