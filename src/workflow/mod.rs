pub mod exercise_session;
pub mod verdict;

pub use exercise_session::{ExerciseSession, RunOutcome};
pub use verdict::Verdict;
