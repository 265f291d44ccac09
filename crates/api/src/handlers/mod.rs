pub mod learner;
pub mod progress;
