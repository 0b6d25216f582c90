// Tailoring: engine seam (mock + remote), keyword highlighting, per-caller
// single-flight guard, and PDF resume intake.
// Engines only ever receive validated requests; see `engine::tailor`.

pub mod engine;
pub mod handlers;
pub mod highlight;
pub mod pdf;
pub mod remote;
pub mod single_flight;
