pub mod matrix;
pub mod session;

pub use matrix::{write_csv, MatrixRow};
pub use session::{LimiterOutcome, LimiterSession};
