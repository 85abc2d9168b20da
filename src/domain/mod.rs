// Domain layer: equipment models and the repository port. No I/O here.

pub mod model;
pub mod ports;
