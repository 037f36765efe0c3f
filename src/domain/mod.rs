// Domain layer: analysis state, expert roster and ports. No HTTP or filesystem here.

pub mod experts;
pub mod model;
pub mod ports;
