// Domain layer: core models, ports, and the pure lookup tables behind them.

pub mod email;
pub mod model;
pub mod phone;
pub mod ports;
