// Domain layer: core models and ports (interfaces). No IO, no adapter types.

pub mod model;
pub mod ports;
