// Domain layer: core models and ports (interfaces) shared by the core and every host adapter.

pub mod model;
pub mod ports;
