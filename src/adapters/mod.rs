// Adapters layer: concrete hosts for the ports (page, mutation delivery, timers, storage).

pub mod memory;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;
