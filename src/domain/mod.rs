// Domain layer: entities, session events and the ports the backends implement.

pub mod events;
pub mod model;
pub mod ports;
