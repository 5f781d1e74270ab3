mod counter_world;
mod setups;
mod steps;

pub use counter_world::CounterWorld;
