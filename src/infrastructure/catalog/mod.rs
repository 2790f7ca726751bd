//! Station directory adapters

pub mod open_charge_map;
pub mod sample;

pub use open_charge_map::OpenChargeMapClient;
pub use sample::sample_stations;
