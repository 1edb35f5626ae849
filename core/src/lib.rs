pub mod bank;
pub mod clock;
pub mod config;
pub mod construction;
pub mod contract;
pub mod demographics;
pub mod economy;
pub mod engine;
pub mod error;
pub mod event;
pub mod generator;
pub mod house;
pub mod household;
pub mod market;
pub mod population;
pub mod reference;
pub mod rng;
pub mod simulation;
pub mod stats;
pub mod store;
pub mod types;
