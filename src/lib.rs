//! Discrete-time constrained state simulation of small energy systems.
//!
//! A [`sim::engine::Engine`] pairs a [`devices::types::Plant`] (building,
//! EV battery, water heater or climate model) with a
//! [`controllers::Controller`] and runs the loop
//! `decide -> clip -> step -> record` over a disturbance trajectory.

pub mod config;
/// Control policies.
pub mod controllers;
/// Plant models and their state updates.
pub mod devices;
pub mod error;
/// Seeded disturbance and scenario generators.
pub mod inputs;
pub mod io;
pub mod runner;
/// Simulation engine, discretization, integration and KPIs.
pub mod sim;
