//! HTTP handlers

pub mod health;
pub mod predict;
pub mod bmi;
pub mod pages;
