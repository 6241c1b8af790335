#![allow(non_snake_case)]

pub mod model;
pub mod tagger;
pub mod trainer;
mod context;
