//! Network algorithms

pub mod insertion;

pub use insertion::{
    Insertion, InsertionKind, InsertionOptions, insert_station_point, insert_station_points,
};
