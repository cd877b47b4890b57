pub mod alns;
pub mod assemble;
pub mod bounds;
pub mod column_generation;
pub mod error;
pub mod exact;
pub mod job;
pub mod lp;
pub mod lp_backend;
pub mod master;
pub mod pattern;
pub mod pricing;
pub mod render;
pub mod solver;
pub mod types;
