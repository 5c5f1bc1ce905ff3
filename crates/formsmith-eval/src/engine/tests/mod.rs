mod common;
mod cycle_detection;
mod formula_error_propagation;
mod recompute_properties;
