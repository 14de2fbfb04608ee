pub mod fragment;
pub mod generation;
