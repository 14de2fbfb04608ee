// Static domain knowledge: category sets, plausibility constraints, and the
// design-style vocabularies sampled into the context block.
// Nothing in here performs I/O or holds mutable state.

pub mod constraints;
pub mod domain;
pub mod style_variables;
