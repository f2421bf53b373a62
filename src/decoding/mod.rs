pub mod assemble;
pub mod candidates;
pub mod conflicts;
pub mod grid;
pub mod normalize;
pub mod transition;
pub mod viterbi;
