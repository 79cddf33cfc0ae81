pub mod creature;
pub mod roster;
