//! Rule predicates for wall-go.
//!
//! All functions are pure reads of a [`GameState`](super::GameState).

mod movement;
mod regions;
mod walls;

pub use movement::{can_pass_in_place, is_blocked, is_legal_path, legal_destinations};
pub use regions::{Region, all_isolated, leader, region_scores, regions};
pub use walls::{is_legal_wall, wall_candidates};
