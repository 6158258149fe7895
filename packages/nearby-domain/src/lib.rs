pub mod activity;
pub mod cell;
pub mod coordinates;
pub mod covering;
pub mod curves;
pub mod group;
pub mod time_serde;

pub use activity::{ActivityLogEntry, EventType};
pub use cell::{CellId, CellRange, MAX_LEVEL};
pub use coordinates::{Coordinates, EARTH_RADIUS_METERS};
pub use group::{CandidateKey, CommentRef, GroupSnapshot, Preapproval};
