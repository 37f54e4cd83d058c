pub mod assets;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod family;
pub mod layout;
pub mod layout_dump;
pub mod render;
pub mod schema;
pub mod session;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use family::{EditError, FamilyGraph, Gender, Lineage, Member, Role};
pub use layout::{Canvas, FamilyLayout, Point, ZoomPair, compute_layout};
pub use schema::{MemberRecord, PersistError};
pub use session::{FamilySession, TapOutcome, ViewState};
