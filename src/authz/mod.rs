//! Role-based visibility over derived artifacts.

pub mod gate;
pub mod roles;

pub use gate::{event_visible, RoleGate};
pub use roles::Role;
