//! Reference links for resource containers.
//!
//! Parses explicit links such as `[[en/gen/ulb/01:02-06]]` and
//! `[Map](image:/en/gen/maps)`, detects implicit scripture citations such as
//! `John 3:16; 6:14, 44` in prose, and reads and writes the resource
//! containers those links point into, stored as directories or zip archives.

pub mod accessor;
pub mod autolink;
pub mod commands;
pub mod config;
pub mod container;
pub mod diagnostics;
pub mod error;
pub mod link;
pub mod manifest;
pub mod passage;
pub mod semver;
pub mod types;

pub use crate::container::{CONFORMS_TO, ResourceContainer};
pub use crate::error::Error;
pub use crate::link::{find_links, parse};
pub use crate::types::Reference;
