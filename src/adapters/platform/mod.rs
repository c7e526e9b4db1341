//! Remote data platform adapter
//!
//! The gateway executes signed type-action calls and file transfers against
//! the platform; the wire module decodes the platform's dual-shape
//! (XML-or-JSON) response bodies.

pub mod gateway;
pub mod wire;

pub use gateway::{HttpPlatformGateway, PlatformGateway};
pub use wire::WireDocument;
