//! Configuration section definitions.
//!
//! Each module corresponds to a section in `markview.toml`:
//!
//! | Module   | TOML Section | Purpose                              |
//! |----------|--------------|--------------------------------------|
//! | `serve`  | `[serve]`    | HTTP/WebSocket listeners, queues     |
//! | `render` | `[render]`   | Rendering service endpoint and mode  |
//! | `auth`   | `[auth]`     | Where the credential comes from      |

mod auth;
mod render;
mod serve;

pub use auth::AuthConfig;
pub use render::{RenderConfig, RenderMode};
pub use serve::ServeConfig;
