//! HTTP API handlers for tunepipe-relay

pub mod buildinfo;
pub mod health;
pub mod play;
pub mod stream;
pub mod ui;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use play::play;
pub use stream::stream_audio;
pub use ui::serve_index;
