pub mod http;
pub mod timer;

pub use self::http::{RpcClient, RpcError, RpcResult, ValidatedUrl};
pub use self::timer::{Timer, TimerOperation, TimerOutput};

pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::event::Event;
#[allow(unused_imports)]
use crate::App;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub timer: Timer<Event>,
}
