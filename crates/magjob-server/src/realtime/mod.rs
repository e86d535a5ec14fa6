pub mod hub;
pub mod websocket;

pub use hub::Hub;
pub use websocket::router;
