pub mod notification;
pub mod ping;
pub mod status;
pub mod ws;

pub use notification::{MailHeader, MailObject, NotificationEnvelope, SesEvent};
pub use ping::{PingRequest, PongResponse};
pub use status::{DeliveryStatus, SesEventType};
pub use ws::{SubscriberEvent, WsCloseCode};
