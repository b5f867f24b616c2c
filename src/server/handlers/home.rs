use crate::server::routes::Reply;

pub const LIVENESS_TEXT: &str = "✅ Real-Time Emotion Detection API Running!";

/// `GET /`
pub fn handle() -> Reply {
    Reply::text(200, LIVENESS_TEXT)
}
