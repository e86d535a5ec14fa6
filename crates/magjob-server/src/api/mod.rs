mod availability_templates;
mod chat_members;
mod chat_messages;
mod chats;
mod graphics;
mod health;
mod notifications;
pub mod params;
mod shift_edit_requests;
mod shifts;
mod time_entries;
mod time_entry_members;

use axum::Router;

use crate::AppState;

/// Create the API router
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(availability_templates::router())
        .merge(graphics::router())
        .merge(time_entries::router())
        .merge(time_entry_members::router())
        .merge(shifts::router())
        .merge(shift_edit_requests::router())
        .merge(chats::router())
        .merge(chat_members::router())
        .merge(chat_messages::router())
        .merge(notifications::router())
}
