//! Notification preference handlers

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::application::services::NotificationService;
use crate::domain::notification::{ChannelPreferences, ReminderSchedule};
use crate::domain::{NotificationPreferences, UserProfile};
use crate::interfaces::http::common::{ok, ApiResponse, ApiResult};

#[derive(Clone)]
pub struct NotificationState {
    pub notifications: Arc<NotificationService>,
}

/// Full preference set; replaces what is stored
#[derive(Debug, Deserialize, ToSchema)]
pub struct PreferencesRequest {
    pub email: ChannelPreferences,
    pub push: ChannelPreferences,
    pub sms: ChannelPreferences,
    #[serde(default)]
    pub reminders: ReminderSchedule,
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/preferences",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Stored preferences, defaults on first access", body = ApiResponse<NotificationPreferences>)
    )
)]
pub async fn get_preferences(
    State(state): State<NotificationState>,
    Extension(user): Extension<UserProfile>,
) -> ApiResult<NotificationPreferences> {
    ok(state.notifications.preferences(&user.id).await?)
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/preferences",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    request_body = PreferencesRequest,
    responses(
        (status = 200, description = "Saved preferences", body = ApiResponse<NotificationPreferences>)
    )
)]
pub async fn save_preferences(
    State(state): State<NotificationState>,
    Extension(user): Extension<UserProfile>,
    Json(req): Json<PreferencesRequest>,
) -> ApiResult<NotificationPreferences> {
    let prefs = NotificationPreferences {
        user_id: user.id.clone(),
        email: req.email,
        push: req.push,
        sms: req.sms,
        reminders: req.reminders,
        updated_at: None,
    };
    ok(state.notifications.save_preferences(&user.id, prefs).await?)
}
