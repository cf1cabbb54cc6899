//! Task submission, status, cancellation, and listing handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use reel_models::{
    FontSettings, Language, Task, TaskError, TaskId, TaskResult, TaskStatus, VideoSettings,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Generation request body. Everything except the topic is optional and
/// falls back to language-keyed defaults.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, max = 500, message = "topic must be 1-500 characters"))]
    pub topic: String,
    pub language: Option<String>,
    pub voice: Option<String>,
    pub font_size: Option<u32>,
    pub font_color: Option<String>,
    pub font_stroke_color: Option<String>,
    pub font_stroke_width: Option<u32>,
    pub font_family: Option<String>,
}

impl GenerateRequest {
    fn settings(&self) -> Result<VideoSettings, ApiError> {
        let language = match &self.language {
            Some(s) => s
                .parse::<Language>()
                .map_err(|e| ApiError::validation(e.to_string()))?,
            None => Language::default(),
        };
        let mut settings = VideoSettings::defaults_for(language);
        if let Some(voice) = &self.voice {
            settings.voice = voice.clone();
        }
        if let Some(size) = self.font_size {
            settings.font.size = size;
        }
        if let Some(color) = &self.font_color {
            settings.font.color = color.clone();
        }
        if let Some(stroke) = &self.font_stroke_color {
            settings.font.stroke_color = stroke.clone();
        }
        if let Some(width) = self.font_stroke_width {
            settings.font.stroke_width = width;
        }
        if let Some(family) = &self.font_family {
            settings.font.family = family.clone();
        }
        Ok(settings)
    }
}

/// Generation response: the task id plus the URLs to poll and cancel it.
#[derive(Serialize)]
pub struct GenerateResponse {
    pub task_id: TaskId,
    pub status_url: String,
    pub cancel_url: String,
}

/// Submit a generation task. Returns 202; the pipeline runs in the
/// background and `/status/{task_id}` reports its progress.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<(StatusCode, Json<GenerateResponse>)> {
    request
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;
    let topic = request.topic.trim();
    if topic.is_empty() {
        return Err(ApiError::validation("topic must not be empty"));
    }
    let settings = request.settings()?;

    let task = Task::new(topic, settings);
    let task_id = state.pipeline.submit(task);

    let response = GenerateResponse {
        status_url: format!("/status/{task_id}"),
        cancel_url: format!("/tasks/{task_id}/cancel"),
        task_id,
    };
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Echoed request parameters in a status response.
#[derive(Serialize)]
pub struct TaskParameters {
    pub topic: String,
    pub language: Language,
    pub voice: String,
    pub font: FontSettings,
}

#[derive(Serialize)]
pub struct TaskLinks {
    pub cancel: String,
}

/// Full status of one task.
#[derive(Serialize)]
pub struct StatusResponse {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub progress: u8,
    pub message: String,
    pub parameters: TaskParameters,
    pub links: TaskLinks,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,
}

impl StatusResponse {
    fn from_task(task: Task) -> Self {
        Self {
            status: task.status,
            progress: task.progress,
            message: task.message,
            parameters: TaskParameters {
                topic: task.topic,
                language: task.settings.language,
                voice: task.settings.voice,
                font: task.settings.font,
            },
            links: TaskLinks {
                cancel: format!("/tasks/{}/cancel", task.id),
            },
            created_at: task.created_at.to_rfc3339(),
            updated_at: task.updated_at.to_rfc3339(),
            result: task.result,
            error: task.error,
            task_id: task.id,
        }
    }
}

/// Get task status.
pub async fn status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let task = state
        .store()
        .get(&TaskId::from(task_id.as_str()))
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    Ok(Json(StatusResponse::from_task(task)))
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub task_id: String,
    pub status: String,
}

/// Request cancellation. The worker observes it at its next stage
/// checkpoint; until then the task reports `cancelling`.
pub async fn cancel(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<CancelResponse>> {
    state.store().request_cancel(&TaskId::from(task_id.as_str()))?;
    Ok(Json(CancelResponse {
        task_id,
        status: "cancellation_requested".to_string(),
    }))
}

/// One row in the task listing.
#[derive(Serialize)]
pub struct TaskSummary {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub topic: String,
    pub progress: u8,
    pub message: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct ListTasksResponse {
    pub tasks: Vec<TaskSummary>,
}

/// List all tasks, newest first.
pub async fn list_tasks(State(state): State<AppState>) -> Json<ListTasksResponse> {
    let tasks = state
        .store()
        .list()
        .into_iter()
        .map(|t| TaskSummary {
            task_id: t.id,
            status: t.status,
            topic: t.topic,
            progress: t.progress,
            message: t.message,
            created_at: t.created_at.to_rfc3339(),
            updated_at: t.updated_at.to_rfc3339(),
        })
        .collect();
    Json(ListTasksResponse { tasks })
}
