use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;
use uuid::Uuid;

use showcase_db::{Database, NewProject, ProjectFilter, ProjectWithOwner};
use showcase_engagement::EngagementAggregator;
use showcase_types::api::{CreateProjectRequest, ProjectQuery, ProjectResponse, UpdateVisibilityRequest};
use showcase_types::models::EngagementView;

use crate::extract::{JsonBody, PathParams, QueryParams};
use crate::middleware::{Caller, MaybeCaller};
use crate::{AppState, blocking, error::ApiError};

/// Page size of the public explore feed.
const EXPLORE_LIMIT: u32 = 15;

pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    WithRejection(Json(req), _): JsonBody<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = [&req.title, &req.description, &req.image_url, &req.category];
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(ApiError::BadRequest("Missing required fields".into()));
    }

    let new = NewProject {
        owner_id: caller.id,
        title: req.title.trim().to_string(),
        description: req.description.trim().to_string(),
        image_url: req.image_url.trim().to_string(),
        category: req.category.trim().to_string(),
        private: req.private,
    };

    let row = blocking(&state, move |db| Ok(db.insert_project(&new)?)).await?;
    info!(project_id = %row.project.id, owner_id = %caller.id, "Project created");

    let response = ProjectResponse {
        project: row.project,
        owner: row.owner,
        engagement: EngagementView {
            likes_count: 0,
            dislikes_count: 0,
            comments_count: 0,
            user_polarity: None,
        },
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /projects: the most recent public projects.
pub async fn explore(
    State(state): State<AppState>,
    caller: MaybeCaller,
    WithRejection(Query(query), _): QueryParams<ProjectQuery>,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let filter = ProjectFilter {
        public_only: true,
        limit: Some(EXPLORE_LIMIT),
        ..filter_from(query)
    };
    let viewer = caller.id();

    let projects = blocking(&state, move |db| with_engagement(db, viewer, db.list_projects(&filter)?)).await?;
    Ok(Json(projects))
}

/// GET /user/projects: all of the caller's projects, private included.
pub async fn mine(
    State(state): State<AppState>,
    caller: Caller,
    WithRejection(Query(query), _): QueryParams<ProjectQuery>,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let filter = ProjectFilter {
        owner_id: Some(caller.id),
        ..filter_from(query)
    };

    let projects = blocking(&state, move |db| {
        with_engagement(db, Some(caller.id), db.list_projects(&filter)?)
    })
    .await?;
    Ok(Json(projects))
}

pub async fn detail(
    State(state): State<AppState>,
    WithRejection(Path(project_id), _): PathParams<Uuid>,
    caller: MaybeCaller,
) -> Result<Json<ProjectResponse>, ApiError> {
    let viewer = caller.id();

    let response = blocking(&state, move |db| {
        let row = db
            .get_project(project_id)?
            .filter(|row| row.project.is_visible_to(viewer))
            .ok_or(ApiError::NotFound("Project"))?;
        let engagement = EngagementAggregator::new(db).view(viewer, project_id)?;
        Ok(ProjectResponse {
            project: row.project,
            owner: row.owner,
            engagement,
        })
    })
    .await?;

    Ok(Json(response))
}

/// PATCH /projects/{project_id}: owner switches public/private.
pub async fn update_visibility(
    State(state): State<AppState>,
    WithRejection(Path(project_id), _): PathParams<Uuid>,
    caller: Caller,
    WithRejection(Json(req), _): JsonBody<UpdateVisibilityRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let private = req.private;
    let response = blocking(&state, move |db| {
        require_owner(db, caller.id, project_id)?;
        if !db.set_project_private(project_id, private)? {
            return Err(ApiError::NotFound("Project"));
        }

        let row = db.get_project(project_id)?.ok_or(ApiError::NotFound("Project"))?;
        let engagement = EngagementAggregator::new(db).view(Some(caller.id), project_id)?;
        Ok(ProjectResponse {
            project: row.project,
            owner: row.owner,
            engagement,
        })
    })
    .await?;

    info!(%project_id, private, "Project visibility changed");
    Ok(Json(response))
}

pub async fn delete(
    State(state): State<AppState>,
    WithRejection(Path(project_id), _): PathParams<Uuid>,
    caller: Caller,
) -> Result<StatusCode, ApiError> {
    blocking(&state, move |db| {
        require_owner(db, caller.id, project_id)?;
        if !db.delete_project(project_id)? {
            return Err(ApiError::NotFound("Project"));
        }
        Ok(())
    })
    .await?;

    info!(%project_id, owner_id = %caller.id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn filter_from(query: ProjectQuery) -> ProjectFilter {
    ProjectFilter {
        search: query.search,
        // "all" is the client's no-filter sentinel
        category: query
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all")),
        ..ProjectFilter::default()
    }
}

/// The project must exist and belong to `user_id`.
fn require_owner(db: &Database, user_id: Uuid, project_id: Uuid) -> Result<(), ApiError> {
    let row = db.get_project(project_id)?.ok_or(ApiError::NotFound("Project"))?;
    if row.project.owner_id != user_id {
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

fn with_engagement(
    db: &Database,
    viewer: Option<Uuid>,
    rows: Vec<ProjectWithOwner>,
) -> Result<Vec<ProjectResponse>, ApiError> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.project.id).collect();
    let mut views = EngagementAggregator::new(db).views(viewer, &ids)?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let engagement = views.remove(&row.project.id)?;
            Some(ProjectResponse {
                project: row.project,
                owner: row.owner,
                engagement,
            })
        })
        .collect())
}
