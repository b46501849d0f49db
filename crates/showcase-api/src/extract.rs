//! Extractors whose rejections render as [`ApiError`], so malformed ids,
//! query strings and bodies get the same JSON error shape as every other
//! failure.

use axum::{
    Json,
    extract::{Path, Query},
};
use axum_extra::extract::WithRejection;

use crate::error::ApiError;

pub type JsonBody<T> = WithRejection<Json<T>, ApiError>;
pub type PathParams<T> = WithRejection<Path<T>, ApiError>;
pub type QueryParams<T> = WithRejection<Query<T>, ApiError>;
