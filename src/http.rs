//! The gateway's own HTTP surface.
//!
//! Thin layer over [`Gateway`]: start a session, fetch the pending pairing
//! challenge, send a text through an active session, delete a tenant's
//! stored credentials. Malformed requests map to 4xx; nothing here crashes
//! the process.

use crate::gateway::Gateway;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use log::error;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug, Deserialize)]
struct InitRequest {
    cliente_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SendRequest {
    cliente_id: Option<String>,
    telefono: Option<String>,
    texto: Option<String>,
}

pub fn router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/v1/init", post(init_session))
        .route("/v1/enviar", post(send_message))
        .route("/qr/{cliente_id}", get(fetch_challenge))
        .route("/session/{telefono}", delete(delete_session))
        .with_state(gateway)
}

/// Serves the surface on an already-bound listener until the task is aborted.
pub async fn serve(gateway: Arc<Gateway>, listener: TcpListener) -> std::io::Result<()> {
    axum::serve(listener, router(gateway)).await
}

async fn init_session(
    State(gateway): State<Arc<Gateway>>,
    Json(body): Json<InitRequest>,
) -> Response {
    let Some(cliente_id) = body.cliente_id.filter(|id| !id.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Falta cliente_id" })),
        )
            .into_response();
    };

    match gateway.start_session(&cliente_id).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "pending",
                "message": format!("Escaneá el QR en /qr/{cliente_id}"),
            })),
        )
            .into_response(),
        Err(e) => {
            error!("starting session for {cliente_id} failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error iniciando sesión" })),
            )
                .into_response()
        }
    }
}

async fn fetch_challenge(
    State(gateway): State<Arc<Gateway>>,
    Path(cliente_id): Path<String>,
) -> Response {
    match gateway.pairing_challenge(&cliente_id) {
        Some(code) => (StatusCode::OK, code).into_response(),
        None => (StatusCode::NOT_FOUND, "QR no disponible aún").into_response(),
    }
}

async fn send_message(
    State(gateway): State<Arc<Gateway>>,
    Json(body): Json<SendRequest>,
) -> Response {
    let (Some(cliente_id), Some(telefono), Some(texto)) =
        (body.cliente_id, body.telefono, body.texto)
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Faltan campos obligatorios" })),
        )
            .into_response();
    };

    let Some(session) = gateway.session(&cliente_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Sesión no activa para ese cliente_id" })),
        )
            .into_response();
    };

    match session.send_text(&telefono, &texto).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "success": true, "mensaje": "Mensaje enviado por WhatsApp" })),
        )
            .into_response(),
        Err(e) => {
            error!("sending message through {cliente_id} failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error enviando mensaje" })),
            )
                .into_response()
        }
    }
}

async fn delete_session(
    State(gateway): State<Arc<Gateway>>,
    Path(telefono): Path<String>,
) -> Response {
    match gateway.delete_credentials(&telefono).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "mensaje": "Sesión eliminada correctamente" })),
        )
            .into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No existe sesión para ese número" })),
        )
            .into_response(),
        Err(e) => {
            error!("deleting credentials for {telefono} failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error eliminando la sesión" })),
            )
                .into_response()
        }
    }
}
