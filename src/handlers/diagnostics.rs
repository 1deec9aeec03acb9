use crate::{
    auth::auth,
    collab::SessionRegistry,
    models::{AuthUser, DiagnosticsResponse, ErrorResponse},
};
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use std::sync::{Arc, Mutex, OnceLock};
use sysinfo::System;
use tracing::info;

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Live counters from the session registry plus system stats
pub async fn diagnostics(
    State(registry): State<Arc<SessionRegistry>>,
    Extension(user): Extension<AuthUser>,
) -> Result<(StatusCode, Json<DiagnosticsResponse>), (StatusCode, Json<ErrorResponse>)> {
    // Ensure the caller is an administrator
    auth::ensure_admin(&user)?;

    // Aggregate counters from the live registry
    let stats = registry.stats();

    // System stats
    let (cpu_usage, memory_alloc, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| Mutex::new(System::new_all()));
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0),
        }
    };

    info!(
        "Diagnostics: CPU: {:.2}%, Mem: {}/{} MB (Free: {} MB), Sessions: {}, Connections: {}, Locks: {}",
        cpu_usage,
        memory_alloc / 1024 / 1024,
        memory_total / 1024 / 1024,
        memory_free / 1024 / 1024,
        stats.sessions,
        stats.connections,
        stats.locks
    );

    Ok((
        StatusCode::OK,
        Json(DiagnosticsResponse {
            n_sessions: stats.sessions as u32,
            n_connections: stats.connections as u32,
            n_participants: stats.participants as u32,
            n_locks: stats.locks as u32,
            cpu_usage,
            memory_alloc,
            memory_total,
            memory_free,
        }),
    ))
}
