use crate::models::*;
use utoipa::OpenApi;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Live session and system diagnostics
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Current registry and system counters", body = DiagnosticsResponse),
        (status = 403, description = "Administrator access required", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

/// Create a form
#[utoipa::path(
    post,
    path = "/api/forms",
    request_body = CreateFormRequest,
    responses(
        (status = 201, description = "Form created", body = CreateFormResponse),
        (status = 400, description = "Missing title or malformed fields", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn form_create_doc() {}

/// List the caller's forms
#[utoipa::path(
    get,
    path = "/api/forms",
    responses(
        (status = 200, description = "Owned and collaborated forms, newest first", body = FormListResponse)
    )
)]
#[allow(dead_code)]
pub async fn form_list_doc() {}

/// Fetch one form with fields and current response
#[utoipa::path(
    get,
    path = "/api/forms/{form_id}",
    params(
        ("form_id" = String, Path, description = "Form id")
    ),
    responses(
        (status = 200, description = "Form with fields and response", body = FormGetResponse),
        (status = 403, description = "Caller has no access to this form", body = ErrorResponse),
        (status = 404, description = "Form not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn form_get_doc() {}

/// Join a form by share code or form id
#[utoipa::path(
    post,
    path = "/api/forms/join",
    request_body = FormJoinRequest,
    responses(
        (status = 200, description = "Joined, or already a member", body = FormJoinResponse),
        (status = 404, description = "No active form for the given code", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn form_join_doc() {}

/// Replace the consolidated form response
#[utoipa::path(
    post,
    path = "/api/forms/{form_id}/response",
    params(
        ("form_id" = String, Path, description = "Form id")
    ),
    request_body = SaveResponseRequest,
    responses(
        (status = 200, description = "Response stored", body = ResponseSaved),
        (status = 404, description = "Form not found or access denied", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn save_response_doc() {}

/// Merge one field value into the form response
#[utoipa::path(
    patch,
    path = "/api/forms/{form_id}/response",
    params(
        ("form_id" = String, Path, description = "Form id")
    ),
    request_body = PatchResponseRequest,
    responses(
        (status = 200, description = "Field value stored", body = ResponseSaved),
        (status = 404, description = "Form not found or access denied", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn patch_response_doc() {}

/// Delete a form
#[utoipa::path(
    delete,
    path = "/api/forms/{form_id}",
    params(
        ("form_id" = String, Path, description = "Form id")
    ),
    responses(
        (status = 200, description = "Form deleted", body = FormDeleteResponse),
        (status = 404, description = "Form not found or caller is not the creator", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn form_delete_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        diagnostics_doc,
        form_create_doc,
        form_list_doc,
        form_get_doc,
        form_join_doc,
        save_response_doc,
        patch_response_doc,
        form_delete_doc,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            DiagnosticsResponse,
            ErrorResponse,
            CreateFormRequest,
            NewFormField,
            CreatedForm,
            CreateFormResponse,
            FormRow,
            FormFieldRow,
            FormSummary,
            FormListResponse,
            FieldView,
            FormDetail,
            FormGetResponse,
            FormJoinRequest,
            FormJoinResponse,
            SaveResponseRequest,
            PatchResponseRequest,
            FormResponseRow,
            ResponseSaved,
            FormDeleteResponse
        )
    ),
    tags(
        (name = "api", description = "API endpoints")
    )
)]
pub struct ApiDoc;
