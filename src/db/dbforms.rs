use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Error as SqlxError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::info;
use uuid::Uuid;

use crate::models::form::{FormFieldRow, FormResponseRow, FormRow, FormSummary};
use crate::models::form_create::NewFormField;

// Global database instance
static DB: OnceCell<Arc<DbForms>> = OnceCell::const_new();

/// Initialize the global database connection
///
/// # Arguments
/// * `database_url` - PostgreSQL connection string
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error
pub async fn init_db(database_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = DbForms::new(database_url).await?;
    DB.set(Arc::new(db))
        .map_err(|_| "Database already initialized")?;
    Ok(())
}

/// Get the global database instance
///
/// # Returns
/// * `Option<Arc<DbForms>>` - Database instance if initialized
pub fn get_db() -> Option<Arc<DbForms>> {
    DB.get().cloned()
}

/// Database connection pool
pub struct DbForms {
    pool: PgPool,
}

impl DbForms {
    /// Create a new database connection pool
    pub async fn new(database_url: &str) -> Result<Self, SqlxError> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await?;

        info!("Database connection pool created successfully");

        Ok(Self { pool })
    }

    /// Check whether a share code is already taken
    pub async fn share_code_exists(&self, share_code: &str) -> Result<bool, SqlxError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM forms WHERE share_code = $1)")
            .bind(share_code)
            .fetch_one(&self.pool)
            .await
    }

    /// Create a form, its field rows and an empty response document in
    /// one transaction
    ///
    /// # Arguments
    /// * `title` - Form title
    /// * `description` - Optional description
    /// * `created_by` - Creating user id
    /// * `share_code` - Pre-generated unique share code
    /// * `fields` - Field definitions, stored in request order
    ///
    /// # Returns
    /// * `Result<(FormRow, Vec<FormFieldRow>), SqlxError>` - The stored rows
    pub async fn create_form_with_fields(
        &self,
        title: &str,
        description: Option<&str>,
        created_by: Uuid,
        share_code: &str,
        fields: &[NewFormField],
    ) -> Result<(FormRow, Vec<FormFieldRow>), SqlxError> {
        let mut tx = self.pool.begin().await?;

        let form = sqlx::query_as::<_, FormRow>(
            r#"
            INSERT INTO forms (title, description, created_by, share_code)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(created_by)
        .bind(share_code)
        .fetch_one(&mut *tx)
        .await?;

        let mut field_rows = Vec::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            let row = sqlx::query_as::<_, FormFieldRow>(
                r#"
                INSERT INTO form_fields
                    (form_id, field_name, field_type, field_label, field_options,
                     field_placeholder, is_required, field_order)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
                "#,
            )
            .bind(form.id)
            .bind(&field.name)
            .bind(&field.field_type)
            .bind(&field.label)
            .bind(&field.options)
            .bind(&field.placeholder)
            .bind(field.required)
            .bind(index as i32)
            .fetch_one(&mut *tx)
            .await?;
            field_rows.push(row);
        }

        sqlx::query(
            "INSERT INTO form_responses (form_id, response_data, last_updated_by) VALUES ($1, $2, $3)",
        )
        .bind(form.id)
        .bind(serde_json::json!({}))
        .bind(created_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Form {} created with {} fields", form.id, field_rows.len());
        Ok((form, field_rows))
    }

    /// List every form the user created or collaborates on, newest first,
    /// with their field rows attached
    pub async fn list_forms_for_user(&self, user_id: Uuid) -> Result<Vec<FormSummary>, SqlxError> {
        let forms = sqlx::query_as::<_, FormRow>(
            r#"
            SELECT DISTINCT f.*
            FROM forms f
            LEFT JOIN form_collaborators fc ON fc.form_id = f.id
            WHERE f.created_by = $1 OR fc.user_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        if forms.is_empty() {
            return Ok(Vec::new());
        }

        let form_ids: Vec<Uuid> = forms.iter().map(|f| f.id).collect();
        let field_rows = sqlx::query_as::<_, FormFieldRow>(
            "SELECT * FROM form_fields WHERE form_id = ANY($1) ORDER BY field_order",
        )
        .bind(&form_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_form: HashMap<Uuid, Vec<FormFieldRow>> = HashMap::new();
        for row in field_rows {
            by_form.entry(row.form_id).or_default().push(row);
        }

        Ok(forms
            .into_iter()
            .map(|form| {
                let form_fields = by_form.remove(&form.id).unwrap_or_default();
                FormSummary { form, form_fields }
            })
            .collect())
    }

    /// Fetch one form row by id
    pub async fn get_form(&self, form_id: Uuid) -> Result<Option<FormRow>, SqlxError> {
        sqlx::query_as::<_, FormRow>("SELECT * FROM forms WHERE id = $1")
            .bind(form_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Fetch one active form row by id
    pub async fn find_active_form(&self, form_id: Uuid) -> Result<Option<FormRow>, SqlxError> {
        sqlx::query_as::<_, FormRow>("SELECT * FROM forms WHERE id = $1 AND is_active = TRUE")
            .bind(form_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Fetch one active form row by share code
    pub async fn find_form_by_share_code(
        &self,
        share_code: &str,
    ) -> Result<Option<FormRow>, SqlxError> {
        sqlx::query_as::<_, FormRow>(
            "SELECT * FROM forms WHERE share_code = $1 AND is_active = TRUE",
        )
        .bind(share_code)
        .fetch_optional(&self.pool)
        .await
    }

    /// Field rows of one form, in display order
    pub async fn get_form_fields(&self, form_id: Uuid) -> Result<Vec<FormFieldRow>, SqlxError> {
        sqlx::query_as::<_, FormFieldRow>(
            "SELECT * FROM form_fields WHERE form_id = $1 ORDER BY field_order",
        )
        .bind(form_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Current response document of one form
    pub async fn get_form_response(
        &self,
        form_id: Uuid,
    ) -> Result<Option<FormResponseRow>, SqlxError> {
        sqlx::query_as::<_, FormResponseRow>("SELECT * FROM form_responses WHERE form_id = $1")
            .bind(form_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Username of the given user, if known
    pub async fn get_username(&self, user_id: Uuid) -> Result<Option<String>, SqlxError> {
        sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Check whether the user created the form or collaborates on it
    ///
    /// # Arguments
    /// * `form_id` - The form to check
    /// * `user_id` - The user requesting access
    ///
    /// # Returns
    /// * `Result<bool, SqlxError>` - True when access is allowed
    pub async fn has_form_access(&self, form_id: Uuid, user_id: Uuid) -> Result<bool, SqlxError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM forms f
                LEFT JOIN form_collaborators fc
                    ON fc.form_id = f.id AND fc.user_id = $2
                WHERE f.id = $1 AND (f.created_by = $2 OR fc.user_id IS NOT NULL)
            )
            "#,
        )
        .bind(form_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Check whether the user is already a collaborator on the form
    pub async fn is_collaborator(&self, form_id: Uuid, user_id: Uuid) -> Result<bool, SqlxError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM form_collaborators WHERE form_id = $1 AND user_id = $2)",
        )
        .bind(form_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Add the user as a collaborator; joining twice is harmless
    pub async fn add_collaborator(&self, form_id: Uuid, user_id: Uuid) -> Result<(), SqlxError> {
        sqlx::query(
            r#"
            INSERT INTO form_collaborators (form_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(form_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Write the full response document for a form
    pub async fn upsert_form_response(
        &self,
        form_id: Uuid,
        response_data: &serde_json::Value,
        updated_by: Uuid,
    ) -> Result<FormResponseRow, SqlxError> {
        sqlx::query_as::<_, FormResponseRow>(
            r#"
            INSERT INTO form_responses (form_id, response_data, last_updated_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (form_id) DO UPDATE
                SET response_data = EXCLUDED.response_data,
                    last_updated_by = EXCLUDED.last_updated_by,
                    updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(form_id)
        .bind(response_data)
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await
    }

    /// Delete a form if the user created it
    ///
    /// # Returns
    /// * `Result<bool, SqlxError>` - True when a row was deleted
    pub async fn delete_form(&self, form_id: Uuid, created_by: Uuid) -> Result<bool, SqlxError> {
        let result = sqlx::query("DELETE FROM forms WHERE id = $1 AND created_by = $2")
            .bind(form_id)
            .bind(created_by)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
