mod window_image;
mod reference;
mod request;
mod state;

use std::{path::Path, sync::Arc};

use anyhow::Context;
use sqlx::FromRow;
use state::StoreState;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub use window_image::{Dimensions, ImageRepository, NewImage, WindowImage};
pub use reference::ReferenceSpecRepository;
pub use request::{NewRequest, RequestRepository, RequestStatus, RequestUpdate, WindowRequest};

use crate::models::{ReferenceSpec, ReferenceTable, ReferenceType, Unit};

/// Handle to a request store directory.
///
/// Cheap to clone; clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct RequestDb {
    state: Arc<StoreState>,
}

impl RequestDb {
    /// Open the store in `dir`, creating it and applying migrations as needed.
    pub async fn open<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        Ok(Self {
            state: Arc::new(StoreState::new(dir).await?),
        })
    }

    /// Close the connection pool; every later call fails.
    pub async fn close(&self) {
        self.state.close().await;
    }
}

#[derive(FromRow)]
struct RequestRow {
    id: i64,
    customer_name: String,
    phone: String,
    status: String,
    memo: Option<String>,
    created_at: String,
}

impl TryFrom<RequestRow> for WindowRequest {
    type Error = anyhow::Error;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        Ok(WindowRequest {
            id: row.id,
            customer_name: row.customer_name,
            phone: row.phone,
            status: row.status.parse()?,
            memo: row.memo,
            created_at: OffsetDateTime::parse(&row.created_at, &Rfc3339)?,
            _guard: (),
        })
    }
}

#[derive(FromRow)]
struct ImageRow {
    id: i64,
    request_id: i64,
    image_fname: String,
    location_type: String,
    reference_type: String,
    width: Option<f64>,
    height: Option<f64>,
}

impl RequestDb {
    fn image_from_row(&self, row: ImageRow) -> WindowImage {
        WindowImage {
            id: row.id,
            request_id: row.request_id,
            image_path: self.state.image_path(&row.image_fname),
            location_type: row.location_type,
            reference_type: row.reference_type,
            width: row.width,
            height: row.height,
            _guard: (),
        }
    }
}

const REQUEST_COLUMNS: &str = "id, customer_name, phone, status, memo, created_at";
const IMAGE_COLUMNS: &str =
    "id, request_id, image_fname, location_type, reference_type, width, height";

impl RequestRepository for RequestDb {
    async fn add_request(&self, request: &NewRequest) -> anyhow::Result<WindowRequest> {
        let created_at = OffsetDateTime::now_utc().format(&Rfc3339)?;
        let row: RequestRow = sqlx::query_as(&format!(
            "INSERT INTO window_request (customer_name, phone, status, memo, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(&request.customer_name)
        .bind(&request.phone)
        .bind(RequestStatus::Uploaded.as_str())
        .bind(&request.memo)
        .bind(created_at)
        .fetch_one(self.state.pool())
        .await?;
        row.try_into()
    }

    async fn import_request(
        &self,
        request: &NewRequest,
        status_label: &str,
    ) -> anyhow::Result<WindowRequest> {
        let status = RequestStatus::from_import_label(status_label)?;
        let created_at = OffsetDateTime::now_utc().format(&Rfc3339)?;
        let row: RequestRow = sqlx::query_as(&format!(
            "INSERT INTO window_request (customer_name, phone, status, memo, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(&request.customer_name)
        .bind(&request.phone)
        .bind(status.as_str())
        .bind(&request.memo)
        .bind(created_at)
        .fetch_one(self.state.pool())
        .await?;
        tracing::debug!(request = row.id, label = status_label, %status, "imported request");
        row.try_into()
    }

    async fn get_request(&self, id: i64) -> anyhow::Result<Option<WindowRequest>> {
        let row: Option<RequestRow> = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM window_request WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.state.pool())
        .await?;
        row.map(WindowRequest::try_from).transpose()
    }

    async fn get_requests(&self) -> anyhow::Result<Vec<WindowRequest>> {
        let rows: Vec<RequestRow> = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM window_request ORDER BY id DESC"
        ))
        .fetch_all(self.state.pool())
        .await?;
        rows.into_iter().map(WindowRequest::try_from).collect()
    }

    async fn update_request(
        &self,
        request: &WindowRequest,
        update: &RequestUpdate,
    ) -> anyhow::Result<WindowRequest> {
        let mut tx = self.state.pool().begin().await?;

        // Check against the stored row, not the caller's possibly stale copy
        let current: RequestRow = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM window_request WHERE id = ?"
        ))
        .bind(request.id)
        .fetch_optional(&mut *tx)
        .await?
        .with_context(|| format!("Request {} not found", request.id))?;
        let current = WindowRequest::try_from(current)?;

        let status = match update.status {
            Some(next) if !current.status.can_transition_to(next) => {
                anyhow::bail!(
                    "Invalid status transition for request {}: {} -> {}",
                    current.id,
                    current.status,
                    next
                );
            }
            Some(next) => next,
            None => current.status,
        };
        let memo = match &update.memo {
            Some(memo) => memo.clone(),
            None => current.memo.clone(),
        };

        let row: RequestRow = sqlx::query_as(&format!(
            "UPDATE window_request SET status = ?, memo = ? WHERE id = ?
            RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(memo)
        .bind(current.id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        if status != current.status {
            tracing::info!(request = current.id, from = %current.status, to = %status, "request status changed");
        }
        row.try_into()
    }

    async fn delete_request(&self, request: WindowRequest) -> anyhow::Result<()> {
        let mut tx = self.state.pool().begin().await?;
        let fnames: Vec<String> =
            sqlx::query_scalar("SELECT image_fname FROM window_image WHERE request_id = ?")
                .bind(request.id)
                .fetch_all(&mut *tx)
                .await?;
        sqlx::query("DELETE FROM window_image WHERE request_id = ?")
            .bind(request.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM window_request WHERE id = ?")
            .bind(request.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        for fname in fnames {
            self.state.delete_image(&fname).await?;
        }
        Ok(())
    }
}

impl ImageRepository for RequestDb {
    async fn add_image(&self, request: &WindowRequest, image: &NewImage) -> anyhow::Result<WindowImage> {
        let image_fname = self.state.store_image(&image.source_path).await?;
        let inserted: Result<ImageRow, sqlx::Error> = sqlx::query_as(&format!(
            "INSERT INTO window_image (request_id, image_fname, location_type, reference_type)
            VALUES (?, ?, ?, ?)
            RETURNING {IMAGE_COLUMNS}"
        ))
        .bind(request.id)
        .bind(&image_fname)
        .bind(&image.location_type)
        .bind(&image.reference_type)
        .fetch_one(self.state.pool())
        .await;

        match inserted {
            Ok(row) => Ok(self.image_from_row(row)),
            Err(e) => {
                // Don't leave an orphaned copy behind
                self.state.delete_image(&image_fname).await?;
                Err(e.into())
            }
        }
    }

    async fn get_images(&self, request: &WindowRequest) -> anyhow::Result<Vec<WindowImage>> {
        let rows: Vec<ImageRow> = sqlx::query_as(&format!(
            "SELECT {IMAGE_COLUMNS} FROM window_image WHERE request_id = ? ORDER BY id ASC"
        ))
        .bind(request.id)
        .fetch_all(self.state.pool())
        .await?;
        Ok(rows.into_iter().map(|row| self.image_from_row(row)).collect())
    }

    async fn get_image_by_id(&self, id: i64) -> anyhow::Result<Option<WindowImage>> {
        let row: Option<ImageRow> = sqlx::query_as(&format!(
            "SELECT {IMAGE_COLUMNS} FROM window_image WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.state.pool())
        .await?;
        Ok(row.map(|row| self.image_from_row(row)))
    }

    async fn set_image_dimensions(
        &self,
        image: &WindowImage,
        dimensions: Dimensions,
    ) -> anyhow::Result<WindowImage> {
        let row: ImageRow = sqlx::query_as(&format!(
            "UPDATE window_image SET width = ?, height = ? WHERE id = ?
            RETURNING {IMAGE_COLUMNS}"
        ))
        .bind(dimensions.width)
        .bind(dimensions.height)
        .bind(image.id)
        .fetch_optional(self.state.pool())
        .await?
        .with_context(|| format!("Image {} not found", image.id))?;
        Ok(self.image_from_row(row))
    }
}

#[derive(FromRow)]
struct ReferenceSpecRow {
    reference_type: String,
    real_width: f64,
    real_height: f64,
    unit: String,
}

impl ReferenceSpecRepository for RequestDb {
    async fn get_reference_table(&self) -> anyhow::Result<ReferenceTable> {
        let rows: Vec<ReferenceSpecRow> = sqlx::query_as(
            "SELECT reference_type, real_width, real_height, unit FROM reference_spec",
        )
        .fetch_all(self.state.pool())
        .await?;

        let mut table = ReferenceTable::new();
        for row in rows {
            let Ok(reference_type) = row.reference_type.parse::<ReferenceType>() else {
                tracing::warn!(reference_type = %row.reference_type, "skipping unknown reference type");
                continue;
            };
            table.insert(ReferenceSpec {
                reference_type,
                real_width: row.real_width,
                real_height: row.real_height,
                unit: row.unit.parse::<Unit>()?,
            });
        }
        Ok(table)
    }

    async fn set_reference_spec(&self, spec: &ReferenceSpec) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO reference_spec (reference_type, real_width, real_height, unit)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (reference_type) DO UPDATE SET
                real_width = excluded.real_width,
                real_height = excluded.real_height,
                unit = excluded.unit",
        )
        .bind(spec.reference_type.as_str())
        .bind(spec.real_width)
        .bind(spec.real_height)
        .bind(spec.unit.as_str())
        .execute(self.state.pool())
        .await?;
        Ok(())
    }
}
