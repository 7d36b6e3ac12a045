use crate::{
    entities::bank_slip::{self, BankSlipStatus, Entity as BankSlip, Model as BankSlipModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Accepted evidence formats.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf"];
/// Upload size ceiling (10 MiB).
pub const MAX_SLIP_BYTES: usize = 10 * 1024 * 1024;

/// Bank-slip store: uploaded payment evidence awaiting manual review.
/// Approving or rejecting a slip never touches the referenced order; that
/// settlement is a separate administrative action.
#[derive(Clone)]
pub struct BankSlipService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    upload_dir: PathBuf,
}

impl BankSlipService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            db,
            event_sender,
            upload_dir: upload_dir.into(),
        }
    }

    /// Writes the uploaded file under the configured directory and records
    /// it as `Pending`. The stored name is generated, never client-chosen.
    #[instrument(skip(self, bytes), fields(order_number = %order_number, size = bytes.len()))]
    pub async fn store_slip(
        &self,
        order_number: &str,
        original_file_name: &str,
        bytes: &[u8],
    ) -> Result<BankSlipModel, ServiceError> {
        if order_number.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Order number is required".to_string(),
            ));
        }
        if bytes.is_empty() {
            return Err(ServiceError::ValidationError(
                "Uploaded file is empty".to_string(),
            ));
        }
        if bytes.len() > MAX_SLIP_BYTES {
            return Err(ServiceError::ValidationError(
                "Uploaded file exceeds the 10 MiB limit".to_string(),
            ));
        }

        let extension = allowed_extension(original_file_name).ok_or_else(|| {
            ServiceError::ValidationError(
                "Only JPEG, PNG, or PDF files are allowed".to_string(),
            )
        })?;

        let slip_id = Uuid::new_v4();
        let file_path = self.upload_dir.join(format!("{}.{}", slip_id, extension));

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| ServiceError::InternalError(format!("upload dir: {}", e)))?;
        tokio::fs::write(&file_path, bytes)
            .await
            .map_err(|e| ServiceError::InternalError(format!("slip write: {}", e)))?;

        let slip = bank_slip::ActiveModel {
            id: Set(slip_id),
            order_number: Set(order_number.to_string()),
            file_path: Set(file_path.to_string_lossy().into_owned()),
            uploaded_at: Set(Utc::now()),
            status: Set(BankSlipStatus::Pending),
        };
        let slip = slip.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::BankSlipUploaded(slip_id))
            .await;

        info!("Stored bank slip {} for order {}", slip_id, order_number);
        Ok(slip)
    }

    pub async fn list(&self) -> Result<Vec<BankSlipModel>, ServiceError> {
        Ok(BankSlip::find()
            .order_by_desc(bank_slip::Column::UploadedAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<BankSlipModel, ServiceError> {
        BankSlip::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Bank slip {} not found", id)))
    }

    /// Administrative review transition.
    #[instrument(skip(self), fields(slip_id = %id))]
    pub async fn set_status(
        &self,
        id: Uuid,
        status: BankSlipStatus,
    ) -> Result<BankSlipModel, ServiceError> {
        let slip = self.get(id).await?;

        let mut active: bank_slip::ActiveModel = slip.into();
        active.status = Set(status);
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::BankSlipReviewed {
                slip_id: id,
                status: status.to_string(),
            })
            .await;
        Ok(updated)
    }
}

/// Returns the normalized extension when the file name carries an accepted
/// evidence format.
pub fn allowed_extension(file_name: &str) -> Option<String> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}
