//! # Contact Intake
//!
//! Orchestrates the public submission flow: buffer the multipart payload,
//! validate fields, persist attachments, persist the record, notify admin
//! viewers. Nothing touches disk or storage until validation has passed.

use actix_multipart::{Field, Multipart};
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use futures_util::TryStreamExt;
use serde::Serialize;

use hb_core::traits::ContactStore;
use hb_core::validate::{validate_submission, RawSubmission};

use crate::hub::AdminEvent;
use crate::upload::{LocalUploadStore, MAX_IMAGES, MAX_IMAGE_BYTES};
use crate::AppState;

/// Text fields are small; anything beyond this is hostile.
const MAX_TEXT_BYTES: usize = 16 * 1024;

#[derive(Debug, Serialize)]
struct SubmitResponse {
    success: bool,
    message: String,
    #[serde(rename = "imageCount")]
    image_count: usize,
}

#[derive(Debug, Serialize)]
struct SubmitFailure {
    success: bool,
    message: String,
}

fn reject(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(SubmitFailure {
        success: false,
        message: message.into(),
    })
}

/// An image part held in memory until validation allows it onto disk.
struct BufferedImage {
    data: Vec<u8>,
    original_name: String,
    mimetype: String,
}

pub async fn submit_contact(state: web::Data<AppState>, payload: Multipart) -> HttpResponse {
    let (raw, buffered) = match read_submission(payload).await {
        Ok(parts) => parts,
        Err(message) => return reject(StatusCode::BAD_REQUEST, message),
    };

    let mut fields = match validate_submission(&raw) {
        Ok(fields) => fields,
        Err(e) => return reject(StatusCode::BAD_REQUEST, e.to_string()),
    };

    // Validation passed; only now do the buffered images reach disk.
    for image in buffered {
        match state
            .uploads
            .save_image(image.data, &image.original_name, &image.mimetype)
            .await
        {
            Ok(attachment) => fields.images.push(attachment),
            Err(e) => {
                log::error!("failed to store upload: {e}");
                return reject(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process request");
            }
        }
    }

    let image_count = fields.images.len();
    match state.store.create(fields).await {
        Ok(contact) => {
            log::info!("new contact request {} ({} images)", contact.id, image_count);
            // Best effort only; a notification problem never fails intake.
            state
                .hub
                .broadcast(&AdminEvent::NewContact { timestamp: Utc::now() });
            HttpResponse::Ok().json(SubmitResponse {
                success: true,
                message: "Contact request received!".to_string(),
                image_count,
            })
        }
        Err(e) => {
            log::error!("failed to persist contact: {e}");
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process request")
        }
    }
}

/// Drains the multipart payload into raw form fields plus buffered image
/// parts, enforcing count, size and type limits as the bytes arrive.
async fn read_submission(
    mut payload: Multipart,
) -> Result<(RawSubmission, Vec<BufferedImage>), String> {
    let mut raw = RawSubmission::default();
    let mut images: Vec<BufferedImage> = Vec::new();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|_| "Malformed multipart payload".to_string())?
    {
        let name = field.name().to_string();
        if name == "images" {
            let original_name = field
                .content_disposition()
                .get_filename()
                .map(str::to_string)
                .unwrap_or_default();
            if original_name.is_empty() {
                // An empty file input still produces a part; skip it.
                drain(&mut field).await?;
                continue;
            }
            if images.len() == MAX_IMAGES {
                return Err(format!("Too many images (max {MAX_IMAGES})"));
            }
            let mimetype = field
                .content_type()
                .map(|m| m.to_string())
                .unwrap_or_default();
            if !LocalUploadStore::is_allowed(&mimetype, &original_name) {
                return Err("Invalid file type".to_string());
            }
            let data = read_bytes(&mut field, MAX_IMAGE_BYTES, "Image too large (max 5MB)").await?;
            images.push(BufferedImage {
                data,
                original_name,
                mimetype,
            });
        } else {
            let value = String::from_utf8_lossy(
                &read_bytes(&mut field, MAX_TEXT_BYTES, "Field too large").await?,
            )
            .into_owned();
            match name.as_str() {
                "name" => raw.name = Some(value),
                "phone" => raw.phone = Some(value),
                "email" => raw.email = Some(value),
                "zip" => raw.zip = Some(value),
                "when" => raw.when = Some(value),
                "time" => raw.time = Some(value),
                "items" => raw.items = Some(value),
                "location" => raw.location = Some(value),
                // Unknown fields are ignored, not rejected.
                _ => {}
            }
        }
    }

    Ok((raw, images))
}

async fn read_bytes(field: &mut Field, limit: usize, too_large: &str) -> Result<Vec<u8>, String> {
    let mut data = Vec::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|_| "Malformed multipart payload".to_string())?
    {
        if data.len() + chunk.len() > limit {
            return Err(too_large.to_string());
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

async fn drain(field: &mut Field) -> Result<(), String> {
    while field
        .try_next()
        .await
        .map_err(|_| "Malformed multipart payload".to_string())?
        .is_some()
    {}
    Ok(())
}
