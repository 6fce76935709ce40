//! Table QR codes pointing customers at the menu.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat, Luma};
use indexmap::IndexSet;
use qrcode::QrCode;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::Locale;

/// Upper bound on codes rendered by one batch request.
pub const MAX_BATCH_SIZE: usize = 200;

/// Smallest edge of the rendered image, in pixels.
const MIN_IMAGE_SIZE: u32 = 256;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrRequest {
    pub table_number: u32,
    #[serde(default)]
    pub language: Option<Locale>,
}

/// Either an explicit table list or an inclusive `from..=to` range.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchQrRequest {
    pub tables: Option<Vec<u32>>,
    pub from: Option<u32>,
    pub to: Option<u32>,
    pub language: Option<Locale>,
}

impl BatchQrRequest {
    /// Table numbers to render, deduplicated in request order.
    pub fn table_numbers(&self) -> Result<Vec<u32>, AppError> {
        let tables: Vec<u32> = match (&self.tables, self.from, self.to) {
            (Some(tables), _, _) => {
                let mut unique: IndexSet<u32> = IndexSet::new();
                for table in tables {
                    unique.insert(*table);
                    if unique.len() > MAX_BATCH_SIZE {
                        return Err(too_many());
                    }
                }
                unique.into_iter().collect()
            }
            (None, Some(from), Some(to)) => {
                if from > to {
                    return Err(AppError::Validation("from must not exceed to".to_string()));
                }
                if (to - from) as usize >= MAX_BATCH_SIZE {
                    return Err(too_many());
                }
                (from..=to).collect()
            }
            _ => {
                return Err(AppError::Validation(
                    "Provide either tables or from and to".to_string(),
                ))
            }
        };

        if tables.is_empty() {
            return Err(AppError::Validation("No tables requested".to_string()));
        }
        if tables.len() > MAX_BATCH_SIZE {
            return Err(too_many());
        }
        Ok(tables)
    }
}

fn too_many() -> AppError {
    AppError::Validation(format!(
        "At most {} QR codes per batch",
        MAX_BATCH_SIZE
    ))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableQr {
    pub table_number: u32,
    pub url: String,
    /// PNG as a `data:` URL
    pub qr_code: String,
}

/// Renders menu links for tables under the public site URL.
#[derive(Debug, Clone)]
pub struct QrGenerator {
    base_url: String,
}

impl QrGenerator {
    pub fn new(public_url: &str) -> Self {
        Self {
            base_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn table_url(&self, table_number: u32, language: Option<Locale>) -> String {
        match language {
            Some(lang) => format!(
                "{}/menu?table={}&lang={}",
                self.base_url,
                table_number,
                lang.as_str()
            ),
            None => format!("{}/menu?table={}", self.base_url, table_number),
        }
    }

    pub fn generate(&self, table_number: u32, language: Option<Locale>) -> Result<TableQr, AppError> {
        if table_number == 0 {
            return Err(AppError::Validation("tableNumber must be at least 1".to_string()));
        }

        let url = self.table_url(table_number, language);
        let qr_code = render_png_data_url(&url)?;
        Ok(TableQr {
            table_number,
            url,
            qr_code,
        })
    }

    pub fn generate_batch(&self, request: &BatchQrRequest) -> Result<Vec<TableQr>, AppError> {
        request
            .table_numbers()?
            .into_iter()
            .map(|table| self.generate(table, request.language))
            .collect()
    }
}

fn render_png_data_url(content: &str) -> Result<String, AppError> {
    let code = QrCode::new(content.as_bytes())
        .map_err(|e| AppError::Internal(format!("Failed to encode QR code: {}", e)))?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_IMAGE_SIZE, MIN_IMAGE_SIZE)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| AppError::Internal(format!("Failed to write QR image: {}", e)))?;

    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
}
