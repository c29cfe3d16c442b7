//! Turning a rendered bill into something a customer can open on WhatsApp.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;

use crate::domain::errors::DomainError;

/// Every customer is reached through an Indian number.
pub const COUNTRY_CODE: &str = "91";

/// Largest bill image accepted for upload (5 MiB decoded).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// `https://wa.me/91<digits>?text=<message>`. `None` when the phone has no
/// digits at all.
pub fn share_link(phone: &str, message: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    Some(format!(
        "https://wa.me/{COUNTRY_CODE}{digits}?text={}",
        urlencoding::encode(message)
    ))
}

pub fn bill_message(date: NaiveDate, url: &str) -> String {
    format!("आप का {} का बिल इस लिंक में है:\n{url}", date.format("%d/%m/%Y"))
}

/// Decodes a `data:image/<png|jpeg>;base64,<payload>` URL into the image
/// bytes and a file extension.
pub fn decode_image_data_url(data_url: &str) -> Result<(Vec<u8>, &'static str), DomainError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| DomainError::invalid("image data must be a data: URL"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| DomainError::invalid("image data URL has no payload"))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| DomainError::invalid("image data URL must be base64 encoded"))?;
    let extension = match mime {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        other => {
            return Err(DomainError::invalid(format!(
                "unsupported image type '{other}'"
            )))
        }
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| DomainError::invalid(format!("invalid base64 image data: {e}")))?;
    if bytes.is_empty() {
        return Err(DomainError::invalid("image is empty"));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(DomainError::invalid(format!(
            "image is {} bytes, limit is {MAX_IMAGE_BYTES}",
            bytes.len()
        )));
    }
    Ok((bytes, extension))
}
