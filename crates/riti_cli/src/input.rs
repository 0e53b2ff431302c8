//! Turns raw command line values into task drafts and proof payloads.
//!
//! The store keeps whatever it is handed, so the limits on titles, rewards
//! and intervals are enforced here before anything reaches it.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use riti_core::error::AppError;
use riti_core::model::{Task, TaskDraft};
use std::ops::RangeInclusive;
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

pub const TITLE_CHARS: RangeInclusive<usize> = 3..=50;
pub const DESCRIPTION_CHARS: RangeInclusive<usize> = 5..=500;
pub const REWARD_RANGE: RangeInclusive<u32> = 1..=100;
pub const INTERVAL_RANGE: RangeInclusive<u32> = 1..=30;

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Accepts RFC3339, `YYYY-MM-DD HH:MM[:SS]` or `YYYY-MM-DD` (midnight); the
/// latter two are read in `offset`.
pub fn parse_datetime(raw: &str, offset: UtcOffset) -> Result<OffsetDateTime, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("datetime is required"));
    }

    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(parsed);
    }

    let with_seconds = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    if let Ok(parsed) = PrimitiveDateTime::parse(trimmed, with_seconds) {
        return Ok(parsed.assume_offset(offset));
    }

    let with_minutes = format_description!("[year]-[month]-[day] [hour]:[minute]");
    if let Ok(parsed) = PrimitiveDateTime::parse(trimmed, with_minutes) {
        return Ok(parsed.assume_offset(offset));
    }

    let date_only = format_description!("[year]-[month]-[day]");
    if let Ok(date) = Date::parse(trimmed, date_only) {
        return Ok(PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_offset(offset));
    }

    Err(AppError::invalid_input(
        "datetime must be RFC3339, \"YYYY-MM-DD HH:MM[:SS]\" or \"YYYY-MM-DD\"",
    ))
}

pub fn validate_draft(draft: &TaskDraft) -> Result<(), AppError> {
    validate_fields(
        &draft.title,
        &draft.description,
        draft.reward,
        draft.is_recurring,
        draft.recurring_interval,
    )
}

pub fn validate_task(task: &Task) -> Result<(), AppError> {
    validate_fields(
        &task.title,
        &task.description,
        task.reward,
        task.is_recurring,
        task.recurring_interval,
    )
}

fn validate_fields(
    title: &str,
    description: &str,
    reward: u32,
    is_recurring: bool,
    interval: Option<u32>,
) -> Result<(), AppError> {
    let title_len = title.chars().count();
    if !TITLE_CHARS.contains(&title_len) {
        return Err(AppError::invalid_input(format!(
            "title must be {}-{} characters",
            TITLE_CHARS.start(),
            TITLE_CHARS.end()
        )));
    }

    let description_len = description.chars().count();
    if !DESCRIPTION_CHARS.contains(&description_len) {
        return Err(AppError::invalid_input(format!(
            "description must be {}-{} characters",
            DESCRIPTION_CHARS.start(),
            DESCRIPTION_CHARS.end()
        )));
    }

    if !REWARD_RANGE.contains(&reward) {
        return Err(AppError::invalid_input(format!(
            "reward must be {}-{} coins",
            REWARD_RANGE.start(),
            REWARD_RANGE.end()
        )));
    }

    if is_recurring {
        match interval {
            Some(value) if INTERVAL_RANGE.contains(&value) => {}
            _ => {
                return Err(AppError::invalid_input(format!(
                    "repeat interval must be {}-{}",
                    INTERVAL_RANGE.start(),
                    INTERVAL_RANGE.end()
                )));
            }
        }
    }

    Ok(())
}

/// Reads an image file and wraps it as a `data:` URL.
pub fn proof_data_url(path: &Path) -> Result<String, AppError> {
    let mime = image_mime(path).ok_or_else(|| {
        AppError::invalid_input(format!("{} is not a supported image", path.display()))
    })?;
    let bytes = std::fs::read(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    if bytes.is_empty() {
        return Err(AppError::invalid_input(format!(
            "{} is empty",
            path.display()
        )));
    }

    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

fn image_mime(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "heic" => Some("image/heic"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}
