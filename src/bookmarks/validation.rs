use serde_json::Value;
use url::Url;

use crate::error::ValidationError;
use crate::model::{BookmarkPatch, NewBookmark};

const MIN_RATING: i64 = 0;
const MAX_RATING: i64 = 5;

/// Returns the field's value unless it is absent, `null`, `false` or `""`.
/// A rating of `0` counts as present.
fn present<'a>(input: &'a Value, field: &str) -> Option<&'a Value> {
    match input.get(field)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        v => Some(v),
    }
}

fn parse_rating(value: &Value) -> Result<i64, ValidationError> {
    let rating = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= MIN_RATING as f64 && f <= MAX_RATING as f64 => f as i64,
                _ => return Err(ValidationError::InvalidRating),
            },
        },
        _ => return Err(ValidationError::InvalidRating),
    };

    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ValidationError::InvalidRating);
    }
    Ok(rating)
}

/// Absolute web URI: `http` or `https` scheme and a non-empty host.
pub fn is_web_uri(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

fn parse_url(value: &Value) -> Result<String, ValidationError> {
    match value.as_str() {
        Some(raw) if is_web_uri(raw) => Ok(raw.to_owned()),
        _ => Err(ValidationError::InvalidUrl),
    }
}

fn parse_text(value: &Value, field: &'static str) -> Result<String, ValidationError> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or(ValidationError::NotText(field))
}

pub fn validate_create(input: &Value) -> Result<NewBookmark, ValidationError> {
    let title = present(input, "title").ok_or(ValidationError::MissingField("title"))?;
    let url = present(input, "url").ok_or(ValidationError::MissingField("url"))?;
    let rating = present(input, "rating").ok_or(ValidationError::MissingField("rating"))?;

    let rating = parse_rating(rating)?;
    let url = parse_url(url)?;
    let title = parse_text(title, "title")?;
    let description = present(input, "description")
        .map(|d| parse_text(d, "description"))
        .transpose()?;

    Ok(NewBookmark {
        title,
        url,
        description,
        rating,
    })
}

pub fn validate_update(input: &Value) -> Result<BookmarkPatch, ValidationError> {
    let patch = BookmarkPatch {
        title: present(input, "title").map(|v| parse_text(v, "title")).transpose()?,
        url: present(input, "url").map(parse_url).transpose()?,
        description: present(input, "description")
            .map(|v| parse_text(v, "description"))
            .transpose()?,
        rating: present(input, "rating").map(parse_rating).transpose()?,
    };

    if patch.is_empty() {
        return Err(ValidationError::EmptyUpdate);
    }
    Ok(patch)
}
