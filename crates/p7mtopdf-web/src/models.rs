use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use p7mtopdf_ingest::ItemWarning;
use serde::Serialize;

/// Per-entry warning as sent to the browser.
#[derive(Debug, Clone, Serialize)]
pub struct WarningJson {
    pub name: String,
    pub message: String,
}

impl From<&ItemWarning> for WarningJson {
    fn from(w: &ItemWarning) -> Self {
        WarningJson {
            name: w.name.clone(),
            message: w.message.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorJson {
    pub error: String,
}

/// An error response with a JSON `{ "error": ... }` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        } else {
            tracing::warn!(status = %self.status, error = %self.message, "request rejected");
        }
        (
            self.status,
            Json(ErrorJson {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Serialize to JSON using only ASCII, so the result fits in an HTTP header.
pub fn to_ascii_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let json = serde_json::to_string(value)?;
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(out)
}

/// JSON array of warnings for a response header, keeping only as many leading
/// entries as fit in `max_bytes`.
pub fn warnings_header(warnings: &[ItemWarning], max_bytes: usize) -> serde_json::Result<String> {
    let mut kept: Vec<WarningJson> = Vec::new();
    let mut json = to_ascii_json(&kept)?;
    for warning in warnings {
        kept.push(WarningJson::from(warning));
        let candidate = to_ascii_json(&kept)?;
        if candidate.len() > max_bytes {
            break;
        }
        json = candidate;
    }
    Ok(json)
}

/// `Content-Disposition` value for a download, with the name reduced to safe ASCII.
pub fn attachment(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let safe: String = base
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_json_escapes_non_ascii() {
        let warnings = vec![WarningJson {
            name: "città.p7m".into(),
            message: "no PDF content found in 'città.p7m' 📄".into(),
        }];
        let json = to_ascii_json(&warnings).unwrap();
        assert!(json.is_ascii());
        assert!(json.contains("citt\\u00e0.p7m"));
        assert!(json.contains("\\ud83d\\udcc4"));

        let back: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0]["name"], "città.p7m");
    }

    #[test]
    fn warnings_header_is_capped() {
        let warnings: Vec<ItemWarning> = (0..1000)
            .map(|i| ItemWarning {
                name: format!("fattura_{i:04}.p7m"),
                message: format!("no PDF content found in 'fattura_{i:04}.p7m' (missing %PDF- marker)"),
            })
            .collect();

        let json = warnings_header(&warnings, 4096).unwrap();
        assert!(json.len() <= 4096);
        let kept: serde_json::Value = serde_json::from_str(&json).unwrap();
        let kept = kept.as_array().unwrap();
        assert!(!kept.is_empty() && kept.len() < warnings.len());
        assert_eq!(kept[0]["name"], "fattura_0000.p7m");

        let first_two: Vec<WarningJson> = warnings[..2].iter().map(WarningJson::from).collect();
        assert_eq!(
            warnings_header(&warnings[..2], 4096).unwrap(),
            to_ascii_json(&first_two).unwrap()
        );
        assert_eq!(warnings_header(&warnings, 10).unwrap(), "[]");
    }

    #[test]
    fn attachment_strips_directories_and_quotes() {
        assert_eq!(
            attachment("2024/q1/fat\"tura.pdf"),
            "attachment; filename=\"fat_tura.pdf\""
        );
        assert_eq!(attachment("città.pdf"), "attachment; filename=\"citt_.pdf\"");
    }
}
