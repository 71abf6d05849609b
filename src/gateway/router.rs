//! Route resolution.
//!
//! Matching is on trailing path segments so deployment stage prefixes
//! (`/prod/courses`) route the same as bare paths. Identifier extraction
//! tries the structured path-parameter field first and falls back to the raw
//! path, since either envelope shape may carry the identifier.

use percent_encoding::percent_decode_str;

use super::event::NormalizedRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Preflight,
    ListCourses,
    /// `course_id` is the raw path tail when the path carried it; the
    /// structured parameter, when present, wins at extraction time.
    GetCourse { course_id: Option<String> },
    ListCourseVideos { course_id: Option<String> },
    GetUserTenant { user_id: Option<String> },
    RecordTransaction,
    CreateOrder,
    ConfirmSignup,
}

impl Route {
    /// Catalog reads are partitioned by tenant and refuse to run without one.
    pub fn requires_tenant(&self) -> bool {
        matches!(self, Route::ListCourses | Route::GetCourse { .. })
    }
}

pub fn resolve(req: &NormalizedRequest) -> Option<Route> {
    // Preflight bypasses every other check, tenant header included.
    if req.method == "OPTIONS" {
        return Some(Route::Preflight);
    }

    let segments: Vec<&str> = req.path.split('/').filter(|s| !s.is_empty()).collect();
    match req.method.as_str() {
        "GET" => resolve_get(req, &segments),
        "POST" => resolve_post(&segments),
        _ => None,
    }
}

fn resolve_get(req: &NormalizedRequest, segments: &[&str]) -> Option<Route> {
    if segments.last() == Some(&"courses") {
        return Some(Route::ListCourses);
    }
    if let [.., "courses", course_id, "videos"] = segments {
        return Some(Route::ListCourseVideos {
            course_id: Some((*course_id).to_string()),
        });
    }
    if segments.last() == Some(&"videos") && req.path_params.contains_key("course_id") {
        return Some(Route::ListCourseVideos { course_id: None });
    }
    if let [.., "users", user_id, "tenant"] = segments {
        return Some(Route::GetUserTenant {
            user_id: Some((*user_id).to_string()),
        });
    }
    if segments.last() == Some(&"user-tenant") {
        return Some(Route::GetUserTenant { user_id: None });
    }
    if let Some(pos) = segments.iter().rposition(|s| *s == "courses") {
        let tail = &segments[pos + 1..];
        if !tail.is_empty() {
            return Some(Route::GetCourse {
                course_id: Some(tail.join("/")),
            });
        }
    }
    if req.path_params.contains_key("course_id") {
        return Some(Route::GetCourse { course_id: None });
    }
    None
}

fn resolve_post(segments: &[&str]) -> Option<Route> {
    match segments.last().copied() {
        Some("transactions") => Some(Route::RecordTransaction),
        Some("orders") => Some(Route::CreateOrder),
        Some("signup-confirmations") => Some(Route::ConfirmSignup),
        _ => None,
    }
}

/// Identifiers may carry reserved characters, so path-derived values are
/// percent-decoded before use as lookup keys.
pub fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}
