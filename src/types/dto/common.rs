use poem_openapi::Object;

/// Health check response
#[derive(Object, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
