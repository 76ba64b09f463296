use crate::service::AnalysisService;

pub struct AppState<S> {
    pub service: AnalysisService<S>,
    pub invalidate_token: Option<String>,
}

impl<S> AppState<S> {
    pub fn new(service: AnalysisService<S>, invalidate_token: Option<String>) -> Self {
        Self {
            service,
            invalidate_token,
        }
    }
}
