use serde::Deserialize;

#[derive(Deserialize)]
pub struct StepRequest {
    pub step: String,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub n: Option<usize>,
}
