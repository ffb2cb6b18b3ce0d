use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Response header carrying the total number of conversations alongside a
/// listing page, so clients can size their pagination without a second call.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";
