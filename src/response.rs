use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct List<T> {
    list: Vec<T>,
    total: i64,
}

impl<T> List<T> {
    pub fn new(list: Vec<T>, total: i64) -> Self {
        List { list, total }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub id: i32,
}

#[derive(Debug, Serialize)]
pub struct ProcedureResponse {
    pub success: bool,
    pub message: String,
}

impl ProcedureResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: i64,
}
