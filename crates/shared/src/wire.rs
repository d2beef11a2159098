use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::Ticket;

// ============================================================================
// Requests
// ============================================================================

/// Credentials for `POST /auth/login`, sent form-encoded
#[derive(Debug, Clone, Serialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Body of `POST /auth/register`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Body of `POST /tickets`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketRequest {
    pub session_id: i64,
    pub seat_numbers: Vec<u32>,
    pub total_price: f64,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// `POST /tickets` answers with either one ticket or one ticket per seat
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TicketsResponse {
    Many(Vec<Ticket>),
    One(Box<Ticket>),
}

impl TicketsResponse {
    pub fn into_vec(self) -> Vec<Ticket> {
        match self {
            TicketsResponse::Many(tickets) => tickets,
            TicketsResponse::One(ticket) => vec![*ticket],
        }
    }
}

/// Error payload of a non-2xx response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Text(String),
    Validation(Vec<ValidationItem>),
    Other(Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationItem {
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub loc: Vec<Value>,
}

impl ErrorBody {
    /// Human-readable message, if the body carries one
    pub fn message(&self) -> Option<String> {
        let detail = match &self.detail {
            Some(ErrorDetail::Text(text)) if !text.is_empty() => Some(text.clone()),
            Some(ErrorDetail::Validation(items)) => {
                let msgs: Vec<String> = items
                    .iter()
                    .filter_map(|item| {
                        let msg = item.msg.as_deref()?;
                        let field = item.loc.last().and_then(Value::as_str);
                        Some(match field {
                            Some(field) => format!("{}: {}", field, msg),
                            None => msg.to_string(),
                        })
                    })
                    .collect();
                (!msgs.is_empty()).then(|| msgs.join("; "))
            }
            Some(ErrorDetail::Other(value)) if !value.is_null() => Some(value.to_string()),
            _ => None,
        };
        detail.or_else(|| self.message.clone().filter(|m| !m.is_empty()))
    }
}
