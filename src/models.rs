use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// POST /generate body
#[derive(Deserialize, Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub current: Option<Map<String, Value>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GenerateResponse {
    pub query: String,
}

// POST /visit body
#[derive(Deserialize, Debug, Clone)]
pub struct VisitRequest {
    #[serde(rename = "visitorId")]
    pub visitor_id: String,
}

// Anthropic Messages API request format
#[derive(Serialize, Debug)]
pub struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system: &'a str,
    pub messages: Vec<Message<'a>>,
}

#[derive(Serialize, Debug)]
pub struct Message<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

// Anthropic Messages API response format, only the parts we read
#[derive(Deserialize, Debug)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Deserialize, Debug)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}
