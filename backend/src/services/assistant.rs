//! Chat assistant proxy.
//!
//! Conversations are forwarded to an OpenAI-compatible gateway with a system
//! prompt describing the club, and the gateway's server-sent events are
//! streamed back unchanged. Each wait for the next upstream chunk is bounded
//! by `idle_timeout_secs`; when the consumer drops the stream the upstream
//! response is dropped with it and the connection is released.

use chrono::NaiveTime;
use futures::{Stream, StreamExt};
use log::{error, warn};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::pin::Pin;
use std::time::Duration;

use crate::api::{Court, SlotGrid};
use crate::services::availability::BookingPolicy;

/// `[assistant]` section of the club configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantSettings {
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Bearer key for the gateway. Usually supplied via `ASSISTANT_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_club_name")]
    pub club_name: String,
    /// Location, contacts, prices and house rules quoted by the assistant.
    #[serde(default)]
    pub club: ClubProfile,
    /// Free text appended to the generated prompt.
    #[serde(default)]
    pub extra_instructions: Option<String>,
}

/// One priced item, rendered as `Label: UGX 10,000/hour`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    pub label: String,
    pub amount: u64,
    /// Suffix such as `hour` or `month`; omitted for one-time fees.
    #[serde(default)]
    pub per: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl Rate {
    fn new(label: &str, amount: u64, per: Option<&str>, note: Option<&str>) -> Self {
        Self {
            label: label.to_string(),
            amount,
            per: per.map(str::to_string),
            note: note.map(str::to_string),
        }
    }
}

/// `[assistant.club]`: the club facts the assistant answers from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClubProfile {
    pub location: Option<String>,
    pub phones: Vec<String>,
    pub email: Option<String>,
    pub facilities: Vec<String>,
    pub currency: String,
    pub playing_rates: Vec<Rate>,
    pub monthly_packages: Vec<Rate>,
    pub membership_fees: Vec<Rate>,
    pub membership_benefits: Vec<String>,
    pub house_rules: Vec<String>,
}

impl Default for ClubProfile {
    fn default() -> Self {
        Self {
            location: Some("Buwate, Kampala, Uganda".to_string()),
            phones: vec!["+256 772 675 050".to_string(), "+256 772 367 7325".to_string()],
            email: Some("btc2023@gmail.com".to_string()),
            facilities: vec![
                "Floodlights for evening play".to_string(),
                "2 independent contractor coaches available".to_string(),
            ],
            currency: "UGX".to_string(),
            playing_rates: vec![
                Rate::new("Club Members", 10_000, Some("hour"), None),
                Rate::new("Club Members' Children", 5_000, Some("hour"), None),
                Rate::new("Non-Members", 15_000, Some("hour"), None),
                Rate::new("Non-Members' Children", 10_000, Some("hour"), None),
            ],
            monthly_packages: vec![
                Rate::new("Club Members", 150_000, Some("month"), Some("unlimited play")),
                Rate::new("Non-Members", 200_000, Some("month"), Some("unlimited play")),
            ],
            membership_fees: vec![
                Rate::new("Annual Membership Fee", 100_000, None, Some("one-time")),
                Rate::new("Monthly Subscription", 20_000, Some("month"), None),
            ],
            membership_benefits: vec![
                "discounted rates".to_string(),
                "priority booking".to_string(),
                "tournament access".to_string(),
                "member events".to_string(),
            ],
            house_rules: vec![
                "Pay via MoMo ONLY (0790229161 - Brian Isubikalu). Cash NOT accepted.".to_string(),
                "No animals, pets, or toys inside the fenced court area".to_string(),
                "No smoking within the fenced court area".to_string(),
                "No vulgar language or aggressive behavior".to_string(),
                "Only racquets, tennis balls, and players on the clay courts".to_string(),
                "Violations may result in a ban".to_string(),
            ],
        }
    }
}

fn default_gateway_url() -> String {
    "https://ai.gateway.lovable.dev/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "google/gemini-3-flash-preview".to_string()
}

fn default_idle_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_club_name() -> String {
    "Buwate Tennis Club".to_string()
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            model: default_model(),
            api_key: None,
            idle_timeout_secs: default_idle_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            club_name: default_club_name(),
            club: ClubProfile::default(),
            extra_instructions: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("assistant API key is not configured")]
    MissingApiKey,

    #[error("conversation must contain at least one message")]
    EmptyConversation,

    #[error("Rate limits exceeded, please try again later.")]
    RateLimited,

    #[error("Service temporarily unavailable.")]
    PaymentRequired,

    #[error("AI gateway error")]
    Gateway { status: u16 },

    #[error("gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of the conversation as sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct GatewayMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct GatewayRequest<'a> {
    model: &'a str,
    messages: Vec<GatewayMessage<'a>>,
    stream: bool,
}

/// Raw event-stream bytes from the gateway.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, AssistantError>> + Send>>;

/// Streaming client for the chat gateway.
#[derive(Debug, Clone)]
pub struct ChatProxy {
    client: reqwest::Client,
    settings: AssistantSettings,
    system_prompt: String,
}

impl ChatProxy {
    pub fn new(settings: AssistantSettings, system_prompt: String) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            settings,
            system_prompt,
        })
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Send the conversation and return the gateway's event stream.
    ///
    /// Non-success statuses are mapped before any byte is streamed: 429 and
    /// 402 keep their meaning, anything else becomes [`AssistantError::Gateway`].
    pub async fn open_stream(&self, messages: &[ChatMessage]) -> Result<ChatStream, AssistantError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(AssistantError::MissingApiKey)?;
        if messages.is_empty() {
            return Err(AssistantError::EmptyConversation);
        }

        let mut payload = Vec::with_capacity(messages.len() + 1);
        payload.push(GatewayMessage {
            role: "system",
            content: &self.system_prompt,
        });
        payload.extend(messages.iter().map(|m| GatewayMessage {
            role: match m.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            },
            content: &m.content,
        }));

        let response = self
            .client
            .post(&self.settings.gateway_url)
            .bearer_auth(api_key)
            .json(&GatewayRequest {
                model: &self.settings.model,
                messages: payload,
                stream: true,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => AssistantError::RateLimited,
                StatusCode::PAYMENT_REQUIRED => AssistantError::PaymentRequired,
                other => {
                    let body = response.text().await.unwrap_or_default();
                    error!("AI gateway error: {} {}", other.as_u16(), body);
                    AssistantError::Gateway {
                        status: other.as_u16(),
                    }
                }
            });
        }

        let idle = Duration::from_secs(self.settings.idle_timeout_secs);
        let mut upstream = response.bytes_stream();
        let stream = async_stream::stream! {
            loop {
                match tokio::time::timeout(idle, upstream.next()).await {
                    Ok(Some(Ok(chunk))) => yield Ok(chunk.to_vec()),
                    Ok(Some(Err(e))) => {
                        warn!("gateway stream failed: {}", e);
                        yield Err(AssistantError::Transport(e));
                        break;
                    }
                    Ok(None) => break,
                    Err(_) => {
                        warn!("gateway stream idle for {:?}, closing", idle);
                        break;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }
}

fn hour_label(hour: u32) -> String {
    NaiveTime::from_hms_opt(hour % 24, 0, 0)
        .map(|t| t.format("%-I:%M %p").to_string())
        .unwrap_or_else(|| format!("{}:00", hour))
}

/// Build the assistant's system prompt from the live club configuration so the
/// assistant never quotes rules the server does not enforce.
pub fn build_system_prompt(
    settings: &AssistantSettings,
    grid: &SlotGrid,
    policy: &BookingPolicy,
    courts: &[Court],
) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are the AI Assistant for {}. You help members and visitors with booking courts, \
         membership questions and club rules.",
        settings.club_name
    );

    let club = &settings.club;
    let _ = writeln!(prompt, "\n## Club Information");
    if let Some(location) = &club.location {
        let _ = writeln!(prompt, "Location: {}", location);
    }
    if !club.phones.is_empty() {
        let _ = writeln!(prompt, "Phone: {}", club.phones.join(", "));
    }
    if let Some(email) = &club.email {
        let _ = writeln!(prompt, "Email: {}", email);
    }
    let _ = writeln!(
        prompt,
        "Operating Hours: {} - {} daily",
        hour_label(grid.opening_hour),
        hour_label(grid.closing_hour)
    );
    let _ = writeln!(prompt, "Courts:");
    for court in courts {
        match &court.surface {
            Some(surface) => {
                let _ = writeln!(prompt, "- {} ({}, {})", court.name, surface, court.status);
            }
            None => {
                let _ = writeln!(prompt, "- {} ({})", court.name, court.status);
            }
        }
    }

    for facility in &club.facilities {
        let _ = writeln!(prompt, "- {}", facility);
    }

    write_rates(&mut prompt, "Playing Rates (Per Hour)", &club.playing_rates, &club.currency);
    write_rates(&mut prompt, "Monthly Packages", &club.monthly_packages, &club.currency);
    write_rates(&mut prompt, "Membership", &club.membership_fees, &club.currency);
    if !club.membership_benefits.is_empty() {
        let _ = writeln!(
            prompt,
            "- Benefits include: {}",
            club.membership_benefits.join(", ")
        );
    }

    let _ = writeln!(prompt, "\n## Booking Rules");
    let _ = writeln!(prompt, "- Sessions are one hour and start on the hour");
    if policy.enforce_advance_notice {
        let _ = writeln!(
            prompt,
            "- Book at least {} hours in advance",
            policy.advance_notice_hours
        );
    }
    if policy.enforce_cancellation_window {
        let _ = writeln!(
            prompt,
            "- Cancellation: at least {} hours before your slot",
            policy.cancellation_window_hours
        );
    }
    if !grid.prime_windows.is_empty() {
        let windows: Vec<String> = grid
            .prime_windows
            .iter()
            .map(|w| format!("{} - {}", hour_label(w.start_hour), hour_label(w.end_hour)))
            .collect();
        let _ = writeln!(
            prompt,
            "- Prime Time: {} (all other hours are off-peak)",
            windows.join(" and ")
        );
    }

    if !club.house_rules.is_empty() {
        let _ = writeln!(prompt, "\n## Club Rules");
        for rule in &club.house_rules {
            let _ = writeln!(prompt, "- {}", rule);
        }
    }

    if let Some(extra) = settings.extra_instructions.as_deref() {
        let _ = writeln!(prompt, "\n{}", extra.trim());
    }

    let _ = writeln!(prompt, "\n## Your Behavior");
    let _ = writeln!(prompt, "- Be friendly, helpful and professional");
    let _ = writeln!(prompt, "- Keep responses concise but informative");
    let _ = writeln!(
        prompt,
        "- If asked about something you don't know, suggest contacting the club directly"
    );
    let _ = writeln!(prompt, "- Use {} for all prices", club.currency);
    prompt
}

fn write_rates(prompt: &mut String, title: &str, rates: &[Rate], currency: &str) {
    if rates.is_empty() {
        return;
    }
    let _ = writeln!(prompt, "\n## {}", title);
    for rate in rates {
        let _ = write!(prompt, "- {}: {} {}", rate.label, currency, group_thousands(rate.amount));
        if let Some(per) = &rate.per {
            let _ = write!(prompt, "/{}", per);
        }
        if let Some(note) = &rate.note {
            let _ = write!(prompt, " ({})", note);
        }
        prompt.push('\n');
    }
}

/// `150000` -> `150,000`.
fn group_thousands(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
