use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use serde_json::{Map, Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UiError {
    /// The encoded state would not fit the configured budget. This is the
    /// expected trigger for database persistence, not a bug signal.
    #[error("state too complex for inline encoding ({encoded_len} > {budget})")]
    StateTooComplex { encoded_len: usize, budget: usize },
    /// The identifier could not be decoded back into a state. Buttons
    /// carrying such an identifier are permanently broken.
    #[error("malformed button state: {0}")]
    MalformedState(String),
    /// A handler wire name that no registered handler answers to.
    #[error("unknown handler: {0}")]
    UnknownHandler(String),
    #[error("custom_id too long: {len} > {max}")]
    CustomIdTooLong { len: usize, max: usize },
    #[error("view already holds the maximum of {max} buttons")]
    TooManyButtons { max: usize },
}

/// Standardized button action families.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Navigate,
    Toggle,
    Action,
    Modal,
    Confirm,
}

impl ActionKind {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Navigate => "nav",
            Self::Toggle => "toggle",
            Self::Action => "action",
            Self::Modal => "modal",
            Self::Confirm => "confirm",
        }
    }

    pub fn from_wire(tag: &str) -> Option<Self> {
        match tag {
            "nav" => Some(Self::Navigate),
            "toggle" => Some(Self::Toggle),
            "action" => Some(Self::Action),
            "modal" => Some(Self::Modal),
            "confirm" => Some(Self::Confirm),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    First,
    Prev,
    Next,
    Last,
}

impl Direction {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Prev => "prev",
            Self::Next => "next",
            Self::Last => "last",
        }
    }

    pub fn from_wire(tag: &str) -> Option<Self> {
        match tag {
            "first" => Some(Self::First),
            "prev" => Some(Self::Prev),
            "next" => Some(Self::Next),
            "last" => Some(Self::Last),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ToggleScope {
    Server,
    Global,
}

impl ToggleScope {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Global => "global",
        }
    }

    pub fn from_wire(tag: &str) -> Option<Self> {
        match tag {
            "server" => Some(Self::Server),
            "global" => Some(Self::Global),
            _ => None,
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            Self::Server => Self::Global,
            Self::Global => Self::Server,
        }
    }
}

/// Typed button payload, one variant per action family.
///
/// The variants serialize to the same short field keys the identifiers have
/// always carried, so encoded blobs and stored rows stay wire-compatible.
#[derive(Clone, Debug, PartialEq)]
pub enum ButtonPayload {
    Navigate {
        direction: Direction,
        page: u16,
        total: u16,
        target_user: Option<u64>,
    },
    Toggle {
        scope: ToggleScope,
    },
    Action {
        name: String,
    },
    Modal {
        form: String,
    },
    Confirm {
        token: String,
    },
}

impl ButtonPayload {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Navigate { .. } => ActionKind::Navigate,
            Self::Toggle { .. } => ActionKind::Toggle,
            Self::Action { .. } => ActionKind::Action,
            Self::Modal { .. } => ActionKind::Modal,
            Self::Confirm { .. } => ActionKind::Confirm,
        }
    }

    /// Flatten the payload into its wire field map.
    pub fn to_field_map(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        match self {
            Self::Navigate {
                direction,
                page,
                total,
                target_user,
            } => {
                fields.insert("direction".into(), json!(direction.as_wire()));
                fields.insert("page".into(), json!(page));
                fields.insert("total".into(), json!(total));
                if let Some(target) = target_user {
                    fields.insert("target_user_id".into(), json!(target));
                }
            }
            Self::Toggle { scope } => {
                fields.insert("s".into(), json!(scope.as_wire()));
            }
            Self::Action { name } => {
                fields.insert("action".into(), json!(name));
            }
            Self::Modal { form } => {
                fields.insert("form".into(), json!(form));
            }
            Self::Confirm { token } => {
                fields.insert("t".into(), json!(token));
            }
        }
        fields
    }

    /// Rebuild a typed payload from an action tag and its wire field map.
    pub fn from_field_map(kind: ActionKind, fields: &Map<String, Value>) -> Result<Self, UiError> {
        match kind {
            ActionKind::Navigate => {
                let direction = str_field(fields, "direction")
                    .and_then(Direction::from_wire)
                    .ok_or_else(|| malformed("missing or invalid direction"))?;
                let page = int_field(fields, "page")
                    .ok_or_else(|| malformed("missing navigation page"))?;
                let total = int_field(fields, "total")
                    .ok_or_else(|| malformed("missing navigation total"))?;
                let target_user = fields.get("target_user_id").and_then(Value::as_u64);
                Ok(Self::Navigate {
                    direction,
                    page: page as u16,
                    total: total as u16,
                    target_user,
                })
            }
            ActionKind::Toggle => {
                let scope = str_field(fields, "s")
                    .and_then(ToggleScope::from_wire)
                    .ok_or_else(|| malformed("missing or invalid toggle scope"))?;
                Ok(Self::Toggle { scope })
            }
            ActionKind::Action => {
                let name = str_field(fields, "action")
                    .ok_or_else(|| malformed("missing action name"))?;
                Ok(Self::Action {
                    name: name.to_string(),
                })
            }
            ActionKind::Modal => {
                let form =
                    str_field(fields, "form").ok_or_else(|| malformed("missing modal form"))?;
                Ok(Self::Modal {
                    form: form.to_string(),
                })
            }
            ActionKind::Confirm => {
                let token =
                    str_field(fields, "t").ok_or_else(|| malformed("missing confirm token"))?;
                Ok(Self::Confirm {
                    token: token.to_string(),
                })
            }
        }
    }

    /// The single `key:value` pair eligible for the compact layout, if any.
    ///
    /// Only payloads that flatten to exactly one short string field qualify;
    /// the pipe separator inside a value would corrupt the layout.
    fn compact_pair(&self) -> Option<(&'static str, &str)> {
        let pair = match self {
            Self::Toggle { scope } => ("s", scope.as_wire()),
            Self::Action { name } => ("action", name.as_str()),
            Self::Modal { form } => ("form", form.as_str()),
            Self::Confirm { token } => ("t", token.as_str()),
            Self::Navigate { .. } => return None,
        };
        if pair.1.len() < 10 && !pair.1.contains('|') {
            Some(pair)
        } else {
            None
        }
    }
}

/// Compact state record carried by a persistent button.
#[derive(Clone, Debug, PartialEq)]
pub struct ButtonState {
    /// Authorized user, or 0 for public buttons anyone may activate.
    pub owner_id: u64,
    pub payload: ButtonPayload,
    pub guild_id: Option<u64>,
    /// Unix timestamp. None never expires.
    pub expires_at: Option<i64>,
}

impl ButtonState {
    pub fn new(owner_id: u64, payload: ButtonPayload) -> Self {
        ButtonState {
            owner_id,
            payload,
            guild_id: None,
            expires_at: None,
        }
    }

    pub fn with_guild(mut self, guild_id: Option<u64>) -> Self {
        self.guild_id = guild_id;
        self
    }

    pub fn with_expiry(mut self, expires_at: Option<i64>) -> Self {
        self.expires_at = expires_at;
        self
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => Utc::now().timestamp() > expires,
            None => false,
        }
    }

    /// Encode the state into a base64 string for a custom_id.
    ///
    /// Simple single-value payloads use the compact pipe layout
    /// (`owner|kind|key:value[|g:guild][|e:expiry]`), everything else the
    /// minified JSON envelope (`u`/`a`/`d`/`g`/`e`). Both are transported
    /// through URL-safe unpadded base64.
    pub fn encode(&self, budget: usize) -> Result<String, UiError> {
        let plain = if let Some((key, value)) = self.payload.compact_pair() {
            let mut compact = format!(
                "{}|{}|{}:{}",
                self.owner_id,
                self.payload.kind().as_wire(),
                key,
                value
            );
            if let Some(guild_id) = self.guild_id {
                compact.push_str(&format!("|g:{}", guild_id));
            }
            if let Some(expires) = self.expires_at {
                compact.push_str(&format!("|e:{}", expires));
            }
            compact
        } else {
            let mut envelope = Map::new();
            envelope.insert("u".into(), json!(self.owner_id));
            envelope.insert("a".into(), json!(self.payload.kind().as_wire()));
            envelope.insert("d".into(), Value::Object(self.payload.to_field_map()));
            if let Some(guild_id) = self.guild_id {
                envelope.insert("g".into(), json!(guild_id));
            }
            if let Some(expires) = self.expires_at {
                envelope.insert("e".into(), json!(expires));
            }
            Value::Object(envelope).to_string()
        };

        let encoded = URL_SAFE_NO_PAD.encode(plain.as_bytes());
        if encoded.len() > budget {
            return Err(UiError::StateTooComplex {
                encoded_len: encoded.len(),
                budget,
            });
        }

        Ok(encoded)
    }

    /// Decode a state previously produced by [`ButtonState::encode`].
    pub fn decode(encoded: &str) -> Result<Self, UiError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.as_bytes())
            .map_err(|e| malformed(&format!("base64: {e}")))?;
        let plain =
            String::from_utf8(bytes).map_err(|e| malformed(&format!("not utf-8: {e}")))?;

        if plain.contains('|') && !plain.starts_with('{') {
            Self::decode_compact(&plain)
        } else {
            Self::decode_envelope(&plain)
        }
    }

    fn decode_compact(plain: &str) -> Result<Self, UiError> {
        let parts: Vec<&str> = plain.split('|').collect();
        if parts.len() < 3 {
            return Err(malformed("compact layout needs owner, kind and data"));
        }

        let owner_id: u64 = parts[0]
            .parse()
            .map_err(|_| malformed("compact owner is not an integer"))?;
        let kind = ActionKind::from_wire(parts[1])
            .ok_or_else(|| malformed("compact layout carries unknown action kind"))?;

        let (key, value) = parts[2]
            .split_once(':')
            .ok_or_else(|| malformed("compact data is not key:value"))?;
        let mut fields = Map::new();
        fields.insert(key.to_string(), json!(value));

        let mut guild_id = None;
        let mut expires_at = None;
        for part in &parts[3..] {
            if let Some(rest) = part.strip_prefix("g:") {
                guild_id =
                    Some(rest.parse().map_err(|_| malformed("invalid guild segment"))?);
            } else if let Some(rest) = part.strip_prefix("e:") {
                expires_at =
                    Some(rest.parse().map_err(|_| malformed("invalid expiry segment"))?);
            }
        }

        Ok(ButtonState {
            owner_id,
            payload: ButtonPayload::from_field_map(kind, &fields)?,
            guild_id,
            expires_at,
        })
    }

    fn decode_envelope(plain: &str) -> Result<Self, UiError> {
        let value: Value =
            serde_json::from_str(plain).map_err(|e| malformed(&format!("json: {e}")))?;
        let envelope = value
            .as_object()
            .ok_or_else(|| malformed("envelope is not an object"))?;

        let owner_id = envelope
            .get("u")
            .and_then(Value::as_u64)
            .ok_or_else(|| malformed("envelope missing owner"))?;
        let kind = envelope
            .get("a")
            .and_then(Value::as_str)
            .and_then(ActionKind::from_wire)
            .ok_or_else(|| malformed("envelope carries unknown action kind"))?;
        let fields = envelope
            .get("d")
            .and_then(Value::as_object)
            .ok_or_else(|| malformed("envelope missing data"))?;

        Ok(ButtonState {
            owner_id,
            payload: ButtonPayload::from_field_map(kind, fields)?,
            guild_id: envelope.get("g").and_then(Value::as_u64),
            expires_at: envelope.get("e").and_then(Value::as_i64),
        })
    }
}

fn malformed(detail: &str) -> UiError {
    UiError::MalformedState(detail.to_string())
}

fn str_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

fn int_field(fields: &Map<String, Value>, key: &str) -> Option<u64> {
    fields.get(key).and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUDGET: usize = 80;

    #[test]
    fn test_roundtrip_compact_toggle() {
        let state = ButtonState::new(
            42,
            ButtonPayload::Toggle {
                scope: ToggleScope::Global,
            },
        )
        .with_guild(Some(1234))
        .with_expiry(Some(1_900_000_000));

        let encoded = state.encode(BUDGET).unwrap();
        assert_eq!(ButtonState::decode(&encoded).unwrap(), state);
    }

    #[test]
    fn test_roundtrip_json_navigate() {
        let state = ButtonState::new(
            42,
            ButtonPayload::Navigate {
                direction: Direction::Next,
                page: 0,
                total: 3,
                target_user: None,
            },
        );

        let encoded = state.encode(BUDGET).unwrap();
        assert_eq!(ButtonState::decode(&encoded).unwrap(), state);
    }

    #[test]
    fn test_compact_layout_used_for_single_short_string() {
        let state = ButtonState::new(
            7,
            ButtonPayload::Action {
                name: "quiz".to_string(),
            },
        );
        let encoded = state.encode(BUDGET).unwrap();
        let plain = String::from_utf8(URL_SAFE_NO_PAD.decode(&encoded).unwrap()).unwrap();
        assert_eq!(plain, "7|action|action:quiz");
    }

    #[test]
    fn test_long_value_uses_json_envelope() {
        let state = ButtonState::new(
            7,
            ButtonPayload::Action {
                name: "a-name-well-past-ten-chars".to_string(),
            },
        );
        let encoded = state.encode(200).unwrap();
        let plain = String::from_utf8(URL_SAFE_NO_PAD.decode(&encoded).unwrap()).unwrap();
        assert!(plain.starts_with('{'));
        assert_eq!(ButtonState::decode(&encoded).unwrap(), state);
    }

    #[test]
    fn test_oversized_state_reports_too_complex() {
        let state = ButtonState::new(
            99,
            ButtonPayload::Confirm {
                token: "x".repeat(120),
            },
        );
        match state.encode(BUDGET) {
            Err(UiError::StateTooComplex { encoded_len, budget }) => {
                assert!(encoded_len > budget);
            }
            other => panic!("expected StateTooComplex, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            ButtonState::decode("not base64!!"),
            Err(UiError::MalformedState(_))
        ));

        let bogus_kind = URL_SAFE_NO_PAD.encode(b"1|teleport|x:y");
        assert!(matches!(
            ButtonState::decode(&bogus_kind),
            Err(UiError::MalformedState(_))
        ));
    }

    #[test]
    fn test_expiry_monotonicity() {
        let past = ButtonState::new(
            1,
            ButtonPayload::Action {
                name: "x".to_string(),
            },
        )
        .with_expiry(Some(Utc::now().timestamp() - 1));
        assert!(past.is_expired());

        let never = ButtonState::new(
            1,
            ButtonPayload::Action {
                name: "x".to_string(),
            },
        );
        assert!(!never.is_expired());
    }

    #[test]
    fn test_expired_state_still_decodes() {
        let state = ButtonState::new(
            5,
            ButtonPayload::Toggle {
                scope: ToggleScope::Server,
            },
        )
        .with_expiry(Some(100));

        let decoded = ButtonState::decode(&state.encode(BUDGET).unwrap()).unwrap();
        assert!(decoded.is_expired());
        assert_eq!(decoded, state);
    }

    #[test]
    fn test_field_map_roundtrip_all_kinds() {
        let payloads = vec![
            ButtonPayload::Navigate {
                direction: Direction::Prev,
                page: 4,
                total: 9,
                target_user: Some(123_456_789_012_345_678),
            },
            ButtonPayload::Toggle {
                scope: ToggleScope::Server,
            },
            ButtonPayload::Action {
                name: "guide".to_string(),
            },
            ButtonPayload::Modal {
                form: "feedback".to_string(),
            },
            ButtonPayload::Confirm {
                token: "abc123".to_string(),
            },
        ];

        for payload in payloads {
            let fields = payload.to_field_map();
            let rebuilt = ButtonPayload::from_field_map(payload.kind(), &fields).unwrap();
            assert_eq!(rebuilt, payload);
        }
    }
}
