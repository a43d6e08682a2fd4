use serde_json::Value;

use crate::levels::builtin_level;
use crate::types::Direction;

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    Input { dir: Direction },
    Power,
    ResetGhosts,
    LoadLevel { id: u32 },
    Ping { t: f64 },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "input" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            Some(ParsedClientMessage::Input { dir })
        }
        "power" => Some(ParsedClientMessage::Power),
        "reset" => Some(ParsedClientMessage::ResetGhosts),
        "level" => {
            let id = u32::try_from(object.get("id")?.as_u64()?).ok()?;
            builtin_level(id)?;
            Some(ParsedClientMessage::LoadLevel { id })
        }
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_input_message() {
        assert_eq!(
            parse_client_message(r#"{"type":"input","dir":"up"}"#),
            Some(ParsedClientMessage::Input { dir: Direction::Up })
        );
    }

    #[test]
    fn parse_input_rejects_invalid_or_missing_direction() {
        assert!(parse_client_message(r#"{"type":"input","dir":"invalid"}"#).is_none());
        assert!(parse_client_message(r#"{"type":"input"}"#).is_none());
    }

    #[test]
    fn parse_control_messages() {
        assert_eq!(
            parse_client_message(r#"{"type":"power"}"#),
            Some(ParsedClientMessage::Power)
        );
        assert_eq!(
            parse_client_message(r#"{"type":"reset"}"#),
            Some(ParsedClientMessage::ResetGhosts)
        );
    }

    #[test]
    fn parse_level_accepts_only_builtin_ids() {
        assert_eq!(
            parse_client_message(r#"{"type":"level","id":3}"#),
            Some(ParsedClientMessage::LoadLevel { id: 3 })
        );
        assert!(parse_client_message(r#"{"type":"level","id":9}"#).is_none());
        assert!(parse_client_message(r#"{"type":"level","id":-1}"#).is_none());
    }

    #[test]
    fn parse_ping_requires_finite_number() {
        assert!(matches!(
            parse_client_message(r#"{"type":"ping","t":12.5}"#),
            Some(ParsedClientMessage::Ping { .. })
        ));
        assert!(parse_client_message(r#"{"type":"ping","t":"x"}"#).is_none());
        assert!(parse_client_message("not json").is_none());
        assert!(parse_client_message(r#"{"type":"unknown"}"#).is_none());
    }
}
