use serde_json::Value;

use crate::types::Direction;

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    /// `dir` is `None` when the client sent a value outside the four moving
    /// directions; such a move changes nothing.
    Move { dir: Option<Direction> },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "move" => {
            let dir = object
                .get("dir")
                .and_then(|value| value.as_str())
                .and_then(Direction::parse_move);
            Some(ParsedClientMessage::Move { dir })
        }
        _ => None,
    }
}
