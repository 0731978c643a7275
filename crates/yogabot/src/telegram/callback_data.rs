//! Inline button payloads
//!
//! Telegram limits callback data to 64 bytes, so payloads are short
//! `kind[:arg]` strings.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackData {
    /// Show the plan list
    Plans,
    /// Show payment methods for a plan
    Plan(i64),
    /// "I have paid": start the email check
    Paid,
}

impl CallbackData {
    pub fn encode(&self) -> String {
        match self {
            CallbackData::Plans => "plans".to_string(),
            CallbackData::Plan(id) => format!("plan:{}", id),
            CallbackData::Paid => "paid".to_string(),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        match data.split_once(':') {
            None => match data {
                "plans" => Some(CallbackData::Plans),
                "paid" => Some(CallbackData::Paid),
                _ => None,
            },
            Some(("plan", id)) => id.parse().ok().map(CallbackData::Plan),
            Some(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn encodes_and_parses() {
        for data in [CallbackData::Plans, CallbackData::Plan(12), CallbackData::Paid] {
            assert_eq!(CallbackData::parse(&data.encode()), Some(data));
        }
    }

    #[test]
    fn rejects_unknown_payloads() {
        assert_eq!(CallbackData::parse("plan:abc"), None);
        assert_eq!(CallbackData::parse("plan:"), None);
        assert_eq!(CallbackData::parse("buy:1"), None);
        assert_eq!(CallbackData::parse(""), None);
    }
}
