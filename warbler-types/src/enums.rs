use serde::{Deserialize, Serialize};

/// Bootstrap alert flavour of a flash message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    #[default]
    Info,
    Warning,
    Danger,
}

/// Outcome of pressing the like button on a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeToggle {
    Liked,
    Unliked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_category_serializes_as_alert_class() {
        assert_eq!(
            serde_json::to_value(FlashCategory::Danger).unwrap(),
            "danger"
        );
        let parsed: FlashCategory = serde_json::from_str(r#""success""#).unwrap();
        assert_eq!(parsed, FlashCategory::Success);
        assert_eq!(FlashCategory::default(), FlashCategory::Info);
    }
}
