use super::{AlertLevel, Direction, ObjectCategory};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Languages the alert text is composed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ja,
    Ko,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "ja" => Ok(Locale::Ja),
            "ko" => Ok(Locale::Ko),
            other => Err(format!("unknown locale '{}' (expected en, ja or ko)", other)),
        }
    }
}

impl Direction {
    pub fn phrase(self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => match self {
                Direction::Front => "front",
                Direction::FrontRight => "front-right",
                Direction::Right => "right",
                Direction::BackRight => "back-right",
                Direction::Back => "back",
                Direction::BackLeft => "back-left",
                Direction::Left => "left",
                Direction::FrontLeft => "front-left",
            },
            Locale::Ja => match self {
                Direction::Front => "前方",
                Direction::FrontRight => "右前方",
                Direction::Right => "右",
                Direction::BackRight => "右後方",
                Direction::Back => "後方",
                Direction::BackLeft => "左後方",
                Direction::Left => "左",
                Direction::FrontLeft => "左前方",
            },
            Locale::Ko => match self {
                Direction::Front => "전방",
                Direction::FrontRight => "우측 전방",
                Direction::Right => "우측",
                Direction::BackRight => "우측 후방",
                Direction::Back => "후방",
                Direction::BackLeft => "좌측 후방",
                Direction::Left => "좌측",
                Direction::FrontLeft => "좌측 전방",
            },
        }
    }
}

impl ObjectCategory {
    pub fn phrase(self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => match self {
                ObjectCategory::Vehicle => "vehicle",
                ObjectCategory::Bicycle => "bicycle",
                ObjectCategory::Pedestrian => "pedestrian",
                ObjectCategory::Obstacle => "obstacle",
                ObjectCategory::Unknown => "object",
            },
            Locale::Ja => match self {
                ObjectCategory::Vehicle => "車両",
                ObjectCategory::Bicycle => "自転車",
                ObjectCategory::Pedestrian => "歩行者",
                ObjectCategory::Obstacle => "障害物",
                ObjectCategory::Unknown => "物体",
            },
            Locale::Ko => match self {
                ObjectCategory::Vehicle => "차량",
                ObjectCategory::Bicycle => "자전거",
                ObjectCategory::Pedestrian => "보행자",
                ObjectCategory::Obstacle => "장애물",
                ObjectCategory::Unknown => "물체",
            },
        }
    }
}

impl AlertLevel {
    pub fn label(self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => match self {
                AlertLevel::None => "Clear",
                AlertLevel::Info => "Info",
                AlertLevel::Caution => "Caution",
                AlertLevel::Warning => "Warning",
                AlertLevel::Critical => "Critical",
            },
            Locale::Ja => match self {
                AlertLevel::None => "安全",
                AlertLevel::Info => "情報",
                AlertLevel::Caution => "注意",
                AlertLevel::Warning => "警告",
                AlertLevel::Critical => "危険",
            },
            Locale::Ko => match self {
                AlertLevel::None => "안전",
                AlertLevel::Info => "정보",
                AlertLevel::Caution => "주의",
                AlertLevel::Warning => "경고",
                AlertLevel::Critical => "위험",
            },
        }
    }
}

/// Alert text: direction phrase, distance rounded to whole meters, object phrase.
pub fn compose_alert_message(
    locale: Locale,
    direction_degrees: f64,
    distance: f32,
    category: ObjectCategory,
) -> String {
    format!(
        "{} {:.0}m - {}",
        Direction::from_degrees(direction_degrees).phrase(locale),
        distance,
        category.phrase(locale)
    )
}
