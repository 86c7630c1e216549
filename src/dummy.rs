//! Random fake data for filling the store tables without real game info.

use chrono::Utc;
use rand::Rng;

const TITLES: &[&str] = &[
    "SkyQuest",
    "Pixel Dungeon",
    "Cyber Drift",
    "Mystic Valley",
    "Robot Rampage",
    "Star Traders",
];

const GENRES: &[&str] = &["Action", "RPG", "Adventure", "Strategy", "Simulation"];

const PLATFORMS: &[&str] = &["PC", "Switch", "PS5", "Xbox", "Mobile"];

#[derive(Debug, Clone)]
pub struct DummyGame {
    pub id: i64,
    pub title: String,
    pub genre: String,
    pub price: f64,
}

#[derive(Debug, Clone)]
pub struct DummyPurchase {
    pub id: i64,
    pub game_id: i64,
    pub platform: String,
    /// Unix epoch seconds, somewhere in the past year.
    pub bought_at: i64,
}

pub fn game(id: i64) -> DummyGame {
    let mut rng = rand::thread_rng();
    DummyGame {
        id,
        title: format!(
            "{} {}",
            TITLES[rng.gen_range(0..TITLES.len())],
            rng.gen_range(1..=9)
        ),
        genre: GENRES[rng.gen_range(0..GENRES.len())].to_string(),
        price: rng.gen_range(10..=60) as f64,
    }
}

pub fn purchase(id: i64, game_id: i64) -> DummyPurchase {
    let mut rng = rand::thread_rng();
    DummyPurchase {
        id,
        game_id,
        platform: PLATFORMS[rng.gen_range(0..PLATFORMS.len())].to_string(),
        bought_at: Utc::now().timestamp() - rng.gen_range(0..86_400i64 * 365),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_fields_are_plausible() {
        let g = game(7);
        assert_eq!(g.id, 7);
        assert!(!g.title.is_empty());
        assert!(GENRES.contains(&g.genre.as_str()));
        assert!((10.0..=60.0).contains(&g.price));
    }

    #[test]
    fn purchase_timestamp_is_in_the_past_year() {
        let before = Utc::now().timestamp();
        let p = purchase(1, 42);
        let after = Utc::now().timestamp();
        assert_eq!(p.game_id, 42);
        assert!(p.bought_at <= after);
        assert!(p.bought_at > before - 86_400 * 366);
    }
}
