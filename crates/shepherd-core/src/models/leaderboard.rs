use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::utils::cmp_ignore_case;

/// Reading-plan progress for one member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub progress_percent: f64,
}

/// Podium placing for the top three
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankTier {
    Gold,
    Silver,
    Bronze,
    Standard,
}

impl RankTier {
    pub fn for_rank(rank: usize) -> Self {
        match rank {
            1 => RankTier::Gold,
            2 => RankTier::Silver,
            3 => RankTier::Bronze,
            _ => RankTier::Standard,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedUser {
    /// 1-based
    pub rank: usize,
    pub tier: RankTier,
    pub progress: UserProgress,
}

impl RankedUser {
    /// Progress clamped to 0..=100 for gauges
    pub fn percent(&self) -> f64 {
        self.progress.progress_percent.clamp(0.0, 100.0)
    }
}

/// Order by progress (highest first, ties by name) and assign ranks
pub fn rank_users(mut users: Vec<UserProgress>) -> Vec<RankedUser> {
    users.sort_by(|a, b| {
        b.progress_percent
            .partial_cmp(&a.progress_percent)
            .unwrap_or(Ordering::Equal)
            .then_with(|| cmp_ignore_case(&a.name, &b.name))
    });
    users
        .into_iter()
        .enumerate()
        .map(|(i, progress)| RankedUser {
            rank: i + 1,
            tier: RankTier::for_rank(i + 1),
            progress,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, name: &str, pct: f64) -> UserProgress {
        UserProgress {
            user_id: id,
            name: name.to_string(),
            progress_percent: pct,
        }
    }

    #[test]
    fn test_rank_users_orders_by_progress() {
        let ranked = rank_users(vec![
            user(1, "Ana", 40.0),
            user(2, "Budi", 90.5),
            user(3, "Citra", 75.0),
            user(4, "Dewi", 10.0),
        ]);

        let names: Vec<&str> = ranked.iter().map(|r| r.progress.name.as_str()).collect();
        assert_eq!(names, vec!["Budi", "Citra", "Ana", "Dewi"]);
        assert_eq!(ranked[0].tier, RankTier::Gold);
        assert_eq!(ranked[1].tier, RankTier::Silver);
        assert_eq!(ranked[2].tier, RankTier::Bronze);
        assert_eq!(ranked[3].tier, RankTier::Standard);
        assert_eq!(ranked[3].rank, 4);
    }

    #[test]
    fn test_ties_break_by_name() {
        let ranked = rank_users(vec![user(1, "zed", 50.0), user(2, "Amy", 50.0)]);
        assert_eq!(ranked[0].progress.name, "Amy");
    }

    #[test]
    fn test_parse_and_clamp() {
        let json = r#"[{"userId": 7, "name": "Eka", "progressPercent": 120}]"#;
        let users: Vec<UserProgress> = serde_json::from_str(json).unwrap();
        let ranked = rank_users(users);
        assert_eq!(ranked[0].percent(), 100.0);
    }
}
