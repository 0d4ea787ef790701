use super::episode::EpisodeReport;

/// Per-episode outcomes across a multi-episode run
#[derive(Debug, Default, Clone)]
pub struct MetaHistory {
    pub final_rewards: Vec<f64>,
    pub trades: Vec<usize>,
}

impl MetaHistory {
    pub fn record(&mut self, report: &EpisodeReport) {
        self.final_rewards.push(report.final_reward);
        self.trades.push(report.buys_filled + report.sells_filled);
    }

    pub fn episodes(&self) -> usize {
        self.final_rewards.len()
    }

    pub fn best_final_reward(&self) -> Option<f64> {
        self.final_rewards.iter().copied().reduce(f64::max)
    }

    pub fn avg_final_reward(&self) -> Option<f64> {
        if self.final_rewards.is_empty() {
            return None;
        }
        Some(self.final_rewards.iter().sum::<f64>() / self.final_rewards.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(final_reward: f64) -> EpisodeReport {
        EpisodeReport {
            ticker: "NVDA".to_string(),
            episode: 0,
            steps: 4,
            final_reward,
            final_cash: 0.,
            final_holdings: 0.,
            buy_actions: 1,
            sell_actions: 1,
            hold_actions: 2,
            buys_filled: 1,
            sells_filled: 0,
        }
    }

    #[test]
    fn test_meta_history_aggregates() {
        let mut meta = MetaHistory::default();
        assert_eq!(meta.avg_final_reward(), None);

        meta.record(&report(100.));
        meta.record(&report(-50.));

        assert_eq!(meta.episodes(), 2);
        assert_eq!(meta.best_final_reward(), Some(100.));
        assert_eq!(meta.avg_final_reward(), Some(25.));
        assert_eq!(meta.trades, vec![1, 1]);
    }
}
