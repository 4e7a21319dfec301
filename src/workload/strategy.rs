//! Accumulation strategy definitions

use serde::Serialize;

/// Supported counter accumulation strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccumulationStrategy {
    /// One counter behind one lock shared by every worker
    GlobalLock,
    /// One lock per shard, workers mapped onto shards by id
    ShardedLock,
    /// Workers send increments to a single aggregator over a channel
    ChannelFunnel,
}

impl AccumulationStrategy {
    /// All strategies in the order the driver runs them
    pub const ALL: [AccumulationStrategy; 3] = [
        AccumulationStrategy::GlobalLock,
        AccumulationStrategy::ShardedLock,
        AccumulationStrategy::ChannelFunnel,
    ];

    /// Parse strategy from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "global-lock" | "global_lock" | "globallock" | "global" | "mutex" => {
                Some(Self::GlobalLock)
            }
            "sharded-lock" | "sharded_lock" | "shardedlock" | "sharded" | "shards" => {
                Some(Self::ShardedLock)
            }
            "channel-funnel" | "channel_funnel" | "channelfunnel" | "channel" | "funnel" => {
                Some(Self::ChannelFunnel)
            }
            _ => None,
        }
    }

    /// Get display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GlobalLock => "GLOBAL_LOCK",
            Self::ShardedLock => "SHARDED_LOCK",
            Self::ChannelFunnel => "CHANNEL_FUNNEL",
        }
    }

    /// Short human description used in the banner
    pub fn description(&self) -> &'static str {
        match self {
            Self::GlobalLock => "single mutex around one counter",
            Self::ShardedLock => "per-shard mutex, summed after the barrier",
            Self::ChannelFunnel => "message per increment into one aggregator",
        }
    }
}

impl std::fmt::Display for AccumulationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strategies() {
        assert_eq!(
            AccumulationStrategy::parse("global-lock"),
            Some(AccumulationStrategy::GlobalLock)
        );
        assert_eq!(
            AccumulationStrategy::parse("MUTEX"),
            Some(AccumulationStrategy::GlobalLock)
        );
        assert_eq!(
            AccumulationStrategy::parse("Sharded"),
            Some(AccumulationStrategy::ShardedLock)
        );
        assert_eq!(
            AccumulationStrategy::parse(" channel_funnel "),
            Some(AccumulationStrategy::ChannelFunnel)
        );
        assert_eq!(AccumulationStrategy::parse("atomic"), None);
    }

    #[test]
    fn test_canonical_order() {
        let mut shuffled = vec![
            AccumulationStrategy::ChannelFunnel,
            AccumulationStrategy::GlobalLock,
            AccumulationStrategy::ShardedLock,
        ];
        shuffled.sort();
        assert_eq!(shuffled, AccumulationStrategy::ALL.to_vec());
    }

    #[test]
    fn test_display_matches_serialized_name() {
        for strategy in AccumulationStrategy::ALL {
            let json = serde_json::to_string(&strategy).unwrap();
            assert_eq!(json, format!("\"{}\"", strategy));
        }
    }
}
