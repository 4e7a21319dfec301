//! Named workloads selectable from the command line

/// A workload the binary knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedWorkload {
    /// The shared-counter comparison across all accumulation strategies
    Counter,
}

impl NamedWorkload {
    /// Names accepted on the command line, with descriptions
    pub const AVAILABLE: [(&'static str, &'static str); 2] = [
        ("counter", "compare counter accumulation strategies"),
        ("concurrency", "alias of counter"),
    ];

    /// Parse workload name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "counter" | "concurrency" => Some(Self::Counter),
            _ => None,
        }
    }

    /// Usage text listing the available workloads
    pub fn usage() -> String {
        let mut text = String::from("Available workloads:\n");
        for (name, description) in Self::AVAILABLE {
            text.push_str(&format!("  {:<12} - {}\n", name, description));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_workloads() {
        assert_eq!(NamedWorkload::parse("counter"), Some(NamedWorkload::Counter));
        assert_eq!(
            NamedWorkload::parse("Concurrency"),
            Some(NamedWorkload::Counter)
        );
        assert_eq!(NamedWorkload::parse("fibonacci"), None);
    }

    #[test]
    fn test_usage_lists_every_name() {
        let usage = NamedWorkload::usage();
        for (name, _) in NamedWorkload::AVAILABLE {
            assert!(usage.contains(name));
        }
    }
}
