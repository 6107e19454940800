use serde::Deserialize;

/// Reasoning-effort inference policy table
///
/// The defaults encode a keyword heuristic; only monotonicity is
/// contractual, so deployments can tune the lists and cut-offs freely.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EffortConfig {
    /// Keywords signalling design- or architecture-level work
    #[serde(default = "default_architecture_keywords")]
    pub architecture_keywords: Vec<String>,
    /// Keywords signalling algorithmic or analytical work
    #[serde(default = "default_algorithm_keywords")]
    pub algorithm_keywords: Vec<String>,
    /// Framework/technology terms; several at once implies integration work
    #[serde(default = "default_topic_keywords")]
    pub topic_keywords: Vec<String>,
    /// Score added per matched architecture keyword
    #[serde(default = "default_architecture_weight")]
    pub architecture_weight: u32,
    /// Score added per matched algorithm keyword
    #[serde(default = "default_algorithm_weight")]
    pub algorithm_weight: u32,
    /// Score added when at least `multi_topic_min` topic terms co-occur
    #[serde(default = "default_multi_topic_weight")]
    pub multi_topic_weight: u32,
    /// Distinct topic terms required to count as multi-topic
    #[serde(default = "default_multi_topic_min")]
    pub multi_topic_min: usize,
    /// Content length (chars) granting one length point
    #[serde(default = "default_length_step")]
    pub length_step: usize,
    /// Cap on length points
    #[serde(default = "default_length_cap")]
    pub length_cap: u32,
    /// Minimum score for low effort; below is minimal
    #[serde(default = "default_low_score")]
    pub low_score: u32,
    /// Minimum score for medium effort
    #[serde(default = "default_medium_score")]
    pub medium_score: u32,
    /// Minimum score for high effort
    #[serde(default = "default_high_score")]
    pub high_score: u32,
}

impl Default for EffortConfig {
    fn default() -> Self {
        Self {
            architecture_keywords: default_architecture_keywords(),
            algorithm_keywords: default_algorithm_keywords(),
            topic_keywords: default_topic_keywords(),
            architecture_weight: default_architecture_weight(),
            algorithm_weight: default_algorithm_weight(),
            multi_topic_weight: default_multi_topic_weight(),
            multi_topic_min: default_multi_topic_min(),
            length_step: default_length_step(),
            length_cap: default_length_cap(),
            low_score: default_low_score(),
            medium_score: default_medium_score(),
            high_score: default_high_score(),
        }
    }
}

fn default_architecture_keywords() -> Vec<String> {
    [
        "architecture",
        "architect",
        "design pattern",
        "microservice",
        "distributed",
        "scalability",
        "refactor",
        "migration",
        "system design",
        "trade-off",
        "tradeoff",
    ]
    .map(str::to_owned)
    .to_vec()
}

fn default_algorithm_keywords() -> Vec<String> {
    [
        "algorithm",
        "complexity",
        "optimize",
        "optimization",
        "big-o",
        "concurrency",
        "race condition",
        "deadlock",
        "proof",
        "invariant",
        "dynamic programming",
    ]
    .map(str::to_owned)
    .to_vec()
}

fn default_topic_keywords() -> Vec<String> {
    [
        "react", "vue", "angular", "django", "rails", "spring", "kubernetes", "docker", "postgres", "redis", "kafka",
        "graphql", "grpc", "terraform",
    ]
    .map(str::to_owned)
    .to_vec()
}

fn default_architecture_weight() -> u32 {
    3
}

fn default_algorithm_weight() -> u32 {
    2
}

fn default_multi_topic_weight() -> u32 {
    3
}

fn default_multi_topic_min() -> usize {
    2
}

fn default_length_step() -> usize {
    500
}

fn default_length_cap() -> u32 {
    4
}

fn default_low_score() -> u32 {
    2
}

fn default_medium_score() -> u32 {
    5
}

fn default_high_score() -> u32 {
    9
}
