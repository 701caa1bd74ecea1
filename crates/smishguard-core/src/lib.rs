pub mod config;
pub mod evidence;
pub mod normalize;
pub mod verdict;

pub use config::{ClientConfig, ConfigError};
pub use evidence::{AnalysisResult, EvidenceItem};
pub use normalize::normalize;
pub use verdict::{Verdict, View};
