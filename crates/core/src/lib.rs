pub mod clock;
pub mod config;
pub mod filter;
pub mod matcher;
pub mod media;
pub mod metrics;
pub mod orchestrator;
pub mod profile;
pub mod quality;
pub mod searcher;
pub mod store;
pub mod testing;

pub use clock::{Clock, SystemClock};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    SearcherConfig,
};
pub use filter::{CorrectnessFilter, FilterConfig, RejectionReason, WordRules};
pub use matcher::{CanonicalTitle, SceneTitleMatcher, TitleMatcher};
pub use media::{KnownRelease, MediaStatus, ReleaseStatus, WantedMedia};
pub use orchestrator::{
    DownloadError, DownloadOutcome, Downloader, OrchestratorConfig, OrchestratorError,
    ReleaseDateLookup, ReleaseDates, SearchOrchestrator, SearchReport, SearchState,
};
pub use profile::{Profile, ProfileEntry, ProfileError, QualityRank};
pub use quality::{
    GuessCache, GuessHints, QualityCatalog, QualityError, QualityGuess, QualityGuesser, QualityTier,
};
pub use searcher::{
    CandidateRelease, Protocol, ProviderError, ProviderQuery, ProviderSet, SearchMethod,
};
pub use store::{MediaStore, SqliteMediaStore, StoreError};
